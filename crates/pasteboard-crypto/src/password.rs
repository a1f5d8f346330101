use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use anyhow::{Result, anyhow};

/// Hash a password with Argon2id and a fresh salt.
/// Returns the PHC-formatted string to store.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC string.
/// An unparseable stored value never verifies.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verify_roundtrip() {
        let stored = hash_password("correct horse").unwrap();
        assert_ne!(stored, "correct horse");
        assert!(stored.starts_with("$argon2"));
        assert!(verify_password("correct horse", &stored));
    }

    #[test]
    fn wrong_password_fails() {
        let stored = hash_password("correct horse").unwrap();
        assert!(!verify_password("battery staple", &stored));
        assert!(!verify_password("", &stored));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("repeat").unwrap();
        let b = hash_password("repeat").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("repeat", &a));
        assert!(verify_password("repeat", &b));
    }

    #[test]
    fn plaintext_stored_value_never_verifies() {
        assert!(!verify_password("hunter2", "hunter2"));
    }
}
