use anyhow::Result;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use rand::RngCore;

/// Generate a random 256-bit key for signing session cookies.
/// Used when no key is configured, so sessions do not survive a restart.
pub fn generate_secret_key() -> [u8; 32] {
    let mut key = [0u8; 32];
    rand::rng().fill_bytes(&mut key);
    key
}

/// Encode a key to base64 for configuration files.
pub fn key_to_base64(key: &[u8; 32]) -> String {
    BASE64.encode(key)
}

/// Decode a base64 key.
pub fn key_from_base64(encoded: &str) -> Result<[u8; 32]> {
    let bytes = BASE64.decode(encoded.trim())?;
    let key: [u8; 32] = bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("Invalid key length"))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_roundtrip() {
        let key = generate_secret_key();
        let decoded = key_from_base64(&key_to_base64(&key)).unwrap();
        assert_eq!(decoded, key);
    }

    #[test]
    fn generated_keys_differ() {
        assert_ne!(generate_secret_key(), generate_secret_key());
    }

    #[test]
    fn short_key_rejected() {
        let encoded = BASE64.encode([1u8; 16]);
        assert!(key_from_base64(&encoded).is_err());
        assert!(key_from_base64("not base64!").is_err());
    }
}
