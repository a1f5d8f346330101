/// Pasteboard crypto helpers
///
/// Password storage uses Argon2id with a per-password random salt; the
/// PHC string (algorithm, parameters, salt, hash) is what gets persisted.
/// Session cookies are signed with a 256-bit key from `keys`.

pub mod keys;
pub mod password;
