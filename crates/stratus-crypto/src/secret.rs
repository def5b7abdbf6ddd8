use argon2::password_hash::rand_core::{OsRng, RngCore};

/// 256 bits of OS randomness, hex-encoded: 64 lowercase characters, safe to
/// embed in a URL path or query string without escaping.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
