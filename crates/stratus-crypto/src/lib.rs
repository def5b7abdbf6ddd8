//! Credential and token-secret primitives.
//!
//! Password storage uses Argon2id with per-password salts; ephemeral token
//! secrets are raw OS randomness, hex-encoded so they can travel in URLs.

pub mod password;
pub mod secret;
