use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Payload of a presigned download handle. Carries nothing but the blob key
/// and the deadline; ownership was already checked when the handle was
/// minted.
#[derive(Debug, Serialize, Deserialize)]
struct HandleClaims {
    key: String,
    exp: usize,
}

/// Signs a download handle for `key`, valid for `ttl`.
pub fn sign(secret: &str, key: &str, ttl: Duration) -> Result<String> {
    let claims = HandleClaims {
        key: key.to_string(),
        exp: (Utc::now() + ttl).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("signing download handle")
}

/// Verifies a handle and returns the blob key it grants. Expired and
/// tampered handles fail verification; the caller cannot tell which.
pub fn verify(secret: &str, handle: &str) -> Result<String> {
    // No leeway: the deadline in the handle is the deadline, full stop.
    let mut validation = Validation::default();
    validation.leeway = 0;

    let data = decode::<HandleClaims>(
        handle,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .context("verifying download handle")?;
    Ok(data.claims.key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "presign-test-secret";

    #[test]
    fn handle_round_trips_the_key() {
        let handle = sign(SECRET, "blob-key-1", Duration::hours(1)).unwrap();
        assert_eq!(verify(SECRET, &handle).unwrap(), "blob-key-1");
    }

    #[test]
    fn expired_handles_are_refused_without_grace() {
        // Seconds past the deadline, well inside the default JWT leeway.
        let handle = sign(SECRET, "blob-key-2", Duration::seconds(-5)).unwrap();
        assert!(verify(SECRET, &handle).is_err());
    }

    #[test]
    fn handles_signed_with_another_secret_are_refused() {
        let handle = sign("some-other-secret", "blob-key-3", Duration::hours(1)).unwrap();
        assert!(verify(SECRET, &handle).is_err());
    }

    #[test]
    fn garbage_is_refused() {
        assert!(verify(SECRET, "not-a-jwt").is_err());
    }
}
