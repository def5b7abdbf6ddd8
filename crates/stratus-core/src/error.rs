use thiserror::Error;

/// Errors surfaced by the domain services.
///
/// Ordering convention: existence is always checked before ownership, so a
/// request against a missing resource gets `NotFound` even when the caller
/// would not have been allowed to touch it.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The named resource does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The resource exists but belongs to someone else.
    #[error("access denied")]
    Forbidden,

    /// The request collides with existing state (e.g. a registered email).
    #[error("{0}")]
    Conflict(String),

    /// An ephemeral token that is unknown, expired, or already used.
    /// Deliberately indistinguishable from the outside.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Bad credentials. Covers unknown email, wrong password, and inactive
    /// accounts alike so a login probe learns nothing.
    #[error("invalid credentials")]
    Unauthorized,

    /// A backing dependency (database, blob store) misbehaved.
    #[error(transparent)]
    Dependency(#[from] anyhow::Error),
}
