//! Stratus domain services.
//!
//! Everything here is transport-agnostic: the HTTP layer maps requests onto
//! these services and `CoreError` onto status codes. External effects
//! (password hashing, blob storage, outbound mail) enter through the traits
//! in [`capabilities`], so every service can be exercised against in-memory
//! fakes.

pub mod access;
pub mod account;
pub mod capabilities;
pub mod error;
pub mod files;
pub mod hierarchy;
pub mod mail;
pub mod token;

#[cfg(test)]
pub(crate) mod testutil;

pub use account::AccountLifecycle;
pub use capabilities::{ArgonVerifier, BlobStore, BlobStream, CredentialVerifier, Notifier};
pub use error::CoreError;
pub use files::FileRegistry;
pub use hierarchy::HierarchyEngine;
pub use mail::MailMessage;
pub use token::TokenStore;
