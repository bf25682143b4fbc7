//! Persisted provider configuration for blobswitch.
//!
//! The configuration document names the active provider and holds one
//! credential block per provider. It is read from disk on every access and
//! overlaid with environment values, so secrets can live outside the file
//! while the file decides which fields exist and which provider is active.

pub mod document;
pub mod env;
pub mod store;

pub use document::{credential_fields, ConfigDocument, CredentialBlock, CredentialField};
pub use env::{EnvSource, ProcessEnv};
pub use store::ConfigStore;
