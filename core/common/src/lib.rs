//! Common utilities and types shared across blobswitch crates.
//!
//! This crate holds the vocabulary every other crate speaks: the error
//! type, the closed set of provider identifiers, and the value types the
//! storage contract hands back to callers.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{BlobDescriptor, ProviderId, UploadReceipt};
