//! Cloudinary media-asset backend.
//!
//! Assets are addressed by public ID rather than by key:
//! - Uploads are signed with the account's API secret
//! - Listing goes through the admin API and is capped per call
//! - Downloads fetch the public delivery URL; URLs never leave this module

pub mod auth;
pub mod client;
pub mod provider;

pub use auth::Credentials;
pub use client::MediaClient;
pub use provider::{create_cloudinary_client, CloudinaryClient, CloudinaryConfig, LIST_MAX_RESULTS};
