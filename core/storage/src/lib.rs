//! Storage provider abstraction for blobswitch.
//!
//! This crate provides one client contract over heterogeneous storage
//! backends (S3-style object storage, Cloudinary media assets) and a
//! provider registry that builds the client for whichever provider the
//! configuration marks as active.
//!
//! # Design Principles
//! - Provider isolation: callers only ever see the `StorageClient` contract
//! - Fresh resolution: configuration is reloaded and a client rebuilt per operation
//! - No I/O at construction: network traffic happens inside contract methods only
//! - Unified error semantics: consistent error kinds across providers

pub mod cloudinary;
pub mod provider;
pub mod registry;
pub mod s3;
pub mod service;

pub use cloudinary::CloudinaryClient;
pub use provider::{bytes_stream, collect_stream, reader_stream, ByteStream, StorageClient};
pub use registry::{create_default_registry, ProviderFactory, ProviderRegistry};
pub use s3::S3Client;
pub use service::BlobService;
