//! Content hashing for keel.
//!
//! Every keel value and type descriptor is identified by the BLAKE3 digest of
//! its canonical content. This crate is the only place that knows how digests
//! are produced; the rest of the workspace treats [`ObjectId`] as opaque.
//!
//! # Key Types
//!
//! - [`ObjectId`]: 32-byte content address
//! - [`ContentHasher`]: domain-separated BLAKE3 hasher

pub mod error;
pub mod hasher;
pub mod object;

pub use error::HashError;
pub use hasher::ContentHasher;
pub use object::ObjectId;
