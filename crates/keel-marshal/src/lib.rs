//! # keel-marshal
//!
//! Derives keel type descriptors from native Rust types.
//!
//! A native type describes its layout through [`Native`]; the [`Deriver`]
//! turns that [`Shape`] into a canonical [`Type`](keel_types::Type):
//! numbers become `Number`, sequences become `List`, maps become `Map`, and
//! structs become struct types with sorted fields. Recursive types derive to
//! descriptors with `Cycle` back-references, field tags rename, skip or
//! relax fields, and [`CustomType`] hooks can supply a descriptor directly.
//!
//! Closed struct descriptors are cached process-wide, so repeated requests
//! for the same type are cheap.

pub mod cache;
pub mod config;
pub mod derive;
pub mod error;
mod impls;
pub mod shape;
mod tags;

pub use cache::cached_type_count;
pub use config::DeriveConfig;
pub use derive::{derive_type, derive_type_of, must_derive_type, Deriver};
pub use error::{DeriveError, DeriveResult};
pub use shape::{CustomType, FieldShape, Native, NativeType, Shape, StructShape};
