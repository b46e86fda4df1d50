//! Typed-value core for keel.
//!
//! Every record keel stores is an immutable, content-addressed value with a
//! canonical type. This crate defines that model:
//!
//! - [`Type`] / [`StructType`] / [`StructField`]: canonical type descriptors,
//!   including `Cycle` references for self-referential struct types
//! - [`Value`]: the value model (`Bool`, `Number`, `String`, [`Blob`],
//!   `Type`, [`List`], [`Set`], [`Map`], [`Ref`], [`Struct`])
//! - [`Struct`]: immutable record with alphabetically ordered fields and a
//!   lazily computed content hash
//! - [`StructDiff`] / [`send_diff`]: linear-time field diff between structs
//! - [`field_name`]: field-name validation, camel-casing and escaping
//!
//! # Design Rules
//!
//! 1. Struct fields are sorted byte-lexicographically and unique, always.
//! 2. Values never change after construction; updates return new values.
//! 3. Value equality is content-hash equality.
//! 4. Broken invariants (unordered fields, mismatched values) panic. They are
//!    caller bugs, not data errors.

pub mod diff;
pub mod error;
pub mod field_name;
pub mod structs;
pub mod subtype;
pub mod types;
pub mod value;

pub use diff::{send_diff, DiffCancel, DiffChangeType, StructDiff, ValueChanged};
pub use error::{TypeError, TypeResult};
pub use field_name::{camel_case_field_name, escape_struct_field, is_valid_field_name};
pub use keel_hash::ObjectId;
pub use structs::{Struct, StructData};
pub use subtype::{assert_subtype, is_value_subtype};
pub use types::{Kind, StructField, StructType, Type};
pub use value::{Blob, List, Map, Ref, Set, Value};
