//! Type descriptors.
//!
//! A [`Type`] is the canonical schema of a keel value. Descriptors are
//! immutable and cheap to clone: composite variants share their children
//! behind `Arc`, so every struct of a given shape can point at the same
//! descriptor.
//!
//! Self-referential struct types never hold a back-pointer. Inside a struct
//! type, [`Type::Cycle`]`(n)` stands for the struct `n` levels up from the
//! innermost enclosing struct (`Cycle(0)` is the innermost one itself).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use keel_hash::{ContentHasher, ObjectId};
use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};
use crate::field_name::is_valid_field_name;

/// The variant of a [`Type`], without parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Kind {
    Bool,
    Number,
    String,
    Blob,
    Type,
    List,
    Set,
    Ref,
    Map,
    Struct,
    Cycle,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "Bool",
            Self::Number => "Number",
            Self::String => "String",
            Self::Blob => "Blob",
            Self::Type => "Type",
            Self::List => "List",
            Self::Set => "Set",
            Self::Ref => "Ref",
            Self::Map => "Map",
            Self::Struct => "Struct",
            Self::Cycle => "Cycle",
        };
        f.write_str(name)
    }
}

/// A canonical type descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Bool,
    Number,
    String,
    Blob,
    /// The type of type descriptors themselves.
    Type,
    List(Arc<Type>),
    Set(Arc<Type>),
    Ref(Arc<Type>),
    Map(Arc<Type>, Arc<Type>),
    Struct(Arc<StructType>),
    /// Reference to an enclosing struct type, counted outward from the
    /// innermost enclosing struct.
    Cycle(u32),
}

/// Shape of a struct type: an optional name and fields sorted by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructType {
    name: String,
    fields: Vec<StructField>,
}

/// A single named field of a struct type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    pub ty: Type,
    /// Optional fields may be absent from values that satisfy this type.
    pub optional: bool,
}

impl StructField {
    /// A required field.
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
        }
    }

    /// A field that conforming values may omit.
    pub fn optional(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: true,
        }
    }
}

impl StructType {
    /// The struct name; empty for anonymous structs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in canonical (byte-lexicographic) order.
    pub fn fields(&self) -> &[StructField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a field by name, returning its position and descriptor.
    pub fn find(&self, name: &str) -> Option<(usize, &StructField)> {
        self.fields
            .binary_search_by(|f| f.name.as_str().cmp(name))
            .ok()
            .map(|i| (i, &self.fields[i]))
    }
}

/// Check that a struct name is either empty or a valid identifier.
pub(crate) fn verify_struct_name(name: &str) -> TypeResult<()> {
    if name.is_empty() || is_valid_field_name(name) {
        Ok(())
    } else {
        Err(TypeError::InvalidStructName(name.to_string()))
    }
}

/// Check field names and their strict ordering.
fn verify_fields(fields: &[StructField]) -> TypeResult<()> {
    for (i, field) in fields.iter().enumerate() {
        if !is_valid_field_name(&field.name) {
            return Err(TypeError::InvalidFieldName(field.name.clone()));
        }
        if i > 0 && fields[i - 1].name >= field.name {
            return Err(TypeError::FieldsOutOfOrder {
                previous: fields[i - 1].name.clone(),
                next: field.name.clone(),
            });
        }
    }
    Ok(())
}

impl Type {
    pub fn list(elem: Type) -> Self {
        Self::List(Arc::new(elem))
    }

    pub fn set(elem: Type) -> Self {
        Self::Set(Arc::new(elem))
    }

    pub fn reference(target: Type) -> Self {
        Self::Ref(Arc::new(target))
    }

    pub fn map(key: Type, value: Type) -> Self {
        Self::Map(Arc::new(key), Arc::new(value))
    }

    pub fn cycle(depth: u32) -> Self {
        Self::Cycle(depth)
    }

    /// Build a struct type, validating names and field order.
    pub fn try_structure(name: impl Into<String>, fields: Vec<StructField>) -> TypeResult<Self> {
        let name = name.into();
        verify_struct_name(&name)?;
        verify_fields(&fields)?;
        Ok(Self::Struct(Arc::new(StructType { name, fields })))
    }

    /// Build a struct type from fields that must already be sorted, unique
    /// and validly named.
    ///
    /// # Panics
    ///
    /// Panics if any of those conditions fails. An unordered field list can
    /// never be a canonical type, so this is a caller bug.
    pub fn structure(name: impl Into<String>, fields: Vec<StructField>) -> Self {
        Self::try_structure(name, fields).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Build a struct type of required fields. The map supplies the order.
    pub fn struct_from_fields(name: impl Into<String>, fields: BTreeMap<String, Type>) -> Self {
        let fields = fields
            .into_iter()
            .map(|(name, ty)| StructField::new(name, ty))
            .collect();
        Self::structure(name, fields)
    }

    /// The anonymous struct with no fields.
    pub fn empty_struct() -> Self {
        Self::Struct(Arc::new(StructType {
            name: String::new(),
            fields: Vec::new(),
        }))
    }

    pub fn kind(&self) -> Kind {
        match self {
            Self::Bool => Kind::Bool,
            Self::Number => Kind::Number,
            Self::String => Kind::String,
            Self::Blob => Kind::Blob,
            Self::Type => Kind::Type,
            Self::List(_) => Kind::List,
            Self::Set(_) => Kind::Set,
            Self::Ref(_) => Kind::Ref,
            Self::Map(..) => Kind::Map,
            Self::Struct(_) => Kind::Struct,
            Self::Cycle(_) => Kind::Cycle,
        }
    }

    pub fn as_struct(&self) -> Option<&Arc<StructType>> {
        match self {
            Self::Struct(st) => Some(st),
            _ => None,
        }
    }

    /// Whether every cycle reference resolves to a struct enclosing it
    /// within this descriptor.
    pub fn is_closed(&self) -> bool {
        self.closed_within(0)
    }

    fn closed_within(&self, enclosing: u32) -> bool {
        match self {
            Self::Bool | Self::Number | Self::String | Self::Blob | Self::Type => true,
            Self::List(elem) | Self::Set(elem) | Self::Ref(elem) => elem.closed_within(enclosing),
            Self::Map(key, value) => key.closed_within(enclosing) && value.closed_within(enclosing),
            Self::Struct(st) => st.fields.iter().all(|f| f.ty.closed_within(enclosing + 1)),
            Self::Cycle(depth) => *depth < enclosing,
        }
    }

    /// Content hash of the descriptor.
    pub fn hash(&self) -> ObjectId {
        ContentHasher::TYPE
            .hash_bincode(self)
            .expect("type descriptors always encode")
    }

    /// Human-readable schema text.
    ///
    /// ```
    /// use keel_types::{StructField, Type};
    ///
    /// let person = Type::structure(
    ///     "Person",
    ///     vec![
    ///         StructField::new("female", Type::Bool),
    ///         StructField::new("given", Type::String),
    ///     ],
    /// );
    /// assert_eq!(
    ///     person.describe(),
    ///     "struct Person {\n  female: Bool,\n  given: String,\n}"
    /// );
    /// ```
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.write_description(&mut out, 0);
        out
    }

    fn write_description(&self, out: &mut String, indent: usize) {
        let write_param = |out: &mut String, label: &str, params: &[&Type]| {
            out.push_str(label);
            out.push('<');
            for (i, param) in params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                param.write_description(out, indent);
            }
            out.push('>');
        };

        match self {
            Self::List(elem) => write_param(out, "List", &[elem.as_ref()]),
            Self::Set(elem) => write_param(out, "Set", &[elem.as_ref()]),
            Self::Ref(elem) => write_param(out, "Ref", &[elem.as_ref()]),
            Self::Map(key, value) => write_param(out, "Map", &[key.as_ref(), value.as_ref()]),
            Self::Cycle(depth) => out.push_str(&format!("Cycle<{depth}>")),
            Self::Struct(st) => {
                out.push_str("struct ");
                if !st.name.is_empty() {
                    out.push_str(&st.name);
                    out.push(' ');
                }
                if st.fields.is_empty() {
                    out.push_str("{}");
                    return;
                }
                out.push('{');
                for field in &st.fields {
                    out.push('\n');
                    out.push_str(&" ".repeat(indent + 2));
                    out.push_str(&field.name);
                    if field.optional {
                        out.push('?');
                    }
                    out.push_str(": ");
                    field.ty.write_description(out, indent + 2);
                    out.push(',');
                }
                out.push('\n');
                out.push_str(&" ".repeat(indent));
                out.push('}');
            }
            primitive => out.push_str(&primitive.kind().to_string()),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
