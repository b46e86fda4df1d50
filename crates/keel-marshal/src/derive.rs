//! Derivation of keel type descriptors from native shapes.
//!
//! Every derivation walks the shape tree depth first, keeping the struct
//! types it is currently inside on a stack. Meeting one of those again
//! yields `Cycle(n)`, where `n` counts outward from the innermost enclosing
//! struct.
//!
//! Closed descriptors go into the shared cache: every finished struct, at
//! any depth, and every top-level result, so `Vec<Person>` is as cheap to
//! ask for twice as `Person`. The cache is only consulted when a derivation
//! starts. Inner shapes are always walked under the current cycle stack, so
//! results never depend on what other threads derived first; the price is
//! that a new outer type re-walks the inner types it contains once.

use std::any::TypeId;

use keel_types::{Kind, StructField, Type};
use tracing::{debug, trace};

use crate::cache;
use crate::config::DeriveConfig;
use crate::error::{DeriveError, DeriveResult};
use crate::shape::{Native, NativeType, Shape, StructShape};
use crate::tags::{struct_name, FieldTags};

/// Derives type descriptors under a [`DeriveConfig`].
#[derive(Clone, Debug, Default)]
pub struct Deriver {
    config: DeriveConfig,
}

impl Deriver {
    pub fn new(config: DeriveConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DeriveConfig {
        &self.config
    }

    /// Derive the descriptor of `T`.
    pub fn derive<T: Native + ?Sized>(&self) -> DeriveResult<Type> {
        self.derive_native(NativeType::of::<T>())
    }

    pub fn derive_native(&self, native: NativeType) -> DeriveResult<Type> {
        if self.config.use_cache {
            if let Some(ty) = cache::lookup(native.id()) {
                trace!(type_name = native.name(), "type cache hit");
                return Ok(ty);
            }
        }
        let mut walk = Walk {
            config: &self.config,
            in_progress: Vec::new(),
            depth: 0,
        };
        let ty = walk.native(native)?;
        if self.config.use_cache && ty.is_closed() {
            cache::insert(native.id(), ty.clone());
        }
        Ok(ty)
    }
}

/// Derive the descriptor of the native type of `value` with the default
/// configuration.
pub fn derive_type<T: Native + ?Sized>(_value: &T) -> DeriveResult<Type> {
    derive_type_of::<T>()
}

pub fn derive_type_of<T: Native + ?Sized>() -> DeriveResult<Type> {
    Deriver::default().derive::<T>()
}

/// # Panics
///
/// Panics with the derivation error's message if derivation fails.
pub fn must_derive_type<T: Native + ?Sized>(value: &T) -> Type {
    derive_type(value).unwrap_or_else(|e| panic!("{e}"))
}

/// State of one derivation.
struct Walk<'a> {
    config: &'a DeriveConfig,
    /// Struct types currently being derived, innermost last.
    in_progress: Vec<TypeId>,
    depth: usize,
}

impl Walk<'_> {
    fn native(&mut self, native: NativeType) -> DeriveResult<Type> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            return Err(DeriveError::TooDeep {
                max_depth: self.config.max_depth,
            });
        }
        let result = self.shape(native, native.shape());
        self.depth -= 1;
        result
    }

    fn shape(&mut self, native: NativeType, shape: Shape) -> DeriveResult<Type> {
        match shape {
            Shape::Bool => Ok(Type::Bool),
            Shape::Number => Ok(Type::Number),
            Shape::String => Ok(Type::String),
            Shape::Blob => Ok(Type::Blob),
            Shape::Type => Ok(Type::Type),
            Shape::List(elem) => Ok(Type::list(self.native(elem)?)),
            Shape::Set(elem) => Ok(Type::set(self.native(elem)?)),
            Shape::Map { key, value } => Ok(Type::map(self.native(key)?, self.native(value)?)),
            Shape::Pointer(target) => self.native(target),
            Shape::Struct(shape) => self.structure(native, &shape),
            Shape::Database { kind, params } => database_type(native, kind, params),
            Shape::Custom(hook) => match hook()? {
                Some(ty) => Ok(ty),
                None => panic!(
                    "derive_type hook of {} returned neither a type nor an error",
                    native.name()
                ),
            },
            Shape::Unsupported { kind } => Err(DeriveError::Unsupported {
                kind: kind.to_string(),
                type_name: native.name().to_string(),
            }),
        }
    }

    fn structure(&mut self, native: NativeType, shape: &StructShape) -> DeriveResult<Type> {
        if let Some(pos) = self.in_progress.iter().rposition(|id| *id == native.id()) {
            let depth = (self.in_progress.len() - 1 - pos) as u32;
            trace!(type_name = native.name(), depth, "recursive struct type");
            return Ok(Type::cycle(depth));
        }

        self.in_progress.push(native.id());
        let result = self.struct_fields(native, shape);
        self.in_progress.pop();
        let ty = result?;

        if self.config.use_cache && ty.is_closed() {
            debug!(type_name = native.name(), "caching derived struct type");
            cache::insert(native.id(), ty.clone());
        }
        Ok(ty)
    }

    fn struct_fields(&mut self, native: NativeType, shape: &StructShape) -> DeriveResult<Type> {
        let mut fields = Vec::with_capacity(shape.fields().len());
        for field in shape.fields() {
            if FieldTags::skips(field.tag_str()) {
                continue;
            }
            if field.is_embedded() {
                return Err(DeriveError::EmbeddedStruct {
                    type_name: native.name().to_string(),
                });
            }
            if !field.is_exported() {
                return Err(DeriveError::NonExportedField {
                    type_name: native.name().to_string(),
                    field: field.name().to_string(),
                });
            }
            let tags = FieldTags::parse(field.name(), field.tag_str())?;
            if tags.original {
                continue;
            }
            let ty = self.field_type(field.native(), &tags)?;
            fields.push(StructField {
                name: tags.name,
                ty,
                optional: tags.omit_empty,
            });
        }

        fields.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(pair) = fields.windows(2).find(|pair| pair[0].name == pair[1].name) {
            return Err(DeriveError::DuplicateField {
                type_name: native.name().to_string(),
                field: pair[0].name.clone(),
            });
        }
        Ok(Type::try_structure(struct_name(shape.name()), fields)?)
    }

    /// A `set`-tagged map whose values are empty structs derives as the set
    /// of its keys. On any other type the option has no effect.
    fn field_type(&mut self, native: NativeType, tags: &FieldTags) -> DeriveResult<Type> {
        if tags.set {
            if let Shape::Map { key, value } = native.shape() {
                if value.shape().is_empty_struct() {
                    return Ok(Type::set(self.native(key)?));
                }
            }
        }
        self.native(native)
    }
}

fn database_type(native: NativeType, kind: Kind, params: Option<Vec<Type>>) -> DeriveResult<Type> {
    let ty = match (kind, params.as_deref()) {
        (Kind::List, Some([elem])) => Some(Type::list(elem.clone())),
        (Kind::Set, Some([elem])) => Some(Type::set(elem.clone())),
        (Kind::Ref, Some([target])) => Some(Type::reference(target.clone())),
        (Kind::Map, Some([key, value])) => Some(Type::map(key.clone(), value.clone())),
        (Kind::Struct, Some([ty @ Type::Struct(_)])) => Some(ty.clone()),
        _ => None,
    };
    ty.ok_or_else(|| DeriveError::RequiresTypeParameters {
        type_name: native.name().to_string(),
    })
}
