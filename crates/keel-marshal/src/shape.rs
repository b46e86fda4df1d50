//! Native shapes.
//!
//! A [`Shape`] is the reflective description of a native Rust type that the
//! deriver walks. Types opt in by implementing [`Native`]; std collections,
//! scalars and the keel value types are covered in `impls`. Structs describe
//! themselves with a [`StructShape`], usually through [`native_struct!`].

use std::any::{type_name, TypeId};
use std::fmt;

use keel_types::{Kind, Type};

use crate::error::DeriveResult;

/// A native type whose shape can be turned into a keel type descriptor.
pub trait Native: 'static {
    fn shape() -> Shape;
}

/// A native type supplying its own descriptor, bypassing derivation.
///
/// Returning `Err` aborts derivation with that error. Returning `Ok(None)`
/// is a broken hook and panics.
pub trait CustomType {
    fn derive_type() -> DeriveResult<Option<Type>>;
}

/// Handle to a [`Native`] type: its identity, its name and its shape.
#[derive(Clone, Copy)]
pub struct NativeType {
    id: TypeId,
    name: &'static str,
    shape: fn() -> Shape,
}

impl NativeType {
    pub fn of<T: Native + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            shape: T::shape,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn shape(&self) -> Shape {
        (self.shape)()
    }
}

impl PartialEq for NativeType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for NativeType {}

impl fmt::Debug for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// How a native type maps onto keel.
#[derive(Clone, Debug)]
pub enum Shape {
    Bool,
    Number,
    String,
    Blob,
    /// A type descriptor value.
    Type,
    /// Sequence of elements.
    List(NativeType),
    /// Unordered collection of distinct elements.
    Set(NativeType),
    Map {
        key: NativeType,
        value: NativeType,
    },
    Struct(StructShape),
    /// Transparent indirection (`Box<T>`, `Option<T>`); derives as the target.
    Pointer(NativeType),
    /// A keel collection, ref or struct value carrying its own runtime type.
    /// `params` holds the concrete parameters when they are statically known.
    Database {
        kind: Kind,
        params: Option<Vec<Type>>,
    },
    /// Descriptor supplied by a [`CustomType`] hook.
    Custom(fn() -> DeriveResult<Option<Type>>),
    /// A native kind with no keel counterpart, such as a channel.
    Unsupported { kind: &'static str },
}

impl Shape {
    pub fn custom<T: CustomType>() -> Self {
        Shape::Custom(T::derive_type)
    }

    /// True for a struct shape without fields, the value type of a set-tagged
    /// map.
    pub fn is_empty_struct(&self) -> bool {
        matches!(self, Shape::Struct(s) if s.fields.is_empty())
    }
}

/// Declared fields of a native struct, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct StructShape {
    name: String,
    fields: Vec<FieldShape>,
}

impl StructShape {
    /// `name` is the native type name; an empty name derives an anonymous
    /// struct.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldShape) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldShape] {
        &self.fields
    }
}

impl From<StructShape> for Shape {
    fn from(shape: StructShape) -> Self {
        Shape::Struct(shape)
    }
}

/// One declared field: its native name and type plus the optional tag
/// string (`"name,omitempty,set,original"` or `"-"`).
#[derive(Clone, Debug)]
pub struct FieldShape {
    name: String,
    native: NativeType,
    tag: Option<String>,
    exported: bool,
    embedded: bool,
}

impl FieldShape {
    pub fn new<T: Native + ?Sized>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            native: NativeType::of::<T>(),
            tag: None,
            exported: true,
            embedded: false,
        }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Mark the field as not visible outside its module.
    pub fn private(mut self) -> Self {
        self.exported = false;
        self
    }

    /// Mark the field as an embedded (flattened) struct.
    pub fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn native(&self) -> NativeType {
        self.native
    }

    pub fn tag_str(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn is_exported(&self) -> bool {
        self.exported
    }

    pub fn is_embedded(&self) -> bool {
        self.embedded
    }
}

/// Implement [`Native`] for a struct by listing its fields, each optionally
/// followed by `=> "tag"`.
///
/// Every listed field must exist on the struct with exactly the listed type,
/// otherwise the invocation does not compile.
///
/// ```
/// use keel_marshal::{derive_type_of, native_struct};
///
/// struct Person {
///     given: String,
///     female: bool,
/// }
///
/// native_struct!(Person {
///     given: String,
///     female: bool => "isFemale",
/// });
///
/// let ty = derive_type_of::<Person>().unwrap();
/// assert_eq!(ty.describe(), "struct Person {\n  given: String,\n  isFemale: Bool,\n}");
/// ```
///
/// ```compile_fail
/// use keel_marshal::native_struct;
///
/// struct Real {
///     actual: bool,
/// }
///
/// native_struct!(Real { imaginary: String });
/// ```
///
/// ```compile_fail
/// use keel_marshal::native_struct;
///
/// struct Real {
///     actual: bool,
/// }
///
/// native_struct!(Real { actual: String });
/// ```
#[macro_export]
macro_rules! native_struct {
    ($ty:ident { $($field:ident : $fty:ty $(=> $tag:literal)?),* $(,)? }) => {
        const _: () = {
            #[allow(dead_code)]
            fn check_fields(_value: &$ty) {
                $(let _: &$fty = &_value.$field;)*
            }
        };

        impl $crate::Native for $ty {
            fn shape() -> $crate::Shape {
                $crate::StructShape::new(stringify!($ty))
                    $(.field($crate::FieldShape::new::<$fty>(stringify!($field)) $(.tag($tag))?))*
                    .into()
            }
        }
    };
}
