//! [`Native`] implementations for std and keel types.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque};
use std::rc::Rc;
use std::sync::mpsc::{Receiver, Sender, SyncSender};
use std::sync::Arc;

use bytes::Bytes;
use keel_types::{Kind, Type};

use crate::shape::{Native, NativeType, Shape, StructShape};

macro_rules! impl_native {
    ($shape:expr => $($t:ty),+ $(,)?) => {
        $(
            impl Native for $t {
                fn shape() -> Shape {
                    $shape
                }
            }
        )+
    };
}

impl_native!(Shape::Number => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);
impl_native!(Shape::Bool => bool);
impl_native!(Shape::String => String, str, Box<str>, Arc<str>, Rc<str>, char);
impl_native!(Shape::Blob => Bytes, keel_types::Blob);
impl_native!(Shape::Type => Type);

impl Native for () {
    fn shape() -> Shape {
        StructShape::new("").into()
    }
}

macro_rules! impl_native_list {
    ($($t:ident),+) => {
        $(
            impl<T: Native> Native for $t<T> {
                fn shape() -> Shape {
                    Shape::List(NativeType::of::<T>())
                }
            }
        )+
    };
}

impl_native_list!(Vec, VecDeque, LinkedList);

impl<T: Native> Native for [T] {
    fn shape() -> Shape {
        Shape::List(NativeType::of::<T>())
    }
}

impl<T: Native, const N: usize> Native for [T; N] {
    fn shape() -> Shape {
        Shape::List(NativeType::of::<T>())
    }
}

impl<T: Native, S: 'static> Native for HashSet<T, S> {
    fn shape() -> Shape {
        Shape::Set(NativeType::of::<T>())
    }
}

impl<T: Native> Native for BTreeSet<T> {
    fn shape() -> Shape {
        Shape::Set(NativeType::of::<T>())
    }
}

impl<K: Native, V: Native, S: 'static> Native for HashMap<K, V, S> {
    fn shape() -> Shape {
        Shape::Map {
            key: NativeType::of::<K>(),
            value: NativeType::of::<V>(),
        }
    }
}

impl<K: Native, V: Native> Native for BTreeMap<K, V> {
    fn shape() -> Shape {
        Shape::Map {
            key: NativeType::of::<K>(),
            value: NativeType::of::<V>(),
        }
    }
}

macro_rules! impl_native_pointer {
    ($($t:ident),+) => {
        $(
            impl<T: Native> Native for $t<T> {
                fn shape() -> Shape {
                    Shape::Pointer(NativeType::of::<T>())
                }
            }
        )+
    };
}

// `Box<str>` and friends are strings above; sized targets point through.
impl_native_pointer!(Box, Arc, Rc, Option);

macro_rules! impl_native_unsupported {
    ($kind:literal => $($t:ident),+) => {
        $(
            impl<T: 'static> Native for $t<T> {
                fn shape() -> Shape {
                    Shape::Unsupported { kind: $kind }
                }
            }
        )+
    };
}

impl_native_unsupported!("chan" => Sender, SyncSender, Receiver);

macro_rules! impl_native_database {
    ($($t:ident => $kind:ident),+) => {
        $(
            impl Native for keel_types::$t {
                fn shape() -> Shape {
                    Shape::Database {
                        kind: Kind::$kind,
                        params: None,
                    }
                }
            }
        )+
    };
}

impl_native_database!(List => List, Set => Set, Map => Map, Ref => Ref, Struct => Struct);
