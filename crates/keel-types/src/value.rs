//! The value model.
//!
//! [`Value`] is the closed set of things a struct field can hold. Every value
//! knows its [`Type`], its content hash, and how to walk its children and the
//! [`Ref`]s reachable from it. Equality between values is hash equality.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use keel_hash::{ContentHasher, ObjectId};

use crate::structs::Struct;
use crate::subtype::assert_subtype;
use crate::types::{Kind, Type};

/// A keel value.
#[derive(Clone, Debug)]
pub enum Value {
    Bool(bool),
    Number(f64),
    String(String),
    Blob(Blob),
    Type(Type),
    List(List),
    Set(Set),
    Map(Map),
    Ref(Ref),
    Struct(Struct),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Bool(_) => Kind::Bool,
            Self::Number(_) => Kind::Number,
            Self::String(_) => Kind::String,
            Self::Blob(_) => Kind::Blob,
            Self::Type(_) => Kind::Type,
            Self::List(_) => Kind::List,
            Self::Set(_) => Kind::Set,
            Self::Map(_) => Kind::Map,
            Self::Ref(_) => Kind::Ref,
            Self::Struct(_) => Kind::Struct,
        }
    }

    /// The exact type of this value.
    pub fn ty(&self) -> Type {
        match self {
            Self::Bool(_) => Type::Bool,
            Self::Number(_) => Type::Number,
            Self::String(_) => Type::String,
            Self::Blob(_) => Type::Blob,
            Self::Type(_) => Type::Type,
            Self::List(list) => Type::List(Arc::clone(&list.elem)),
            Self::Set(set) => Type::Set(Arc::clone(&set.elem)),
            Self::Map(map) => Type::Map(Arc::clone(&map.key), Arc::clone(&map.value)),
            Self::Ref(r) => Type::Ref(Arc::clone(&r.target_type)),
            Self::Struct(s) => s.ty(),
        }
    }

    /// Content hash. Structs memoize theirs; other values recompute.
    pub fn hash(&self) -> ObjectId {
        match self {
            Self::Struct(s) => s.hash(),
            other => ContentHasher::VALUE.hash(&other.canonical_bytes()),
        }
    }

    pub fn equals(&self, other: &Value) -> bool {
        self.hash() == other.hash()
    }

    /// Visit each direct child value.
    pub fn walk_values(&self, cb: &mut dyn FnMut(&Value)) {
        match self {
            Self::List(list) => list.items.iter().for_each(cb),
            Self::Set(set) => set.items.iter().for_each(cb),
            Self::Map(map) => {
                for (k, v) in map.entries.iter() {
                    cb(k);
                    cb(v);
                }
            }
            Self::Struct(s) => s.walk_values(cb),
            _ => {}
        }
    }

    /// Visit every ref reachable from this value without following refs.
    pub fn walk_refs(&self, cb: &mut dyn FnMut(&Ref)) {
        match self {
            Self::Ref(r) => cb(r),
            Self::Struct(s) => s.walk_refs(cb),
            _ => self.walk_values(&mut |child| child.walk_refs(&mut *cb)),
        }
    }

    /// Bytes fed to the value hasher. Children contribute their hashes.
    fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = vec![self.kind() as u8];
        match self {
            Self::Bool(b) => buf.push(u8::from(*b)),
            Self::Number(n) => buf.extend_from_slice(&n.to_le_bytes()),
            Self::String(s) => buf.extend_from_slice(s.as_bytes()),
            Self::Blob(blob) => buf.extend_from_slice(&blob.0),
            Self::Type(t) => buf.extend_from_slice(t.hash().as_bytes()),
            Self::Ref(r) => {
                buf.extend_from_slice(r.target_type.hash().as_bytes());
                buf.extend_from_slice(r.target.as_bytes());
            }
            Self::List(_) | Self::Set(_) | Self::Map(_) => {
                buf.extend_from_slice(self.ty().hash().as_bytes());
                self.walk_values(&mut |child| buf.extend_from_slice(child.hash().as_bytes()));
            }
            Self::Struct(s) => buf.extend_from_slice(s.hash().as_bytes()),
        }
        buf
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for Value {}

/// Immutable binary data.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Blob(Bytes);

impl Blob {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self(data.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An ordered sequence of values of one declared element type.
#[derive(Clone, Debug)]
pub struct List {
    elem: Arc<Type>,
    items: Arc<[Value]>,
}

impl List {
    /// # Panics
    ///
    /// Panics if an item does not conform to `elem`.
    pub fn new(elem: Type, items: Vec<Value>) -> Self {
        for item in &items {
            assert_subtype(&elem, item);
        }
        Self {
            elem: Arc::new(elem),
            items: items.into(),
        }
    }

    pub fn elem_type(&self) -> &Type {
        &self.elem
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.items.iter()
    }
}

/// A set of distinct values, kept in hash order.
#[derive(Clone, Debug)]
pub struct Set {
    elem: Arc<Type>,
    items: Arc<[Value]>,
}

impl Set {
    /// # Panics
    ///
    /// Panics if an item does not conform to `elem`.
    pub fn new(elem: Type, items: Vec<Value>) -> Self {
        let mut by_hash = BTreeMap::new();
        for item in items {
            assert_subtype(&elem, &item);
            by_hash.insert(item.hash(), item);
        }
        Self {
            elem: Arc::new(elem),
            items: by_hash.into_values().collect(),
        }
    }

    pub fn elem_type(&self) -> &Type {
        &self.elem
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, value: &Value) -> bool {
        let h = value.hash();
        self.items.binary_search_by(|item| item.hash().cmp(&h)).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.items.iter()
    }
}

/// A map from keys to values, kept in key-hash order. Later entries for
/// the same key replace earlier ones.
#[derive(Clone, Debug)]
pub struct Map {
    key: Arc<Type>,
    value: Arc<Type>,
    entries: Arc<[(Value, Value)]>,
}

impl Map {
    /// # Panics
    ///
    /// Panics if a key or value does not conform to its declared type.
    pub fn new(key: Type, value: Type, entries: Vec<(Value, Value)>) -> Self {
        let mut by_hash = BTreeMap::new();
        for (k, v) in entries {
            assert_subtype(&key, &k);
            assert_subtype(&value, &v);
            by_hash.insert(k.hash(), (k, v));
        }
        Self {
            key: Arc::new(key),
            value: Arc::new(value),
            entries: by_hash.into_values().collect(),
        }
    }

    pub fn key_type(&self) -> &Type {
        &self.key
    }

    pub fn value_type(&self) -> &Type {
        &self.value
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        let h = key.hash();
        self.entries
            .binary_search_by(|(k, _)| k.hash().cmp(&h))
            .ok()
            .map(|i| &self.entries[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

/// A typed reference to a value stored elsewhere, by content hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ref {
    target: ObjectId,
    target_type: Arc<Type>,
}

impl Ref {
    pub fn new(target: ObjectId, target_type: Type) -> Self {
        Self {
            target,
            target_type: Arc::new(target_type),
        }
    }

    /// Reference `value` by its hash and type.
    pub fn to(value: &Value) -> Self {
        Self::new(value.hash(), value.ty())
    }

    pub fn target(&self) -> ObjectId {
        self.target
    }

    pub fn target_type(&self) -> &Type {
        &self.target_type
    }
}

macro_rules! number_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Self::Number(n as f64)
                }
            }
        )*
    };
}

number_from!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Blob> for Value {
    fn from(blob: Blob) -> Self {
        Self::Blob(blob)
    }
}

impl From<Type> for Value {
    fn from(t: Type) -> Self {
        Self::Type(t)
    }
}

impl From<List> for Value {
    fn from(list: List) -> Self {
        Self::List(list)
    }
}

impl From<Set> for Value {
    fn from(set: Set) -> Self {
        Self::Set(set)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Self::Map(map)
    }
}

impl From<Ref> for Value {
    fn from(r: Ref) -> Self {
        Self::Ref(r)
    }
}

impl From<Struct> for Value {
    fn from(s: Struct) -> Self {
        Self::Struct(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_types() {
        assert_eq!(Value::from(true).ty(), Type::Bool);
        assert_eq!(Value::from(3u8).ty(), Type::Number);
        assert_eq!(Value::from("hi").ty(), Type::String);
        assert_eq!(Value::from(Blob::new(vec![1, 2])).ty(), Type::Blob);
        assert_eq!(Value::from(Type::Number).ty(), Type::Type);
    }

    #[test]
    fn hash_separates_kinds() {
        assert_ne!(Value::from(1).hash(), Value::from(true).hash());
        assert_ne!(Value::from("1").hash(), Value::from(Blob::new(&b"1"[..])).hash());
        assert_eq!(Value::from(2.0).hash(), Value::from(2u64).hash());
    }

    #[test]
    fn list_hash_depends_on_order_and_type() {
        let a = List::new(Type::Number, vec![1.into(), 2.into()]);
        let b = List::new(Type::Number, vec![2.into(), 1.into()]);
        assert_ne!(Value::from(a.clone()), Value::from(b));
        assert_eq!(Value::from(a.clone()), Value::from(a));

        let empty_numbers = List::new(Type::Number, vec![]);
        let empty_strings = List::new(Type::String, vec![]);
        assert_ne!(Value::from(empty_numbers), Value::from(empty_strings));
    }

    #[test]
    fn set_dedups_and_ignores_order() {
        let a = Set::new(Type::String, vec!["x".into(), "y".into(), "x".into()]);
        let b = Set::new(Type::String, vec!["y".into(), "x".into()]);
        assert_eq!(a.len(), 2);
        assert!(a.contains(&"x".into()));
        assert!(!a.contains(&"z".into()));
        assert_eq!(Value::from(a), Value::from(b));
    }

    #[test]
    fn map_last_write_wins() {
        let map = Map::new(
            Type::String,
            Type::Number,
            vec![("a".into(), 1.into()), ("b".into(), 2.into()), ("a".into(), 3.into())],
        );
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&"a".into()), Some(&Value::from(3)));
        assert_eq!(map.get(&"c".into()), None);
    }

    #[test]
    #[should_panic(expected = "is not a subtype of")]
    fn list_rejects_wrong_items() {
        List::new(Type::Number, vec!["nope".into()]);
    }

    #[test]
    fn walk_refs_finds_nested_refs() {
        let target = Value::from("target");
        let r = Ref::to(&target);
        let list = List::new(Type::reference(Type::String), vec![r.clone().into()]);
        let list_type = Type::list(Type::reference(Type::String));
        let outer = Map::new(Type::String, list_type, vec![("k".into(), list.into())]);

        let mut seen = Vec::new();
        Value::from(outer).walk_refs(&mut |r| seen.push(r.target()));
        assert_eq!(seen, vec![target.hash()]);
        assert_eq!(r.target_type(), &Type::String);
    }

    #[test]
    fn walk_values_is_shallow() {
        let inner = List::new(Type::Number, vec![1.into(), 2.into()]);
        let outer = List::new(Type::list(Type::Number), vec![inner.into()]);
        let mut count = 0;
        Value::from(outer).walk_values(&mut |_| count += 1);
        assert_eq!(count, 1);
    }
}
