//! Immutable, content-addressed struct values.
//!
//! A [`Struct`] pairs a shared [`StructType`] with one value per field, in
//! the type's canonical field order. "Mutating" operations return a new
//! struct and leave the receiver untouched.
//!
//! # Invariants
//!
//! - `values.len() == ty.fields().len()` and `values[i]` conforms to
//!   `ty.fields()[i].ty`.
//! - Struct values never carry optional fields; optionality is a property
//!   of types only.
//! - Two structs are equal exactly when their content hashes are equal.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use keel_hash::{ContentHasher, ObjectId};
use tracing::debug;

use crate::subtype::assert_field_subtype;
use crate::types::{verify_struct_name, StructField, StructType, Type};
use crate::value::{Ref, Value};

/// Field data for [`Struct::new`], keyed (and therefore sorted) by name.
pub type StructData = BTreeMap<String, Value>;

/// An immutable struct value.
#[derive(Clone, Debug)]
pub struct Struct {
    values: Arc<[Value]>,
    ty: Arc<StructType>,
    hash: OnceLock<ObjectId>,
}

impl Struct {
    /// Build a struct from unordered field data. Fields are sorted by name
    /// and the struct type is derived from the values' own types.
    ///
    /// # Panics
    ///
    /// Panics if `name` or any field name is not a valid identifier.
    pub fn new<I, K>(name: impl Into<String>, data: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let name = name.into();
        if let Err(e) = verify_struct_name(&name) {
            panic!("{e}");
        }

        let data: StructData = data.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let mut fields = Vec::with_capacity(data.len());
        let mut values = Vec::with_capacity(data.len());
        for (field_name, value) in data {
            fields.push(StructField::new(field_name, value.ty()));
            values.push(value);
        }

        let Type::Struct(ty) = Type::structure(name, fields) else {
            unreachable!("Type::structure always builds a struct type");
        };
        Self::from_parts(ty, values.into())
    }

    /// Build a struct from a struct type and values already in the type's
    /// field order.
    ///
    /// # Panics
    ///
    /// Panics if `ty` is not a struct type, the value count differs from the
    /// field count, a field is optional, or a value does not conform to its
    /// field type.
    pub fn with_type(ty: &Type, values: Vec<Value>) -> Self {
        let Type::Struct(st) = ty else {
            panic!("Struct::with_type requires a struct type, got {}", ty.kind());
        };
        assert_eq!(
            values.len(),
            st.len(),
            "struct {:?} has {} fields but {} values were given",
            st.name(),
            st.len(),
            values.len()
        );
        for (field, value) in st.fields().iter().zip(&values) {
            if field.optional {
                panic!("Struct values cannot have optional fields (only struct types can)");
            }
            assert_field_subtype(st, &field.ty, value);
        }
        Self::from_parts(Arc::clone(st), values.into())
    }

    /// The empty anonymous struct.
    pub fn empty() -> Self {
        Self::new("", std::iter::empty::<(String, Value)>())
    }

    fn from_parts(ty: Arc<StructType>, values: Arc<[Value]>) -> Self {
        Self {
            values,
            ty,
            hash: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.ty.name()
    }

    /// The struct's type descriptor.
    pub fn ty(&self) -> Type {
        Type::Struct(Arc::clone(&self.ty))
    }

    pub fn struct_type(&self) -> &Arc<StructType> {
        &self.ty
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in canonical field order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// `(name, value)` pairs in canonical field order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.ty
            .fields()
            .iter()
            .map(|f| f.name.as_str())
            .zip(self.values.iter())
    }

    /// The value of field `name`, if the struct has one.
    pub fn maybe_get(&self, name: &str) -> Option<&Value> {
        self.ty.find(name).map(|(i, _)| &self.values[i])
    }

    /// # Panics
    ///
    /// Panics if the struct has no field `name`. Use [`maybe_get`] to
    /// test for presence.
    ///
    /// [`maybe_get`]: Struct::maybe_get
    pub fn get(&self, name: &str) -> &Value {
        self.maybe_get(name)
            .unwrap_or_else(|| panic!("Struct has no field {name:?}"))
    }

    /// Return a struct with field `name` set to `value`.
    ///
    /// Replacing a field with a value of the same type keeps the struct
    /// type. Adding a field or changing a field's type builds a new type.
    pub fn set(&self, name: &str, value: Value) -> Self {
        match self.ty.find(name) {
            Some((i, field)) if field.ty == value.ty() => {
                let mut values = self.values.to_vec();
                values[i] = value;
                Self::from_parts(Arc::clone(&self.ty), values.into())
            }
            _ => {
                debug!(name = self.name(), field = name, "rebuilding struct type for set");
                let mut data: StructData = self
                    .fields()
                    .map(|(n, v)| (n.to_string(), v.clone()))
                    .collect();
                data.insert(name.to_string(), value);
                Self::new(self.name(), data)
            }
        }
    }

    /// Return a struct without field `name`. Missing fields are a no-op.
    pub fn delete(&self, name: &str) -> Self {
        let Some((idx, _)) = self.ty.find(name) else {
            return self.clone();
        };

        let mut fields = Vec::with_capacity(self.len() - 1);
        let mut values = Vec::with_capacity(self.len() - 1);
        for (i, (field, value)) in self.ty.fields().iter().zip(self.values.iter()).enumerate() {
            if i != idx {
                fields.push(StructField::new(field.name.clone(), field.ty.clone()));
                values.push(value.clone());
            }
        }
        Self::with_type(&Type::structure(self.name(), fields), values)
    }

    /// Content hash, computed on first use and memoized.
    pub fn hash(&self) -> ObjectId {
        *self.hash.get_or_init(|| {
            let type_hash = self.ty().hash();
            let value_hashes: Vec<ObjectId> = self.values.iter().map(Value::hash).collect();
            ContentHasher::STRUCT.hash_parts(std::iter::once(type_hash).chain(value_hashes))
        })
    }

    pub fn equals(&self, other: &Struct) -> bool {
        self.hash() == other.hash()
    }

    /// Visit each field value.
    pub fn walk_values(&self, cb: &mut dyn FnMut(&Value)) {
        self.values.iter().for_each(cb);
    }

    /// Visit every ref reachable from the field values.
    pub fn walk_refs(&self, cb: &mut dyn FnMut(&Ref)) {
        for value in self.values.iter() {
            value.walk_refs(&mut *cb);
        }
    }
}

impl PartialEq for Struct {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for Struct {}

impl Default for Struct {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::List;
    use proptest::prelude::*;

    fn person() -> Struct {
        Struct::new(
            "Person",
            [("given", Value::from("Ada")), ("female", Value::from(true))],
        )
    }

    #[test]
    fn new_sorts_fields() {
        let p = person();
        let names: Vec<&str> = p.fields().map(|(n, _)| n).collect();
        assert_eq!(names, ["female", "given"]);
        assert_eq!(
            p.ty().describe(),
            "struct Person {\n  female: Bool,\n  given: String,\n}"
        );
        assert_eq!(p.get("given"), &Value::from("Ada"));
        assert_eq!(p.name(), "Person");
    }

    #[test]
    fn hash_is_memoized_and_deterministic() {
        let p = person();
        let h = p.hash();
        assert_eq!(p.hash(), h);
        assert_eq!(person().hash(), h);
        assert!(p.equals(&p));
        assert_ne!(Struct::empty().hash(), h);
    }

    #[test]
    fn name_is_part_of_identity() {
        let a = Struct::new("A", [("x", Value::from(1))]);
        let b = Struct::new("B", [("x", Value::from(1))]);
        assert_ne!(a, b);
    }

    #[test]
    fn maybe_get_reports_absence() {
        assert!(person().maybe_get("surname").is_none());
        assert!(person().maybe_get("female").is_some());
    }

    #[test]
    #[should_panic(expected = "Struct has no field \"surname\"")]
    fn get_panics_on_missing_field() {
        person().get("surname");
    }

    #[test]
    #[should_panic(expected = "Invalid struct field name: 1a")]
    fn new_rejects_bad_field_names() {
        Struct::new("S", [("1a", Value::from(1))]);
    }

    #[test]
    #[should_panic(expected = "Invalid struct name")]
    fn new_rejects_bad_struct_names() {
        Struct::new("bad name", [("a", Value::from(1))]);
    }

    #[test]
    fn set_same_type_keeps_descriptor() {
        let p = person();
        let q = p.set("given", "Grace".into());
        assert!(Arc::ptr_eq(p.struct_type(), q.struct_type()));
        assert_eq!(q.get("given"), &Value::from("Grace"));
        assert_eq!(p.get("given"), &Value::from("Ada"));
        assert_ne!(p, q);
    }

    #[test]
    fn set_new_field_or_type_rebuilds_descriptor() {
        let p = person();
        let aged = p.set("age", 36.into());
        assert_eq!(aged.len(), 3);
        assert_eq!(aged.get("age"), &Value::from(36));
        assert_eq!(aged.name(), "Person");

        let retyped = p.set("female", "yes".into());
        assert_eq!(retyped.struct_type().find("female").unwrap().1.ty, Type::String);
        assert_eq!(p.struct_type().find("female").unwrap().1.ty, Type::Bool);
    }

    #[test]
    fn delete_missing_field_is_noop() {
        let p = person();
        assert_eq!(p.delete("surname"), p);
    }

    #[test]
    fn delete_removes_field_and_type_entry() {
        let p = person().delete("female");
        assert_eq!(p.len(), 1);
        assert!(p.maybe_get("female").is_none());
        assert_eq!(p, Struct::new("Person", [("given", Value::from("Ada"))]));
    }

    #[test]
    fn with_type_roundtrip() {
        let p = person();
        let rebuilt = Struct::with_type(&p.ty(), p.values().to_vec());
        assert_eq!(rebuilt, p);
    }

    #[test]
    #[should_panic(expected = "cannot have optional fields")]
    fn with_type_rejects_optional_fields() {
        let ty = Type::structure("S", vec![StructField::optional("a", Type::Number)]);
        Struct::with_type(&ty, vec![1.into()]);
    }

    #[test]
    #[should_panic(expected = "is not a subtype of")]
    fn with_type_rejects_mismatched_values() {
        let ty = Type::structure("S", vec![StructField::new("a", Type::Number)]);
        Struct::with_type(&ty, vec!["one".into()]);
    }

    #[test]
    #[should_panic(expected = "fields but")]
    fn with_type_rejects_wrong_arity() {
        let ty = Type::structure("S", vec![StructField::new("a", Type::Number)]);
        Struct::with_type(&ty, vec![]);
    }

    #[test]
    #[should_panic(expected = "requires a struct type")]
    fn with_type_rejects_non_struct_types() {
        Struct::with_type(&Type::Number, vec![]);
    }

    #[test]
    fn walks_children_and_refs() {
        let target = Value::from("elsewhere");
        let s = Struct::new(
            "Holder",
            [
                ("direct", Value::from(Ref::to(&target))),
                ("nested", Value::from(List::new(Type::reference(Type::String), vec![Ref::to(&target).into()]))),
                ("plain", Value::from(1)),
            ],
        );

        let mut children = 0;
        s.walk_values(&mut |_| children += 1);
        assert_eq!(children, 3);

        let mut refs = Vec::new();
        s.walk_refs(&mut |r| refs.push(r.target()));
        assert_eq!(refs, vec![target.hash(), target.hash()]);
    }

    #[test]
    fn concurrent_hash_readers_agree() {
        let p = person();
        let expected = person().hash();
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| p.hash())).collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    fn field_map() -> impl Strategy<Value = BTreeMap<String, i64>> {
        prop::collection::btree_map("[a-z][a-z0-9_]{0,6}", any::<i64>(), 0..8)
    }

    proptest! {
        #[test]
        fn get_returns_constructed_values(fields in field_map()) {
            let s = Struct::new("S", fields.iter().map(|(k, v)| (k.clone(), Value::from(*v))));
            for (k, v) in &fields {
                prop_assert_eq!(s.get(k), &Value::from(*v));
            }
            let names: Vec<&str> = s.fields().map(|(n, _)| n).collect();
            let mut sorted = names.clone();
            sorted.sort_unstable();
            prop_assert_eq!(names, sorted);
        }

        #[test]
        fn set_then_get(fields in field_map(), key in "[a-z]{1,4}", value in any::<i64>()) {
            let s = Struct::new("S", fields.iter().map(|(k, v)| (k.clone(), Value::from(*v))));
            let updated = s.set(&key, value.into());
            prop_assert_eq!(updated.get(&key), &Value::from(value));
        }

        #[test]
        fn delete_then_absent(fields in field_map()) {
            let s = Struct::new("S", fields.iter().map(|(k, v)| (k.clone(), Value::from(*v))));
            for k in fields.keys() {
                let d = s.delete(k);
                prop_assert!(d.maybe_get(k).is_none());
                prop_assert_eq!(d.len(), s.len() - 1);
            }
        }
    }
}
