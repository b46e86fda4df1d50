//! Structural subtyping between values and type descriptors.
//!
//! A value conforms to a type when:
//! - primitives have the same kind;
//! - every element of a list or set, and every key and value of a map,
//!   conforms to the declared parameter;
//! - a struct has the declared name (or the declared name is empty), has
//!   every required declared field with a conforming value, and any optional
//!   declared field it does have conforms. Extra fields are allowed;
//! - a ref's target type matches the declared target type structurally.
//!
//! `Cycle(n)` is resolved against the declared struct types currently being
//! checked, innermost last. Ref targets are compared type against type, so a
//! cycle anywhere inside a declared target (`Ref<List<Cycle<0>>>`) matches
//! the concrete struct it stands for.

use std::sync::Arc;

use crate::structs::Struct;
use crate::types::{StructType, Type};
use crate::value::Value;

/// Whether `value` conforms to `ty`.
pub fn is_value_subtype(ty: &Type, value: &Value) -> bool {
    SubtypeCheck::default().check(ty, value)
}

/// # Panics
///
/// Panics if `value` does not conform to `ty`.
pub fn assert_subtype(ty: &Type, value: &Value) {
    if !is_value_subtype(ty, value) {
        panic!(
            "Invalid type: {} is not a subtype of {}",
            value.ty().describe(),
            ty.describe()
        );
    }
}

/// Check a field value of a struct of type `owner`, so that cycles in the
/// field type resolve against `owner`.
pub(crate) fn assert_field_subtype(owner: &Arc<StructType>, ty: &Type, value: &Value) {
    let mut check = SubtypeCheck {
        parents: vec![Arc::clone(owner)],
    };
    if !check.check(ty, value) {
        panic!(
            "Invalid type: {} is not a subtype of {}",
            value.ty().describe(),
            ty.describe()
        );
    }
}

#[derive(Default)]
struct SubtypeCheck {
    parents: Vec<Arc<StructType>>,
}

impl SubtypeCheck {
    fn check(&mut self, ty: &Type, value: &Value) -> bool {
        // Value types are always closed, so an exact match needs no context.
        if !matches!(ty, Type::Cycle(_)) && value.ty() == *ty {
            return true;
        }

        match (ty, value) {
            (Type::Cycle(depth), _) => self.check_cycle(*depth, value),
            (Type::Bool, Value::Bool(_))
            | (Type::Number, Value::Number(_))
            | (Type::String, Value::String(_))
            | (Type::Blob, Value::Blob(_))
            | (Type::Type, Value::Type(_)) => true,
            (Type::List(elem), Value::List(list)) => list.iter().all(|item| self.check(elem, item)),
            (Type::Set(elem), Value::Set(set)) => set.iter().all(|item| self.check(elem, item)),
            (Type::Map(key, val), Value::Map(map)) => map
                .iter()
                .all(|(k, v)| self.check(key, k) && self.check(val, v)),
            (Type::Ref(target), Value::Ref(r)) => {
                TypeMatch::new(&self.parents).matches(target, r.target_type())
            }
            (Type::Struct(st), Value::Struct(s)) => self.check_struct(st, s),
            _ => false,
        }
    }

    fn check_cycle(&mut self, depth: u32, value: &Value) -> bool {
        let Some(idx) = self.parents.len().checked_sub(depth as usize + 1) else {
            return false;
        };
        let Value::Struct(s) = value else {
            return false;
        };
        // Checking the referenced struct happens at its own nesting level.
        let target = Arc::clone(&self.parents[idx]);
        let deeper = self.parents.split_off(idx);
        let ok = self.check_struct(&target, s);
        self.parents.extend(deeper);
        ok
    }

    fn check_struct(&mut self, st: &Arc<StructType>, s: &Struct) -> bool {
        if !st.name().is_empty() && st.name() != s.name() {
            return false;
        }
        self.parents.push(Arc::clone(st));
        let ok = st.fields().iter().all(|field| match s.maybe_get(&field.name) {
            Some(v) => self.check(&field.ty, v),
            None => field.optional,
        });
        self.parents.pop();
        ok
    }
}

/// Structural equality of a declared type and a concrete type, each with its
/// own stack of enclosing structs for resolving cycles.
struct TypeMatch {
    declared: Vec<Arc<StructType>>,
    actual: Vec<Arc<StructType>>,
    /// Struct pairs already being compared; meeting one again holds.
    assumed: Vec<(*const StructType, *const StructType)>,
}

impl TypeMatch {
    fn new(declared: &[Arc<StructType>]) -> Self {
        Self {
            declared: declared.to_vec(),
            actual: Vec::new(),
            assumed: Vec::new(),
        }
    }

    fn matches(&mut self, declared: &Type, actual: &Type) -> bool {
        match (declared, actual) {
            (Type::Cycle(depth), _) => {
                let Some(idx) = self.declared.len().checked_sub(*depth as usize + 1) else {
                    return false;
                };
                let target = Type::Struct(Arc::clone(&self.declared[idx]));
                let deeper = self.declared.split_off(idx);
                let ok = self.matches(&target, actual);
                self.declared.extend(deeper);
                ok
            }
            (_, Type::Cycle(depth)) => {
                let Some(idx) = self.actual.len().checked_sub(*depth as usize + 1) else {
                    return false;
                };
                let target = Type::Struct(Arc::clone(&self.actual[idx]));
                let deeper = self.actual.split_off(idx);
                let ok = self.matches(declared, &target);
                self.actual.extend(deeper);
                ok
            }
            (Type::Bool, Type::Bool)
            | (Type::Number, Type::Number)
            | (Type::String, Type::String)
            | (Type::Blob, Type::Blob)
            | (Type::Type, Type::Type) => true,
            (Type::List(d), Type::List(a))
            | (Type::Set(d), Type::Set(a))
            | (Type::Ref(d), Type::Ref(a)) => self.matches(d, a),
            (Type::Map(dk, dv), Type::Map(ak, av)) => self.matches(dk, ak) && self.matches(dv, av),
            (Type::Struct(d), Type::Struct(a)) => self.matches_struct(d, a),
            _ => false,
        }
    }

    fn matches_struct(&mut self, declared: &Arc<StructType>, actual: &Arc<StructType>) -> bool {
        let pair = (Arc::as_ptr(declared), Arc::as_ptr(actual));
        if self.assumed.contains(&pair) {
            return true;
        }
        if declared.name() != actual.name() || declared.len() != actual.len() {
            return false;
        }

        self.assumed.push(pair);
        self.declared.push(Arc::clone(declared));
        self.actual.push(Arc::clone(actual));
        let ok = declared.fields().iter().zip(actual.fields()).all(|(d, a)| {
            d.name == a.name && d.optional == a.optional && self.matches(&d.ty, &a.ty)
        });
        self.actual.pop();
        self.declared.pop();
        self.assumed.pop();
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StructField;
    use crate::value::{List, Ref};
    use keel_hash::ObjectId;

    fn point(x: f64, y: f64) -> Value {
        Struct::new("Point", [("x", Value::from(x)), ("y", Value::from(y))]).into()
    }

    #[test]
    fn primitives_match_by_kind() {
        assert!(is_value_subtype(&Type::Number, &1.into()));
        assert!(!is_value_subtype(&Type::Number, &"1".into()));
        assert!(is_value_subtype(&Type::Type, &Type::Bool.into()));
    }

    #[test]
    fn structs_allow_extra_fields() {
        let only_x = Type::structure("Point", vec![StructField::new("x", Type::Number)]);
        assert!(is_value_subtype(&only_x, &point(1.0, 2.0)));

        let anonymous = Type::structure("", vec![StructField::new("y", Type::Number)]);
        assert!(is_value_subtype(&anonymous, &point(1.0, 2.0)));

        let renamed = Type::structure("Vec2", vec![StructField::new("x", Type::Number)]);
        assert!(!is_value_subtype(&renamed, &point(1.0, 2.0)));
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let with_z = Type::structure(
            "Point",
            vec![
                StructField::new("x", Type::Number),
                StructField::new("y", Type::Number),
                StructField::optional("z", Type::Number),
            ],
        );
        assert!(is_value_subtype(&with_z, &point(0.0, 0.0)));

        let wrong_z = Struct::new(
            "Point",
            [("x", Value::from(0)), ("y", Value::from(0)), ("z", Value::from("deep"))],
        );
        assert!(!is_value_subtype(&with_z, &wrong_z.into()));

        let required_z = Type::structure("Point", vec![StructField::new("z", Type::Number)]);
        assert!(!is_value_subtype(&required_z, &point(0.0, 0.0)));
    }

    #[test]
    fn cycles_resolve_to_enclosing_struct() {
        let node = Type::structure(
            "Node",
            vec![
                StructField::new("children", Type::list(Type::cycle(0))),
                StructField::new("value", Type::Number),
            ],
        );
        let leaf = Struct::with_type(&node, vec![List::new(node.clone(), vec![]).into(), 1.into()]);
        let root = Struct::with_type(
            &node,
            vec![List::new(node.clone(), vec![leaf.into()]).into(), 0.into()],
        );
        assert!(is_value_subtype(&node, &root.into()));

        let stray = Struct::new("Node", [("children", Value::from(List::new(Type::Number, vec![])))]);
        assert!(!is_value_subtype(&node, &stray.into()));
    }

    #[test]
    fn unresolvable_cycle_never_matches() {
        assert!(!is_value_subtype(&Type::cycle(0), &point(0.0, 0.0)));
    }

    #[test]
    fn refs_compare_target_types() {
        let r: Value = Ref::to(&"x".into()).into();
        assert!(is_value_subtype(&Type::reference(Type::String), &r));
        assert!(!is_value_subtype(&Type::reference(Type::Number), &r));
    }

    fn linked_node() -> Type {
        Type::structure(
            "Node",
            vec![
                StructField::new("next", Type::reference(Type::list(Type::cycle(0)))),
                StructField::new("v", Type::Number),
            ],
        )
    }

    #[test]
    fn ref_targets_resolve_nested_cycles() {
        let node = linked_node();
        let next = Ref::new(ObjectId::null(), Type::list(node.clone()));
        let value = Struct::with_type(&node, vec![next.into(), 1.into()]);
        assert!(is_value_subtype(&node, &value.into()));
    }

    #[test]
    fn ref_targets_with_cycles_still_reject_mismatches() {
        let node = linked_node();
        for target in [
            Type::list(Type::Number),
            Type::set(node.clone()),
            Type::list(Type::structure("Other", vec![])),
        ] {
            let value = Struct::new(
                "Node",
                [
                    ("next", Value::from(Ref::new(ObjectId::null(), target))),
                    ("v", Value::from(1)),
                ],
            );
            assert!(!is_value_subtype(&node, &value.into()));
        }
    }

    #[test]
    fn ref_target_built_separately_still_matches() {
        let next = Ref::new(ObjectId::null(), Type::list(linked_node()));
        let value = Struct::new("Node", [("next", Value::from(next)), ("v", Value::from(2))]);
        assert!(is_value_subtype(&linked_node(), &value.into()));
    }
}
