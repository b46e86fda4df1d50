//! Process-wide descriptor cache, keyed by native type identity.
//!
//! Only closed descriptors are stored: struct types once their derivation
//! has finished, and the result of every top-level request. Concurrent derivations of the same type may both
//! run; the first insert wins and later ones are dropped.

use std::any::TypeId;
use std::sync::LazyLock;

use dashmap::DashMap;
use keel_types::Type;

static CACHE: LazyLock<DashMap<TypeId, Type>> = LazyLock::new(DashMap::new);

pub(crate) fn lookup(id: TypeId) -> Option<Type> {
    CACHE.get(&id).map(|entry| entry.value().clone())
}

pub(crate) fn insert(id: TypeId, ty: Type) {
    CACHE.entry(id).or_insert(ty);
}

/// Number of descriptors currently cached.
pub fn cached_type_count() -> usize {
    CACHE.len()
}
