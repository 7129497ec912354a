use core::any::Any;
use core::hash::Hash;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use crate::BindError;
use crate::info::{Bind, DynValue, MapInfo, OptionalInfo, SequenceInfo, SequenceKind, Type, TypeInfo};

// -----------------------------------------------------------------------------
// Shared helpers

fn iter_items<C, T>(value: &dyn Any) -> Option<Vec<&dyn Any>>
where
    C: Any,
    T: Bind,
    for<'a> &'a C: IntoIterator<Item = &'a T>,
{
    value
        .downcast_ref::<C>()
        .map(|c| c.into_iter().map(|item| item as &dyn Any).collect())
}

fn take_items<T: Bind>(items: Vec<DynValue>) -> Result<Vec<T>, BindError> {
    items
        .into_iter()
        .map(|item| {
            item.downcast::<T>()
                .map(|v| *v)
                .map_err(|_| BindError::mismatch(&Type::of::<T>()))
        })
        .collect()
}

fn build_from<C, T>(items: Vec<DynValue>) -> Result<DynValue, BindError>
where
    C: FromIterator<T> + Any,
    T: Bind,
{
    let items = take_items::<T>(items)?;
    Ok(Box::new(items.into_iter().collect::<C>()))
}

fn sequence<C, T>(kind: SequenceKind) -> TypeInfo
where
    C: FromIterator<T> + Any,
    T: Bind,
    for<'a> &'a C: IntoIterator<Item = &'a T>,
{
    TypeInfo::Sequence(SequenceInfo::new::<C, T>(
        kind,
        iter_items::<C, T>,
        build_from::<C, T>,
    ))
}

// -----------------------------------------------------------------------------
// Sequences

impl<T: Bind> Bind for Vec<T> {
    fn type_info() -> TypeInfo {
        sequence::<Self, T>(SequenceKind::List)
    }
}

impl<T: Bind> Bind for VecDeque<T> {
    fn type_info() -> TypeInfo {
        sequence::<Self, T>(SequenceKind::List)
    }
}

impl<T: Bind + Ord> Bind for BTreeSet<T> {
    fn type_info() -> TypeInfo {
        sequence::<Self, T>(SequenceKind::Set)
    }
}

impl<T: Bind + Eq + Hash> Bind for HashSet<T> {
    fn type_info() -> TypeInfo {
        sequence::<Self, T>(SequenceKind::Set)
    }
}

impl<T: Bind, const N: usize> Bind for [T; N] {
    fn type_info() -> TypeInfo {
        TypeInfo::Sequence(SequenceInfo::new::<Self, T>(
            SequenceKind::Array,
            iter_items::<Self, T>,
            build_array::<T, N>,
        ))
    }
}

fn build_array<T: Bind, const N: usize>(items: Vec<DynValue>) -> Result<DynValue, BindError> {
    let items = take_items::<T>(items)?;
    let len = items.len();
    match <[T; N]>::try_from(items) {
        Ok(array) => Ok(Box::new(array)),
        Err(_) => Err(BindError::conversion(
            format!("array of {len} elements"),
            core::any::type_name::<[T; N]>(),
            format!("expected exactly {N} elements"),
        )),
    }
}

// -----------------------------------------------------------------------------
// Maps

fn take_entries<V: Bind>(entries: Vec<(String, DynValue)>) -> Result<Vec<(String, V)>, BindError> {
    entries
        .into_iter()
        .map(|(key, value)| {
            value
                .downcast::<V>()
                .map(|v| (key, *v))
                .map_err(|_| BindError::mismatch(&Type::of::<V>()))
        })
        .collect()
}

fn build_map<M, V>(entries: Vec<(String, DynValue)>) -> Result<DynValue, BindError>
where
    M: FromIterator<(String, V)> + Any,
    V: Bind,
{
    let entries = take_entries::<V>(entries)?;
    Ok(Box::new(entries.into_iter().collect::<M>()))
}

fn btree_entries<V: Bind>(value: &dyn Any) -> Option<Vec<(&str, &dyn Any)>> {
    value.downcast_ref::<BTreeMap<String, V>>().map(|map| {
        map.iter()
            .map(|(k, v)| (k.as_str(), v as &dyn Any))
            .collect()
    })
}

// Sorted by key so equal maps always produce the same document.
fn hash_entries<V: Bind>(value: &dyn Any) -> Option<Vec<(&str, &dyn Any)>> {
    value.downcast_ref::<HashMap<String, V>>().map(|map| {
        let mut entries: Vec<_> = map
            .iter()
            .map(|(k, v)| (k.as_str(), v as &dyn Any))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    })
}

impl<V: Bind> Bind for BTreeMap<String, V> {
    fn type_info() -> TypeInfo {
        TypeInfo::Map(MapInfo::new::<Self, V>(
            btree_entries::<V>,
            build_map::<Self, V>,
        ))
    }
}

impl<V: Bind> Bind for HashMap<String, V> {
    fn type_info() -> TypeInfo {
        TypeInfo::Map(MapInfo::new::<Self, V>(
            hash_entries::<V>,
            build_map::<Self, V>,
        ))
    }
}

// -----------------------------------------------------------------------------
// Option

impl<T: Bind> Bind for Option<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::Optional(OptionalInfo::of::<T>())
    }
}
