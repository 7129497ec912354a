use core::any::Any;
use std::sync::Arc;

use crate::info::DynValue;

// -----------------------------------------------------------------------------
// Held

/// A property value obtained through a read handle.
///
/// Fields and reference getters lend the value, value getters produce it.
pub enum Held<'a> {
    Borrowed(&'a dyn Any),
    Owned(DynValue),
}

impl Held<'_> {
    #[inline]
    pub fn as_any(&self) -> &dyn Any {
        match self {
            Self::Borrowed(value) => *value,
            Self::Owned(value) => &**value,
        }
    }
}

/// A handle was applied to an object, or given a value, of the wrong type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleMismatch;

// -----------------------------------------------------------------------------
// Handles

pub(crate) type ReadFn = Arc<dyn for<'a> Fn(&'a dyn Any) -> Option<Held<'a>> + Send + Sync>;

pub(crate) type WriteFn =
    Arc<dyn Fn(&mut dyn Any, DynValue) -> Result<(), HandleMismatch> + Send + Sync>;

pub(crate) type UpRef = Arc<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync>;

pub(crate) type UpMut =
    Arc<dyn for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any> + Send + Sync>;

pub(crate) type ConstructFn = Arc<dyn Fn() -> DynValue + Send + Sync>;

#[inline]
pub(crate) fn read_fn<F>(f: F) -> ReadFn
where
    F: for<'a> Fn(&'a dyn Any) -> Option<Held<'a>> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[inline]
pub(crate) fn write_fn<F>(f: F) -> WriteFn
where
    F: Fn(&mut dyn Any, DynValue) -> Result<(), HandleMismatch> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[inline]
pub(crate) fn up_ref<F>(f: F) -> UpRef
where
    F: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[inline]
pub(crate) fn up_mut<F>(f: F) -> UpMut
where
    F: for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any> + Send + Sync + 'static,
{
    Arc::new(f)
}

// -----------------------------------------------------------------------------
// Composition along the class hierarchy

/// Applies `inner` to the ancestor reached through `up`.
pub(crate) fn lift_read(up: &UpRef, inner: ReadFn) -> ReadFn {
    let up = up.clone();
    read_fn(move |value| up(value).and_then(|ancestor| inner(ancestor)))
}

/// Applies `inner` to the ancestor reached through `up`.
pub(crate) fn lift_write(up: &UpMut, inner: WriteFn) -> WriteFn {
    let up = up.clone();
    write_fn(move |value, input| match up(value) {
        Some(ancestor) => inner(ancestor, input),
        None => Err(HandleMismatch),
    })
}

/// `first` reaches the parent, `then` reaches the grandparent from there.
pub(crate) fn chain_ref(first: &UpRef, then: &UpRef) -> UpRef {
    let (first, then) = (first.clone(), then.clone());
    up_ref(move |value| first(value).and_then(|parent| then(parent)))
}

pub(crate) fn chain_mut(first: &UpMut, then: &UpMut) -> UpMut {
    let (first, then) = (first.clone(), then.clone());
    up_mut(move |value| first(value).and_then(|parent| then(parent)))
}
