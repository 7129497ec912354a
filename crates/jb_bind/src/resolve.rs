//! Generic type resolution.
//!
//! Declared member types ([`TypeRef`]) may name type variables of the
//! declaring class. They are resolved against a [`Bindings`] map built
//! bottom-up from the leaf class through each ancestor, producing a
//! [`ResolvedType`]: a concrete [`TypeInfo`] plus the resolved arguments of
//! every nested container.

use core::fmt;

use thiserror::Error;

use crate::BindError;
use crate::info::{Type, TypeInfo, TypeRef};

/// Deepest type nesting accepted before giving up.
const MAX_DEPTH: usize = 64;

// -----------------------------------------------------------------------------
// ResolveError

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResolveError {
    #[error("type variable `{0}` is not bound")]
    Unbound(&'static str),

    #[error("`{ty}` takes {expected} type arguments, {found} given")]
    Arity {
        ty: String,
        expected: usize,
        found: usize,
    },

    #[error("argument {index} of `{ty}` resolves to `{found}`, expected `{expected}`")]
    Mismatch {
        ty: String,
        index: usize,
        expected: String,
        found: String,
    },

    #[error("type nesting deeper than {MAX_DEPTH} levels")]
    TooDeep,
}

// -----------------------------------------------------------------------------
// ResolvedType

/// A fully concrete type with resolved arguments.
///
/// Arguments follow [`TypeInfo::natural_args`]: the element of a sequence,
/// the wrapped type of an optional, key and value of a map, the type
/// parameters of a class.
#[derive(Debug, Clone)]
pub struct ResolvedType {
    info: TypeInfo,
    args: Vec<ResolvedType>,
}

impl ResolvedType {
    /// Resolves a type with its natural arguments.
    pub fn of<T: crate::Bind>() -> Result<Self, ResolveError> {
        resolve(&TypeRef::of::<T>(), &Bindings::new())
    }

    #[inline]
    pub fn info(&self) -> &TypeInfo {
        &self.info
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        self.info.ty()
    }

    #[inline]
    pub fn args(&self) -> &[ResolvedType] {
        &self.args
    }

    /// The element type of a sequence, or the wrapped type of an optional.
    pub fn item(&self) -> Result<&ResolvedType, BindError> {
        self.args.first().ok_or_else(|| self.missing_arg())
    }

    /// The value type of a map.
    pub fn map_value(&self) -> Result<&ResolvedType, BindError> {
        self.args.last().ok_or_else(|| self.missing_arg())
    }

    fn missing_arg(&self) -> BindError {
        BindError::type_resolution(self.ty(), "<args>", "container without element type")
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ty().name())
    }
}

// -----------------------------------------------------------------------------
// Bindings

/// Substitution map from type variable name to concrete type.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    entries: Vec<(&'static str, ResolvedType)>,
}

impl Bindings {
    #[inline]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Binds `name`, replacing a previous binding.
    pub fn insert(&mut self, name: &'static str, ty: ResolvedType) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = ty,
            None => self.entries.push((name, ty)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedType> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, ty)| ty)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ResolvedType)> {
        self.entries.iter().map(|(n, ty)| (*n, ty))
    }
}

// -----------------------------------------------------------------------------
// resolve

/// Substitutes every variable of `declared` through `bindings`.
///
/// Explicit arguments must agree with the natural arguments of the type;
/// missing arguments are filled with the natural ones.
///
/// # Examples
///
/// ```
/// use jb_bind::info::TypeRef;
/// use jb_bind::resolve::{resolve, Bindings, ResolvedType};
///
/// let mut bindings = Bindings::new();
/// bindings.insert("T", ResolvedType::of::<i64>().unwrap());
///
/// let list = TypeRef::generic::<Vec<i64>>([TypeRef::var("T")]);
/// let resolved = resolve(&list, &bindings).unwrap();
/// assert!(resolved.item().unwrap().ty().is::<i64>());
///
/// assert!(resolve(&TypeRef::var("U"), &bindings).is_err());
/// ```
pub fn resolve(declared: &TypeRef, bindings: &Bindings) -> Result<ResolvedType, ResolveError> {
    resolve_at(declared, bindings, 0)
}

fn resolve_at(
    declared: &TypeRef,
    bindings: &Bindings,
    depth: usize,
) -> Result<ResolvedType, ResolveError> {
    if depth > MAX_DEPTH {
        return Err(ResolveError::TooDeep);
    }
    let (info, explicit) = match declared {
        TypeRef::Var(name) => {
            return bindings.get(name).cloned().ok_or(ResolveError::Unbound(*name));
        }
        TypeRef::Type { info, args } => (info(), args),
    };
    let natural = info.natural_args();

    if explicit.is_empty() {
        let args = natural
            .iter()
            .map(|arg| resolve_at(arg, bindings, depth + 1))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(ResolvedType { info, args });
    }

    if explicit.len() != natural.len() {
        return Err(ResolveError::Arity {
            ty: info.ty().name(),
            expected: natural.len(),
            found: explicit.len(),
        });
    }

    let mut args = Vec::with_capacity(explicit.len());
    for (index, (arg, expected)) in explicit.iter().zip(&natural).enumerate() {
        let resolved = resolve_at(arg, bindings, depth + 1)?;
        if let Some(expected) = expected.info()
            && expected.ty() != resolved.ty()
        {
            return Err(ResolveError::Mismatch {
                ty: info.ty().name(),
                index,
                expected: expected.ty().name(),
                found: resolved.ty().name(),
            });
        }
        args.push(resolved);
    }
    Ok(ResolvedType { info, args })
}
