use core::any::Any;
use core::fmt;

use crate::info::{ClassInfo, DynValue, EnumInfo, Type, TypeRef};
use crate::BindError;

// -----------------------------------------------------------------------------
// Bind

/// A type the mapper can bind to and from JSON.
///
/// Implemented for the standard scalars and containers. Use
/// [`impl_bind!`](crate::impl_bind) for your own classes, enums and
/// converter-backed scalars.
pub trait Bind: Any {
    /// Describes how values of this type are shaped.
    fn type_info() -> TypeInfo;
}

// -----------------------------------------------------------------------------
// TypeKind

/// The structural category of a bindable type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Scalar,
    Enum,
    Optional,
    Sequence,
    Map,
    Class,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => f.pad("Scalar"),
            Self::Enum => f.pad("Enum"),
            Self::Optional => f.pad("Optional"),
            Self::Sequence => f.pad("Sequence"),
            Self::Map => f.pad("Map"),
            Self::Class => f.pad("Class"),
        }
    }
}

// -----------------------------------------------------------------------------
// TypeInfo

/// Compile-time description of a bindable type.
#[derive(Debug, Clone)]
pub enum TypeInfo {
    /// Converted as a whole by a registered converter.
    Scalar(ScalarInfo),
    Enum(EnumInfo),
    Optional(OptionalInfo),
    Sequence(SequenceInfo),
    /// A string-keyed map, written as a JSON object.
    Map(MapInfo),
    Class(ClassInfo),
}

impl TypeInfo {
    /// The described type.
    pub fn ty(&self) -> &Type {
        match self {
            Self::Scalar(info) => &info.ty,
            Self::Enum(info) => info.ty(),
            Self::Optional(info) => &info.ty,
            Self::Sequence(info) => &info.ty,
            Self::Map(info) => &info.ty,
            Self::Class(info) => info.ty(),
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Scalar(_) => TypeKind::Scalar,
            Self::Enum(_) => TypeKind::Enum,
            Self::Optional(_) => TypeKind::Optional,
            Self::Sequence(_) => TypeKind::Sequence,
            Self::Map(_) => TypeKind::Map,
            Self::Class(_) => TypeKind::Class,
        }
    }

    /// The natural type arguments of this type, in declaration order.
    ///
    /// Classes report the natural bindings of their type parameters.
    pub fn natural_args(&self) -> Vec<TypeRef> {
        match self {
            Self::Scalar(_) | Self::Enum(_) => Vec::new(),
            Self::Optional(info) => vec![info.inner()],
            Self::Sequence(info) => vec![info.item()],
            Self::Map(info) => vec![TypeRef::of::<String>(), info.value()],
            Self::Class(info) => info.describe().natural_params(),
        }
    }

    #[inline]
    pub fn as_class(&self) -> Option<&ClassInfo> {
        match self {
            Self::Class(info) => Some(info),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// ScalarInfo

/// A type converted as a whole by a converter.
#[derive(Debug, Clone, Copy)]
pub struct ScalarInfo {
    ty: Type,
}

impl ScalarInfo {
    #[inline]
    pub fn of<T: Any>() -> Self {
        Self { ty: Type::of::<T>() }
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }
}

// -----------------------------------------------------------------------------
// OptionalInfo

/// An optional wrapper: absent values are omitted on write.
#[derive(Clone)]
pub struct OptionalInfo {
    ty: Type,
    inner: fn() -> TypeRef,
    get: fn(&dyn Any) -> Option<Option<&dyn Any>>,
    wrap: fn(DynValue) -> Option<DynValue>,
    empty: fn() -> DynValue,
}

impl OptionalInfo {
    /// Describes `Option<T>`.
    pub fn of<T: Bind>() -> Self {
        Self {
            ty: Type::of::<Option<T>>(),
            inner: TypeRef::of::<T>,
            get: option_get::<T>,
            wrap: option_wrap::<T>,
            empty: option_empty::<T>,
        }
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// The wrapped type.
    #[inline]
    pub fn inner(&self) -> TypeRef {
        (self.inner)()
    }

    /// Returns `None` if `value` is not of the described type,
    /// otherwise the present value, if any.
    #[inline]
    pub fn get<'a>(&self, value: &'a dyn Any) -> Option<Option<&'a dyn Any>> {
        (self.get)(value)
    }

    /// Wraps a value of the inner type.
    #[inline]
    pub fn wrap(&self, value: DynValue) -> Option<DynValue> {
        (self.wrap)(value)
    }

    /// The absent value.
    #[inline]
    pub fn empty(&self) -> DynValue {
        (self.empty)()
    }
}

impl fmt::Debug for OptionalInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionalInfo")
            .field("ty", &self.ty)
            .finish_non_exhaustive()
    }
}

fn option_get<T: Bind>(value: &dyn Any) -> Option<Option<&dyn Any>> {
    value
        .downcast_ref::<Option<T>>()
        .map(|opt| opt.as_ref().map(|v| v as &dyn Any))
}

fn option_wrap<T: Bind>(value: DynValue) -> Option<DynValue> {
    value
        .downcast::<T>()
        .ok()
        .map(|v| Box::new(Some(*v)) as DynValue)
}

fn option_empty<T: Bind>() -> DynValue {
    Box::new(None::<T>)
}

// -----------------------------------------------------------------------------
// SequenceInfo

/// The flavour of a sequence, informational only: all are JSON arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceKind {
    List,
    Set,
    Array,
}

/// A homogeneous collection written as a JSON array.
#[derive(Clone)]
pub struct SequenceInfo {
    ty: Type,
    kind: SequenceKind,
    item: fn() -> TypeRef,
    items: fn(&dyn Any) -> Option<Vec<&dyn Any>>,
    build: fn(Vec<DynValue>) -> Result<DynValue, BindError>,
}

impl SequenceInfo {
    /// Creates a sequence description.
    ///
    /// `items` lists the elements of a value in iteration order, `build`
    /// rebuilds the collection from a literal element sequence.
    pub fn new<S: Any, T: Bind>(
        kind: SequenceKind,
        items: fn(&dyn Any) -> Option<Vec<&dyn Any>>,
        build: fn(Vec<DynValue>) -> Result<DynValue, BindError>,
    ) -> Self {
        Self {
            ty: Type::of::<S>(),
            kind,
            item: TypeRef::of::<T>,
            items,
            build,
        }
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub fn kind(&self) -> SequenceKind {
        self.kind
    }

    /// The element type.
    #[inline]
    pub fn item(&self) -> TypeRef {
        (self.item)()
    }

    #[inline]
    pub fn items<'a>(&self, value: &'a dyn Any) -> Option<Vec<&'a dyn Any>> {
        (self.items)(value)
    }

    #[inline]
    pub fn build(&self, items: Vec<DynValue>) -> Result<DynValue, BindError> {
        (self.build)(items)
    }
}

impl fmt::Debug for SequenceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceInfo")
            .field("ty", &self.ty)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// MapInfo

/// A string-keyed map written as a JSON object.
#[derive(Clone)]
pub struct MapInfo {
    ty: Type,
    value: fn() -> TypeRef,
    entries: fn(&dyn Any) -> Option<Vec<(&str, &dyn Any)>>,
    build: fn(Vec<(String, DynValue)>) -> Result<DynValue, BindError>,
}

impl MapInfo {
    pub fn new<M: Any, V: Bind>(
        entries: fn(&dyn Any) -> Option<Vec<(&str, &dyn Any)>>,
        build: fn(Vec<(String, DynValue)>) -> Result<DynValue, BindError>,
    ) -> Self {
        Self {
            ty: Type::of::<M>(),
            value: TypeRef::of::<V>,
            entries,
            build,
        }
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// The value type.
    #[inline]
    pub fn value(&self) -> TypeRef {
        (self.value)()
    }

    #[inline]
    pub fn entries<'a>(&self, value: &'a dyn Any) -> Option<Vec<(&'a str, &'a dyn Any)>> {
        (self.entries)(value)
    }

    #[inline]
    pub fn build(&self, entries: Vec<(String, DynValue)>) -> Result<DynValue, BindError> {
        (self.build)(entries)
    }
}

impl fmt::Debug for MapInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapInfo")
            .field("ty", &self.ty)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_roundtrip_through_handles() {
        let TypeInfo::Optional(info) = Option::<i32>::type_info() else {
            panic!("Option is optional");
        };
        let present: Option<i32> = Some(3);
        let absent: Option<i32> = None;
        assert_eq!(
            info.get(&present).flatten().and_then(|v| v.downcast_ref::<i32>()),
            Some(&3)
        );
        assert!(matches!(info.get(&absent), Some(None)));
        assert!(info.get(&5_i32).is_none());

        let wrapped = info.wrap(Box::new(7_i32)).unwrap();
        assert_eq!(wrapped.downcast_ref::<Option<i32>>(), Some(&Some(7)));
        assert_eq!(info.empty().downcast_ref::<Option<i32>>(), Some(&None));
    }

    #[test]
    fn kinds_and_natural_args() {
        let info = Vec::<String>::type_info();
        assert_eq!(info.kind(), TypeKind::Sequence);
        assert_eq!(info.ty(), &Type::of::<Vec<String>>());
        let args = info.natural_args();
        assert_eq!(args.len(), 1);
        assert!(args[0].info().is_some_and(|i| i.ty().is::<String>()));
        assert_eq!(i64::type_info().kind(), TypeKind::Scalar);
        assert!(i64::type_info().natural_args().is_empty());
    }
}
