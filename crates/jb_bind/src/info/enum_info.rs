use core::any::Any;
use core::fmt;

use crate::info::{DynValue, Type};

// -----------------------------------------------------------------------------
// BindEnum

/// A unit-only enum bound to a JSON string.
///
/// # Examples
///
/// ```
/// use jb_bind::info::{BindEnum, EnumConstant};
///
/// #[derive(Clone, Copy, PartialEq, Debug)]
/// enum Level { Low, High }
///
/// impl BindEnum for Level {
///     const CONSTANTS: &'static [EnumConstant<Self>] = &[
///         EnumConstant::new("LOW", Level::Low).alias("-1"),
///         EnumConstant::new("HIGH", Level::High),
///     ];
/// }
///
/// assert_eq!(Level::High.wire_name(), Some("HIGH"));
/// assert_eq!(Level::Low.wire_name(), Some("-1"));
/// assert_eq!(Level::from_wire_name("-1"), Some(Level::Low));
/// ```
pub trait BindEnum: Any + Copy + PartialEq {
    /// Every constant, in declaration order.
    const CONSTANTS: &'static [EnumConstant<Self>];

    /// The JSON text of `self`: its alias when declared, otherwise its name.
    fn wire_name(&self) -> Option<&'static str> {
        Self::CONSTANTS
            .iter()
            .find(|c| c.value == *self)
            .map(EnumConstant::wire_name)
    }

    /// Looks up a constant by its exact, case-sensitive JSON text.
    ///
    /// Wire names are tried first; the natural name of a constant is
    /// accepted as long as it is not another constant's wire name.
    fn from_wire_name(text: &str) -> Option<Self> {
        let constants = Self::CONSTANTS;
        constants
            .iter()
            .find(|c| c.wire_name() == text)
            .or_else(|| constants.iter().find(|c| c.name == text))
            .map(|c| c.value)
    }
}

// -----------------------------------------------------------------------------
// EnumConstant

/// One declared enum constant.
#[derive(Debug, Clone, Copy)]
pub struct EnumConstant<E> {
    pub name: &'static str,
    pub value: E,
    pub alias: Option<&'static str>,
}

impl<E> EnumConstant<E> {
    #[inline]
    pub const fn new(name: &'static str, value: E) -> Self {
        Self {
            name,
            value,
            alias: None,
        }
    }

    /// Replaces the natural name on the wire.
    #[inline]
    pub const fn alias(mut self, alias: &'static str) -> Self {
        self.alias = Some(alias);
        self
    }

    #[inline]
    pub const fn wire_name(&self) -> &'static str {
        match self.alias {
            Some(alias) => alias,
            None => self.name,
        }
    }
}

// -----------------------------------------------------------------------------
// EnumInfo

/// Type-erased view of a [`BindEnum`].
#[derive(Clone)]
pub struct EnumInfo {
    ty: Type,
    names: fn() -> Vec<&'static str>,
    to_wire: fn(&dyn Any) -> Option<&'static str>,
    from_wire: fn(&str) -> Option<DynValue>,
}

impl EnumInfo {
    pub fn of<E: BindEnum>() -> Self {
        Self {
            ty: Type::of::<E>(),
            names: wire_names::<E>,
            to_wire: to_wire::<E>,
            from_wire: from_wire::<E>,
        }
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Wire names of all constants, in declaration order.
    #[inline]
    pub fn names(&self) -> Vec<&'static str> {
        (self.names)()
    }

    #[inline]
    pub fn to_wire(&self, value: &dyn Any) -> Option<&'static str> {
        (self.to_wire)(value)
    }

    #[inline]
    pub fn from_wire(&self, text: &str) -> Option<DynValue> {
        (self.from_wire)(text)
    }
}

impl fmt::Debug for EnumInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumInfo")
            .field("ty", &self.ty)
            .field("names", &self.names())
            .finish()
    }
}

fn wire_names<E: BindEnum>() -> Vec<&'static str> {
    E::CONSTANTS.iter().map(EnumConstant::wire_name).collect()
}

fn to_wire<E: BindEnum>(value: &dyn Any) -> Option<&'static str> {
    value.downcast_ref::<E>().and_then(E::wire_name)
}

fn from_wire<E: BindEnum>(text: &str) -> Option<DynValue> {
    E::from_wire_name(text).map(|e| Box::new(e) as DynValue)
}
