//! Introspection contract: how bindable types describe themselves.
//!
//! ## Menu
//!
//! - [`Bind`]: implemented by every bindable type, reports a [`TypeInfo`].
//! - [`TypeInfo`]: scalar, enum, optional, sequence, map or class.
//! - [`TypeRef`]: a declared, possibly generic, type.
//! - [`BindClass`] / [`ClassBuilder`]: explicit property declarations of a class.
//! - [`BindEnum`] / [`EnumConstant`]: declared constants of an enum.
//! - [`Held`]: a property value obtained through a read handle.

// -----------------------------------------------------------------------------
// Modules

mod class;
mod enum_info;
mod handle;
mod ty;
mod type_info;
mod type_ref;

// -----------------------------------------------------------------------------
// Exports

pub use class::{BindClass, ClassBuilder, ClassDecl, ClassInfo};
pub use class::{CreatorArgs, CreatorDecl, MemberDecl, MemberRole, Parent, Visibility};
pub use enum_info::{BindEnum, EnumConstant, EnumInfo};
pub use handle::{HandleMismatch, Held};
pub use ty::Type;
pub use type_info::{Bind, TypeInfo, TypeKind};
pub use type_info::{MapInfo, OptionalInfo, ScalarInfo, SequenceInfo, SequenceKind};
pub use type_ref::TypeRef;

pub(crate) use class::{CreatorFn, DefaultFn, MemberMeta, TypeParam};
pub(crate) use handle::{ConstructFn, ReadFn, UpMut, UpRef, WriteFn};
pub(crate) use handle::{chain_mut, chain_ref, lift_read, lift_write};
#[cfg(test)]
pub(crate) use handle::{read_fn, write_fn};

/// An owned, type-erased value moving through the binder.
pub type DynValue = Box<dyn core::any::Any>;
