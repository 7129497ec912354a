//! Converter registry: value ⇄ JSON conversion per resolved type.
//!
//! ## Menu
//!
//! - [`Converter`] / [`TypedConverter`]: one bidirectional conversion.
//! - [`ConverterRegistry`]: built-ins plus user overrides, resolved by specificity.
//! - [`ConvertContext`]: mapper settings visible to converters.
//! - [`BinaryStrategy`]: representation of `Vec<u8>`.
//! - [`NumberFormat`]: decimal patterns for single numeric properties.

// -----------------------------------------------------------------------------
// Modules

mod builtin;
mod context;
mod converter;
mod locale;
mod number_format;
mod registry;

// -----------------------------------------------------------------------------
// Exports

pub use context::{BinaryStrategy, ConvertContext};
pub use converter::{Converter, TypedConverter, from_fns, typed};
pub use number_format::NumberFormat;
pub use registry::{ConverterRegistry, Resolution};

pub(crate) use locale::parse_locale;
pub(crate) use registry::{enum_from_json, enum_to_json, unsupported};

#[cfg(feature = "chrono")]
pub(crate) use builtin::{format_offset, is_valid_pattern, parse_offset};
