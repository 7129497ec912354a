//! Converters registered by [`ConverterRegistry::with_builtins`].
//!
//! [`ConverterRegistry::with_builtins`]: crate::convert::ConverterRegistry::with_builtins

use crate::convert::ConverterRegistry;

mod binary;
mod number;
mod text;

#[cfg(feature = "bignum")]
mod bignum;
#[cfg(feature = "url")]
mod net;
#[cfg(feature = "chrono")]
mod time;
#[cfg(feature = "chrono")]
mod zone;

#[cfg(feature = "chrono")]
pub(crate) use time::is_valid_pattern;
#[cfg(feature = "chrono")]
pub(crate) use zone::{format_offset, parse_offset};

pub(crate) fn install(registry: &mut ConverterRegistry) {
    number::install(registry);
    text::install(registry);
    binary::install(registry);

    #[cfg(feature = "bignum")]
    bignum::install(registry);
    #[cfg(feature = "url")]
    net::install(registry);
    #[cfg(feature = "chrono")]
    time::install(registry);
    #[cfg(feature = "chrono")]
    zone::install(registry);
}
