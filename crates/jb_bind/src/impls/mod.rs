//! [`Bind`](crate::Bind) implementations for standard and ecosystem types.

mod collections;
mod primitives;

#[cfg(feature = "bignum")]
mod bignum;
#[cfg(feature = "url")]
mod net;
#[cfg(feature = "chrono")]
mod time;
