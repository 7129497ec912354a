//! Small container utilities shared by the `jb_*` crates.
//!
//! - [`hash`]: a fixed-seed hash state for ordered property maps.
//! - [`TypeIdMap`]: a map keyed by [`TypeId`](core::any::TypeId), used for
//!   converter tables and class-model caches.
#![no_std]

// -----------------------------------------------------------------------------
// Modules

mod typeid_map;

pub mod hash;

// -----------------------------------------------------------------------------
// Top-level exports

pub use typeid_map::TypeIdMap;
