//! Binding engine between typed object graphs and JSON documents.
//!
//! Types describe themselves once through [`Bind`] (see [`info`]). A
//! [`Mapper`] turns those descriptions into cached class models and drives
//! every read and write through them:
//!
//! - [`resolve`]: generic type resolution along class hierarchies.
//! - [`access`]: which fields and accessors bind each property.
//! - [`convert`]: the converter registry and its built-ins.
//! - [`naming`]: wire-name translation and write ordering.
//! - [`policy`]: version gate and write filter.
//! - [`model`]: the cached class models.
//! - `time`: ISO periods and offset times (feature `chrono`).
//!
//! # Examples
//!
//! ```
//! use jb_bind::{impl_bind, info::{BindClass, ClassBuilder}, naming::NamingStrategy, Mapper};
//!
//! #[derive(Default)]
//! struct Order {
//!     order_id: u64,
//!     lines: Vec<String>,
//! }
//!
//! impl BindClass for Order {
//!     fn describe(class: &mut ClassBuilder<Self>) {
//!         class.default_constructor();
//!         class.field("orderId", |o| &o.order_id, |o| &mut o.order_id);
//!         class.field("lines", |o| &o.lines, |o| &mut o.lines);
//!     }
//! }
//!
//! impl_bind!(class Order);
//!
//! let mapper = Mapper::builder()
//!     .naming(NamingStrategy::LowerCaseWithUnderscores)
//!     .build()
//!     .unwrap();
//! let order = Order { order_id: 7, lines: vec!["tea".into()] };
//! assert_eq!(mapper.write_string(&order).unwrap(), r#"{"order_id":7,"lines":["tea"]}"#);
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Modules

mod auto_register;
mod binder;
mod config;
mod error;
mod impls;
mod macros;
mod mapper;

pub mod access;
pub mod convert;
pub mod info;
pub mod model;
pub mod naming;
pub mod policy;
pub mod resolve;
#[cfg(feature = "chrono")]
pub mod time;

// -----------------------------------------------------------------------------
// Top-level exports

pub use config::{MapperBuilder, MapperConfig};
pub use error::{AccessSide, BindError, ErrorKind};
pub use info::Bind;
pub use mapper::Mapper;

pub use jb_stream as stream;

#[doc(hidden)]
pub mod __macro_exports {
    #[cfg(feature = "auto_register")]
    pub use inventory;

    pub use crate::auto_register::AutoRegistration;
}
