//! Streaming JSON collaborators for the binding engine.
//!
//! The binder never touches JSON text directly. It pulls [`JsonEvent`]s from a
//! [`JsonSource`] and pushes them into a [`JsonSink`]. Tokenizing is delegated
//! to `serde_json`; this crate only provides the event vocabulary, the
//! single-use source/sink instances and the factories that create them.
//!
//! # Examples
//!
//! ```
//! use jb_stream::{GeneratorFactory, JsonEvent, JsonSink, JsonSource, ParserFactory};
//!
//! let mut source = ParserFactory::new().from_str(r#"{"name":"foo"}"#).unwrap();
//! assert_eq!(source.next_event().unwrap(), Some(JsonEvent::StartObject));
//! assert_eq!(source.next_event().unwrap(), Some(JsonEvent::Key("name".into())));
//!
//! let mut out = Vec::new();
//! let mut sink = GeneratorFactory::default().create(&mut out);
//! sink.start_array().unwrap();
//! sink.string("foo").unwrap();
//! sink.end_array().unwrap();
//! sink.flush().unwrap();
//! drop(sink);
//! assert_eq!(out, br#"["foo"]"#);
//! ```

// -----------------------------------------------------------------------------
// Modules

mod error;
mod event;
mod factory;
mod sink;
mod source;

// -----------------------------------------------------------------------------
// Exports

pub use error::StreamError;
pub use event::JsonEvent;
pub use factory::{DEFAULT_BUFFER_LENGTH, GeneratorFactory, ParserFactory};
pub use sink::{JsonSink, ValueSink, WriterSink};
pub use source::{JsonSource, ValueSource};

pub use serde_json;
