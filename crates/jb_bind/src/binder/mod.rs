//! Read and write orchestration.
//!
//! One [`Engine`] is owned by every mapper. Each call creates a fresh
//! [`BindingContext`] and a single-use driver around the caller's source or
//! sink; nothing but the class-model cache is shared between calls.

// -----------------------------------------------------------------------------
// Modules

mod context;
mod read;
mod write;

use std::sync::Arc;

use jb_stream::{GeneratorFactory, JsonEvent, ParserFactory, StreamError};

use crate::BindError;
use crate::convert::{ConvertContext, ConverterRegistry};
use crate::info::ClassInfo;
use crate::model::{ClassModel, ModelCache, ModelSettings};
use crate::policy::InclusionPolicy;

pub(crate) use context::BindingContext;
pub(crate) use read::ReadDriver;
pub(crate) use write::WriteDriver;

// -----------------------------------------------------------------------------
// Engine

/// Immutable configuration shared by every call of one mapper.
pub(crate) struct Engine {
    pub registry: ConverterRegistry,
    pub models: ModelCache,
    pub settings: ModelSettings,
    pub convert: ConvertContext,
    pub policy: InclusionPolicy,
    pub skip_null: bool,
    pub generator: GeneratorFactory,
    pub parser: ParserFactory,
}

impl Engine {
    #[inline]
    pub fn model(&self, info: &ClassInfo) -> Result<Arc<ClassModel>, BindError> {
        self.models.get_or_build(info, &self.settings)
    }
}

/// The text shown for `event` in conversion errors.
fn event_text(event: &JsonEvent) -> String {
    match event {
        JsonEvent::String(text) => text.clone(),
        JsonEvent::Number(number) => number.to_string(),
        JsonEvent::True => "true".to_owned(),
        JsonEvent::False => "false".to_owned(),
        JsonEvent::Null => "null".to_owned(),
        other => other.name().to_owned(),
    }
}

/// An event the source should never have produced at this point.
fn unexpected(event: &JsonEvent, depth: usize) -> BindError {
    BindError::Stream(StreamError::Unbalanced {
        event: event.name(),
        depth,
    })
}

#[cfg(test)]
mod tests;
