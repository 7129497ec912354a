use core::fmt;

use jb_stream::StreamError;
use thiserror::Error;

use crate::info::Type;

// -----------------------------------------------------------------------------
// AccessSide

/// Which half of a property was needed when an [`BindError::Access`] occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessSide {
    /// Reading the in-memory value, needed on write.
    Reader,
    /// Storing into the in-memory value, needed on read.
    Writer,
}

impl fmt::Display for AccessSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reader => f.pad("reader"),
            Self::Writer => f.pad("writer"),
        }
    }
}

// -----------------------------------------------------------------------------
// ErrorKind

/// Field-less mirror of [`BindError`], convenient for matching in tests and callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    TypeResolution,
    Access,
    Conversion,
    Instantiation,
    Stream,
}

// -----------------------------------------------------------------------------
// BindError

/// Every failure a mapper can raise.
///
/// Errors raised during a read or write carry the JSON pointer of the
/// location being processed (`""` is the document root).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BindError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("cannot resolve the type of `{class}::{property}`: {reason}")]
    TypeResolution {
        class: String,
        property: String,
        reason: String,
    },

    #[error("no usable {side} for `{class}::{property}` at \"{path}\"")]
    Access {
        class: String,
        property: String,
        side: AccessSide,
        path: String,
    },

    #[error("cannot convert `{raw}` to `{target}` at \"{path}\": {reason}")]
    Conversion {
        path: String,
        raw: String,
        target: String,
        reason: String,
    },

    #[error("cannot instantiate `{class}` at \"{path}\": {reason}")]
    Instantiation {
        class: String,
        path: String,
        reason: String,
    },

    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl BindError {
    /// Returns the kind of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::TypeResolution { .. } => ErrorKind::TypeResolution,
            Self::Access { .. } => ErrorKind::Access,
            Self::Conversion { .. } => ErrorKind::Conversion,
            Self::Instantiation { .. } => ErrorKind::Instantiation,
            Self::Stream(_) => ErrorKind::Stream,
        }
    }

    /// Creates a [`BindError::Configuration`].
    #[inline]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a [`BindError::Conversion`] without location.
    ///
    /// The binder fills in the JSON pointer when the error leaves a converter.
    pub fn conversion(
        raw: impl Into<String>,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Conversion {
            path: String::new(),
            raw: raw.into(),
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Creates a [`BindError::Instantiation`] without location.
    pub fn instantiation(class: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Instantiation {
            class: class.into(),
            path: String::new(),
            reason: reason.into(),
        }
    }

    pub(crate) fn type_resolution(class: &Type, property: &str, reason: impl Into<String>) -> Self {
        Self::TypeResolution {
            class: class.path().to_owned(),
            property: property.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn access(class: &Type, property: &str, side: AccessSide) -> Self {
        Self::Access {
            class: class.path().to_owned(),
            property: property.to_owned(),
            side,
            path: String::new(),
        }
    }

    /// A value handed to a converter or handle was not of the expected type.
    pub(crate) fn mismatch(target: &Type) -> Self {
        Self::conversion("<value>", target.path(), "value of an unexpected type")
    }

    /// Sets the JSON pointer, unless a more precise one is already recorded.
    pub fn at(mut self, pointer: &str) -> Self {
        match &mut self {
            Self::Access { path, .. }
            | Self::Conversion { path, .. }
            | Self::Instantiation { path, .. } => {
                if path.is_empty() {
                    pointer.clone_into(path);
                }
            }
            _ => {}
        }
        self
    }

    /// The JSON pointer recorded on this error, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Access { path, .. }
            | Self::Conversion { path, .. }
            | Self::Instantiation { path, .. } => Some(path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_is_set_once() {
        let err = BindError::conversion("x", "i32", "not a number")
            .at("/items/1")
            .at("/items");
        assert_eq!(err.kind(), ErrorKind::Conversion);
        assert_eq!(err.path(), Some("/items/1"));
        assert!(err.to_string().contains("/items/1"));
        assert!(err.to_string().contains("`x`"));
    }

    #[test]
    fn configuration_has_no_path() {
        let err = BindError::configuration("bad").at("/a");
        assert_eq!(err.path(), None);
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
