use std::io::{Read, Write};

use serde_json::Value;

use crate::{StreamError, ValueSource, WriterSink};

/// Default size of the character buffer used by generated sinks.
pub const DEFAULT_BUFFER_LENGTH: usize = 64 * 1024;

// -----------------------------------------------------------------------------
// GeneratorFactory

/// Creates single-use [`WriterSink`]s sharing one pretty flag and buffer length.
///
/// # Examples
///
/// ```
/// use jb_stream::{GeneratorFactory, StreamError};
///
/// let factory = GeneratorFactory::new(true, 1024).unwrap();
/// assert!(factory.is_pretty());
/// assert_eq!(factory.buffer_length(), 1024);
///
/// assert!(matches!(GeneratorFactory::new(false, 0), Err(StreamError::Configuration(_))));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct GeneratorFactory {
    pretty: bool,
    buffer_length: usize,
}

impl GeneratorFactory {
    /// Creates a factory.
    ///
    /// A zero or negative `buffer_length` is rejected.
    pub fn new(pretty: bool, buffer_length: i64) -> Result<Self, StreamError> {
        Ok(Self {
            pretty,
            buffer_length: checked_length(buffer_length)?,
        })
    }

    #[inline]
    pub fn is_pretty(&self) -> bool {
        self.pretty
    }

    #[inline]
    pub fn buffer_length(&self) -> usize {
        self.buffer_length
    }

    /// Returns a copy of this factory with another pretty flag.
    #[inline]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Creates a sink writing into `out` with the factory buffer length.
    #[inline]
    pub fn create<W: Write>(&self, out: W) -> WriterSink<W> {
        WriterSink::new(out, self.buffer_length, self.pretty)
    }

    /// Creates a sink whose buffer length is taken from `buffer_length`
    /// instead of the factory setting.
    pub fn create_buffered<W: Write>(
        &self,
        out: W,
        buffer_length: i64,
    ) -> Result<WriterSink<W>, StreamError> {
        let length = checked_length(buffer_length)?;
        Ok(WriterSink::new(out, length, self.pretty))
    }
}

impl Default for GeneratorFactory {
    #[inline]
    fn default() -> Self {
        Self {
            pretty: false,
            buffer_length: DEFAULT_BUFFER_LENGTH,
        }
    }
}

fn checked_length(length: i64) -> Result<usize, StreamError> {
    match usize::try_from(length) {
        Ok(length) if length > 0 => Ok(length),
        _ => Err(StreamError::Configuration(format!(
            "buffer length must be positive, got {length}"
        ))),
    }
}

// -----------------------------------------------------------------------------
// ParserFactory

/// Creates single-use [`ValueSource`]s from JSON text or document values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserFactory;

impl ParserFactory {
    #[inline]
    pub const fn new() -> Self {
        Self
    }

    /// Parses `text` into a source.
    pub fn from_str(&self, text: &str) -> Result<ValueSource, StreamError> {
        let value: Value = serde_json::from_str(text)?;
        Ok(ValueSource::new(value))
    }

    /// Parses UTF-8 bytes into a source.
    pub fn from_slice(&self, bytes: &[u8]) -> Result<ValueSource, StreamError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Ok(ValueSource::new(value))
    }

    /// Parses the whole content of `reader` into a source.
    pub fn from_reader<R: Read>(&self, reader: R) -> Result<ValueSource, StreamError> {
        let value: Value = serde_json::from_reader(reader)?;
        Ok(ValueSource::new(value))
    }

    /// Wraps an already parsed document.
    #[inline]
    pub fn from_value(&self, value: Value) -> ValueSource {
        ValueSource::new(value)
    }
}
