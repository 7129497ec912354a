use std::io::Write;

use serde_json::ser::{CharEscape, CompactFormatter, Formatter, PrettyFormatter};
use serde_json::{Map, Number, Value};

use crate::{JsonEvent, StreamError};

// -----------------------------------------------------------------------------
// JsonSink

/// A consumer of [`JsonEvent`]s that serializes one document.
///
/// Inside an object every value must be preceded by [`key`](Self::key).
pub trait JsonSink {
    fn start_object(&mut self) -> Result<(), StreamError>;
    fn end_object(&mut self) -> Result<(), StreamError>;
    fn start_array(&mut self) -> Result<(), StreamError>;
    fn end_array(&mut self) -> Result<(), StreamError>;
    fn key(&mut self, key: &str) -> Result<(), StreamError>;
    fn string(&mut self, value: &str) -> Result<(), StreamError>;
    fn number(&mut self, value: &Number) -> Result<(), StreamError>;
    fn bool(&mut self, value: bool) -> Result<(), StreamError>;
    fn null(&mut self) -> Result<(), StreamError>;

    /// Pushes any output still held in memory to the destination.
    fn flush(&mut self) -> Result<(), StreamError>;

    /// Writes a whole document value.
    fn value(&mut self, value: &Value) -> Result<(), StreamError> {
        match value {
            Value::Null => self.null(),
            Value::Bool(b) => self.bool(*b),
            Value::Number(n) => self.number(n),
            Value::String(s) => self.string(s),
            Value::Array(items) => {
                self.start_array()?;
                for item in items {
                    self.value(item)?;
                }
                self.end_array()
            }
            Value::Object(object) => {
                self.start_object()?;
                for (key, item) in object {
                    self.key(key)?;
                    self.value(item)?;
                }
                self.end_object()
            }
        }
    }

    /// Dispatches a single event.
    fn write_event(&mut self, event: &JsonEvent) -> Result<(), StreamError> {
        match event {
            JsonEvent::StartObject => self.start_object(),
            JsonEvent::EndObject => self.end_object(),
            JsonEvent::StartArray => self.start_array(),
            JsonEvent::EndArray => self.end_array(),
            JsonEvent::Key(key) => self.key(key),
            JsonEvent::String(s) => self.string(s),
            JsonEvent::Number(n) => self.number(n),
            JsonEvent::True => self.bool(true),
            JsonEvent::False => self.bool(false),
            JsonEvent::Null => self.null(),
        }
    }
}

// -----------------------------------------------------------------------------
// Scope tracking

#[derive(Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Object,
    Array,
}

#[derive(Clone, Copy)]
struct Scope {
    kind: ScopeKind,
    empty: bool,
    has_key: bool,
}

// -----------------------------------------------------------------------------
// Layout

enum Layout {
    Compact(CompactFormatter),
    Pretty(PrettyFormatter<'static>),
}

// `Formatter` is not object safe, so each call is dispatched by hand.
macro_rules! format_with {
    ($sink:ident . $method:ident ( $($arg:expr),* )) => {
        match &mut $sink.layout {
            Layout::Compact(f) => f.$method(&mut $sink.buffer $(, $arg)*),
            Layout::Pretty(f) => f.$method(&mut $sink.buffer $(, $arg)*),
        }
    };
}

// -----------------------------------------------------------------------------
// WriterSink

/// A [`JsonSink`] producing JSON text into an [`io::Write`](std::io::Write).
///
/// Layout is delegated to `serde_json`'s compact or pretty [`Formatter`];
/// the sink itself only checks that events arrive in a balanced order.
/// Output is staged in a buffer of the configured length and handed to the
/// writer whenever the buffer fills up, and on [`flush`](JsonSink::flush).
/// Created by [`GeneratorFactory`](crate::GeneratorFactory).
pub struct WriterSink<W: Write> {
    out: W,
    buffer: Vec<u8>,
    capacity: usize,
    layout: Layout,
    scopes: Vec<Scope>,
    complete: bool,
}

impl<W: Write> WriterSink<W> {
    pub(crate) fn new(out: W, capacity: usize, pretty: bool) -> Self {
        let layout = if pretty {
            Layout::Pretty(PrettyFormatter::new())
        } else {
            Layout::Compact(CompactFormatter)
        };
        Self {
            out,
            buffer: Vec::with_capacity(capacity),
            capacity,
            layout,
            scopes: Vec::new(),
            complete: false,
        }
    }

    /// Size of the staging buffer.
    #[inline]
    pub fn buffer_length(&self) -> usize {
        self.capacity
    }

    /// Returns `true` if indentation and line breaks are emitted.
    #[inline]
    pub fn is_pretty(&self) -> bool {
        matches!(self.layout, Layout::Pretty(_))
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(mut self) -> Result<W, StreamError> {
        self.flush()?;
        Ok(self.out)
    }

    fn spill(&mut self) -> Result<(), StreamError> {
        if self.buffer.len() >= self.capacity {
            self.drain()?;
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<(), StreamError> {
        if !self.buffer.is_empty() {
            self.out.write_all(&self.buffer)?;
            self.buffer.clear();
        }
        Ok(())
    }

    fn violation(&self, event: &'static str) -> StreamError {
        StreamError::Unbalanced {
            event,
            depth: self.scopes.len(),
        }
    }

    fn before_value(&mut self, event: &'static str) -> Result<(), StreamError> {
        match self.scopes.last_mut() {
            None if self.complete => Err(self.violation(event)),
            None => Ok(()),
            Some(scope) if scope.kind == ScopeKind::Object => {
                if scope.has_key {
                    scope.has_key = false;
                    Ok(())
                } else {
                    Err(self.violation(event))
                }
            }
            Some(scope) => {
                let first = scope.empty;
                scope.empty = false;
                format_with!(self.begin_array_value(first))?;
                Ok(())
            }
        }
    }

    fn after_value(&mut self) -> Result<(), StreamError> {
        match self.scopes.last().map(|scope| scope.kind) {
            None => self.complete = true,
            Some(ScopeKind::Object) => format_with!(self.end_object_value())?,
            Some(ScopeKind::Array) => format_with!(self.end_array_value())?,
        }
        self.spill()
    }

    fn write_str(&mut self, value: &str) -> Result<(), StreamError> {
        format_with!(self.begin_string())?;
        let mut start = 0;
        for (index, byte) in value.bytes().enumerate() {
            let escape = match byte {
                b'"' => CharEscape::Quote,
                b'\\' => CharEscape::ReverseSolidus,
                b'\n' => CharEscape::LineFeed,
                b'\r' => CharEscape::CarriageReturn,
                b'\t' => CharEscape::Tab,
                0x08 => CharEscape::Backspace,
                0x0C => CharEscape::FormFeed,
                0x00..=0x1F => CharEscape::AsciiControl(byte),
                _ => continue,
            };
            if start < index {
                format_with!(self.write_string_fragment(&value[start..index]))?;
            }
            format_with!(self.write_char_escape(escape))?;
            start = index + 1;
        }
        if start < value.len() {
            format_with!(self.write_string_fragment(&value[start..]))?;
        }
        format_with!(self.end_string())?;
        Ok(())
    }

    fn open(&mut self, kind: ScopeKind, event: &'static str) -> Result<(), StreamError> {
        self.before_value(event)?;
        match kind {
            ScopeKind::Object => format_with!(self.begin_object())?,
            ScopeKind::Array => format_with!(self.begin_array())?,
        }
        self.scopes.push(Scope {
            kind,
            empty: true,
            has_key: false,
        });
        self.spill()
    }

    fn close(&mut self, kind: ScopeKind, event: &'static str) -> Result<(), StreamError> {
        match self.scopes.last() {
            Some(scope) if scope.kind == kind && !scope.has_key => {}
            _ => return Err(self.violation(event)),
        }
        self.scopes.pop();
        match kind {
            ScopeKind::Object => format_with!(self.end_object())?,
            ScopeKind::Array => format_with!(self.end_array())?,
        }
        self.after_value()
    }
}

impl<W: Write> JsonSink for WriterSink<W> {
    fn start_object(&mut self) -> Result<(), StreamError> {
        self.open(ScopeKind::Object, "START_OBJECT")
    }

    fn end_object(&mut self) -> Result<(), StreamError> {
        self.close(ScopeKind::Object, "END_OBJECT")
    }

    fn start_array(&mut self) -> Result<(), StreamError> {
        self.open(ScopeKind::Array, "START_ARRAY")
    }

    fn end_array(&mut self) -> Result<(), StreamError> {
        self.close(ScopeKind::Array, "END_ARRAY")
    }

    fn key(&mut self, key: &str) -> Result<(), StreamError> {
        let first = match self.scopes.last_mut() {
            Some(scope) if scope.kind == ScopeKind::Object && !scope.has_key => {
                let first = scope.empty;
                scope.empty = false;
                scope.has_key = true;
                first
            }
            _ => return Err(self.violation("KEY")),
        };
        format_with!(self.begin_object_key(first))?;
        self.write_str(key)?;
        format_with!(self.end_object_key())?;
        format_with!(self.begin_object_value())?;
        self.spill()
    }

    fn string(&mut self, value: &str) -> Result<(), StreamError> {
        self.before_value("VALUE_STRING")?;
        self.write_str(value)?;
        self.after_value()
    }

    fn number(&mut self, value: &Number) -> Result<(), StreamError> {
        self.before_value("VALUE_NUMBER")?;
        format_with!(self.write_number_str(&value.to_string()))?;
        self.after_value()
    }

    fn bool(&mut self, value: bool) -> Result<(), StreamError> {
        self.before_value(if value { "VALUE_TRUE" } else { "VALUE_FALSE" })?;
        format_with!(self.write_bool(value))?;
        self.after_value()
    }

    fn null(&mut self) -> Result<(), StreamError> {
        self.before_value("VALUE_NULL")?;
        format_with!(self.write_null())?;
        self.after_value()
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        if !self.scopes.is_empty() {
            log::debug!("flushing JSON output with {} open scopes", self.scopes.len());
        }
        self.drain()?;
        self.out.flush()?;
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// ValueSink

enum Slot {
    Object(Map<String, Value>, Option<String>),
    Array(Vec<Value>),
}

/// A [`JsonSink`] assembling a [`serde_json::Value`] in memory.
///
/// # Examples
///
/// ```
/// use jb_stream::{JsonSink, ValueSink};
/// use serde_json::json;
///
/// let mut sink = ValueSink::new();
/// sink.start_object().unwrap();
/// sink.key("id").unwrap();
/// sink.number(&7.into()).unwrap();
/// sink.end_object().unwrap();
/// assert_eq!(sink.into_value().unwrap(), json!({"id": 7}));
/// ```
#[derive(Default)]
pub struct ValueSink {
    stack: Vec<Slot>,
    root: Option<Value>,
}

impl ValueSink {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the finished document.
    pub fn into_value(self) -> Result<Value, StreamError> {
        match (self.root, self.stack.is_empty()) {
            (Some(value), true) => Ok(value),
            (None, true) => Err(StreamError::UnexpectedEnd),
            (_, false) => Err(StreamError::Unbalanced {
                event: "END",
                depth: self.stack.len(),
            }),
        }
    }

    fn violation(&self, event: &'static str) -> StreamError {
        StreamError::Unbalanced {
            event,
            depth: self.stack.len(),
        }
    }

    fn place(&mut self, event: &'static str, value: Value) -> Result<(), StreamError> {
        match self.stack.last_mut() {
            None if self.root.is_none() => {
                self.root = Some(value);
                Ok(())
            }
            None => Err(self.violation(event)),
            Some(Slot::Array(items)) => {
                items.push(value);
                Ok(())
            }
            Some(Slot::Object(object, key)) => match key.take() {
                Some(key) => {
                    object.insert(key, value);
                    Ok(())
                }
                None => Err(self.violation(event)),
            },
        }
    }

    fn check_open(&self, event: &'static str) -> Result<(), StreamError> {
        match self.stack.last() {
            None if self.root.is_some() => Err(self.violation(event)),
            Some(Slot::Object(_, None)) => Err(self.violation(event)),
            _ => Ok(()),
        }
    }
}

impl JsonSink for ValueSink {
    fn start_object(&mut self) -> Result<(), StreamError> {
        self.check_open("START_OBJECT")?;
        self.stack.push(Slot::Object(Map::new(), None));
        Ok(())
    }

    fn end_object(&mut self) -> Result<(), StreamError> {
        match self.stack.pop() {
            Some(Slot::Object(object, None)) => self.place("END_OBJECT", Value::Object(object)),
            Some(other) => {
                self.stack.push(other);
                Err(self.violation("END_OBJECT"))
            }
            None => Err(self.violation("END_OBJECT")),
        }
    }

    fn start_array(&mut self) -> Result<(), StreamError> {
        self.check_open("START_ARRAY")?;
        self.stack.push(Slot::Array(Vec::new()));
        Ok(())
    }

    fn end_array(&mut self) -> Result<(), StreamError> {
        match self.stack.pop() {
            Some(Slot::Array(items)) => self.place("END_ARRAY", Value::Array(items)),
            Some(other) => {
                self.stack.push(other);
                Err(self.violation("END_ARRAY"))
            }
            None => Err(self.violation("END_ARRAY")),
        }
    }

    fn key(&mut self, key: &str) -> Result<(), StreamError> {
        match self.stack.last_mut() {
            Some(Slot::Object(_, pending)) if pending.is_none() => {
                *pending = Some(key.to_owned());
                Ok(())
            }
            _ => Err(self.violation("KEY")),
        }
    }

    fn string(&mut self, value: &str) -> Result<(), StreamError> {
        self.place("VALUE_STRING", Value::String(value.to_owned()))
    }

    fn number(&mut self, value: &Number) -> Result<(), StreamError> {
        self.place("VALUE_NUMBER", Value::Number(value.clone()))
    }

    fn bool(&mut self, value: bool) -> Result<(), StreamError> {
        self.place("VALUE_BOOL", Value::Bool(value))
    }

    fn null(&mut self) -> Result<(), StreamError> {
        self.place("VALUE_NULL", Value::Null)
    }

    fn value(&mut self, value: &Value) -> Result<(), StreamError> {
        let event = match value {
            Value::Object(_) => "START_OBJECT",
            Value::Array(_) => "START_ARRAY",
            _ => "VALUE",
        };
        self.place(event, value.clone())
    }

    #[inline]
    fn flush(&mut self) -> Result<(), StreamError> {
        Ok(())
    }
}
