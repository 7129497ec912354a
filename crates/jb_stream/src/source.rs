use serde_json::map::{self, Map};
use serde_json::Value;

use crate::{JsonEvent, StreamError};

// -----------------------------------------------------------------------------
// JsonSource

/// A lazy, forward-only producer of [`JsonEvent`]s for one document.
///
/// Sources are single-use: once an event is returned it cannot be read again.
pub trait JsonSource {
    /// Returns the next event, or `None` after the document is exhausted.
    fn next_event(&mut self) -> Result<Option<JsonEvent>, StreamError>;

    /// Collects the value that `first` opens into a document value.
    ///
    /// `first` must be the event just returned by [`next_event`](Self::next_event).
    fn value_from(&mut self, first: JsonEvent) -> Result<Value, StreamError> {
        match first {
            JsonEvent::StartObject => {
                let mut object = Map::new();
                loop {
                    match self.expect_event()? {
                        JsonEvent::EndObject => return Ok(Value::Object(object)),
                        JsonEvent::Key(key) => {
                            let next = self.expect_event()?;
                            let value = self.value_from(next)?;
                            object.insert(key, value);
                        }
                        other => return Err(unbalanced(&other, 1)),
                    }
                }
            }
            JsonEvent::StartArray => {
                let mut array = Vec::new();
                loop {
                    match self.expect_event()? {
                        JsonEvent::EndArray => return Ok(Value::Array(array)),
                        next => array.push(self.value_from(next)?),
                    }
                }
            }
            other => {
                let name = other.name();
                other.into_scalar().ok_or(StreamError::Unbalanced {
                    event: name,
                    depth: 0,
                })
            }
        }
    }

    /// Reads the next complete value.
    fn read_value(&mut self) -> Result<Value, StreamError> {
        let first = self.expect_event()?;
        self.value_from(first)
    }

    /// Discards the value that `first` opens.
    fn skip_from(&mut self, first: JsonEvent) -> Result<(), StreamError> {
        let mut depth = match first {
            JsonEvent::StartObject | JsonEvent::StartArray => 1usize,
            JsonEvent::EndObject | JsonEvent::EndArray | JsonEvent::Key(_) => {
                return Err(unbalanced(&first, 0));
            }
            _ => return Ok(()),
        };
        while depth > 0 {
            match self.expect_event()? {
                JsonEvent::StartObject | JsonEvent::StartArray => depth += 1,
                JsonEvent::EndObject | JsonEvent::EndArray => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    /// Like [`next_event`](Self::next_event), but a finished document is an error.
    #[inline]
    fn expect_event(&mut self) -> Result<JsonEvent, StreamError> {
        self.next_event()?.ok_or(StreamError::UnexpectedEnd)
    }
}

#[inline]
fn unbalanced(event: &JsonEvent, depth: usize) -> StreamError {
    StreamError::Unbalanced {
        event: event.name(),
        depth,
    }
}

// -----------------------------------------------------------------------------
// ValueSource

enum Frame {
    Object(map::IntoIter),
    Array(std::vec::IntoIter<Value>),
}

/// A [`JsonSource`] walking an owned [`serde_json::Value`].
///
/// Structural values requested through [`JsonSource::value_from`] right after
/// their opening event are handed out without being re-assembled.
pub struct ValueSource {
    pending: Option<Value>,
    stack: Vec<Frame>,
}

impl ValueSource {
    /// Creates a source yielding the events of `value`.
    #[inline]
    pub fn new(value: Value) -> Self {
        Self {
            pending: Some(value),
            stack: Vec::new(),
        }
    }

    /// Current nesting depth.
    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn open(&mut self, value: Value) -> JsonEvent {
        match value {
            Value::Null => JsonEvent::Null,
            Value::Bool(true) => JsonEvent::True,
            Value::Bool(false) => JsonEvent::False,
            Value::Number(n) => JsonEvent::Number(n),
            Value::String(s) => JsonEvent::String(s),
            Value::Array(items) => {
                self.stack.push(Frame::Array(items.into_iter()));
                JsonEvent::StartArray
            }
            Value::Object(object) => {
                self.stack.push(Frame::Object(object.into_iter()));
                JsonEvent::StartObject
            }
        }
    }
}

impl JsonSource for ValueSource {
    fn next_event(&mut self) -> Result<Option<JsonEvent>, StreamError> {
        if let Some(value) = self.pending.take() {
            return Ok(Some(self.open(value)));
        }
        let next = match self.stack.last_mut() {
            None => return Ok(None),
            Some(Frame::Object(entries)) => match entries.next() {
                Some((key, value)) => {
                    self.pending = Some(value);
                    return Ok(Some(JsonEvent::Key(key)));
                }
                None => None,
            },
            Some(Frame::Array(items)) => items.next(),
        };
        match next {
            Some(value) => Ok(Some(self.open(value))),
            None => match self.stack.pop() {
                Some(Frame::Object(_)) => Ok(Some(JsonEvent::EndObject)),
                _ => Ok(Some(JsonEvent::EndArray)),
            },
        }
    }

    fn value_from(&mut self, first: JsonEvent) -> Result<Value, StreamError> {
        match (first, self.stack.last()) {
            (JsonEvent::StartObject, Some(Frame::Object(_))) => match self.stack.pop() {
                Some(Frame::Object(entries)) => Ok(Value::Object(entries.collect())),
                _ => Err(StreamError::UnexpectedEnd),
            },
            (JsonEvent::StartArray, Some(Frame::Array(_))) => match self.stack.pop() {
                Some(Frame::Array(items)) => Ok(Value::Array(items.collect())),
                _ => Err(StreamError::UnexpectedEnd),
            },
            (first, _) => {
                let name = first.name();
                first.into_scalar().ok_or(StreamError::Unbalanced {
                    event: name,
                    depth: self.stack.len(),
                })
            }
        }
    }

    fn skip_from(&mut self, first: JsonEvent) -> Result<(), StreamError> {
        match first {
            JsonEvent::StartObject | JsonEvent::StartArray => {
                self.stack.pop();
                Ok(())
            }
            JsonEvent::EndObject | JsonEvent::EndArray | JsonEvent::Key(_) => {
                Err(unbalanced(&first, self.stack.len()))
            }
            _ => Ok(()),
        }
    }
}

impl From<Value> for ValueSource {
    #[inline]
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn drain(source: &mut impl JsonSource) -> Vec<JsonEvent> {
        let mut events = Vec::new();
        while let Some(event) = source.next_event().unwrap() {
            events.push(event);
        }
        events
    }

    #[test]
    fn walks_nested_document() {
        let mut source = ValueSource::new(json!({"a": [1, true], "b": null}));
        let events = drain(&mut source);
        assert_eq!(
            events,
            vec![
                JsonEvent::StartObject,
                JsonEvent::Key("a".into()),
                JsonEvent::StartArray,
                JsonEvent::Number(1.into()),
                JsonEvent::True,
                JsonEvent::EndArray,
                JsonEvent::Key("b".into()),
                JsonEvent::Null,
                JsonEvent::EndObject,
            ]
        );
    }

    #[test]
    fn value_from_takes_remaining_container() {
        let mut source = ValueSource::new(json!({"a": {"x": 1}, "b": 2}));
        assert_eq!(source.next_event().unwrap(), Some(JsonEvent::StartObject));
        assert_eq!(source.next_event().unwrap(), Some(JsonEvent::Key("a".into())));
        let first = source.next_event().unwrap().unwrap();
        assert_eq!(source.value_from(first).unwrap(), json!({"x": 1}));
        assert_eq!(source.next_event().unwrap(), Some(JsonEvent::Key("b".into())));
    }

    #[test]
    fn skip_from_discards_container() {
        let mut source = ValueSource::new(json!([[1, 2], 3]));
        assert_eq!(source.next_event().unwrap(), Some(JsonEvent::StartArray));
        let first = source.next_event().unwrap().unwrap();
        source.skip_from(first).unwrap();
        assert_eq!(source.next_event().unwrap(), Some(JsonEvent::Number(3.into())));
        assert_eq!(source.next_event().unwrap(), Some(JsonEvent::EndArray));
        assert_eq!(source.next_event().unwrap(), None);
    }

    struct Replay(std::vec::IntoIter<JsonEvent>);

    impl JsonSource for Replay {
        fn next_event(&mut self) -> Result<Option<JsonEvent>, StreamError> {
            Ok(self.0.next())
        }
    }

    #[test]
    fn default_methods_assemble_values() {
        let events = drain(&mut ValueSource::new(json!({"k": [1, "two"]})));
        let mut replay = Replay(events.clone().into_iter());
        assert_eq!(replay.read_value().unwrap(), json!({"k": [1, "two"]}));

        let mut replay = Replay(events.into_iter());
        let first = replay.next_event().unwrap().unwrap();
        replay.skip_from(first).unwrap();
        assert_eq!(replay.next_event().unwrap(), None);

        let mut truncated = Replay(vec![JsonEvent::StartArray].into_iter());
        assert!(matches!(
            truncated.read_value(),
            Err(StreamError::UnexpectedEnd)
        ));
    }
}
