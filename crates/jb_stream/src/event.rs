use serde_json::{Number, Value};

// -----------------------------------------------------------------------------
// JsonEvent

/// One step of a forward-only JSON document walk.
///
/// Numbers keep their original text (`serde_json` is built with
/// `arbitrary_precision`), so big integers and decimals survive untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonEvent {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    Key(String),
    String(String),
    Number(Number),
    True,
    False,
    Null,
}

impl JsonEvent {
    /// A short, stable name used in error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StartObject => "START_OBJECT",
            Self::EndObject => "END_OBJECT",
            Self::StartArray => "START_ARRAY",
            Self::EndArray => "END_ARRAY",
            Self::Key(_) => "KEY",
            Self::String(_) => "VALUE_STRING",
            Self::Number(_) => "VALUE_NUMBER",
            Self::True => "VALUE_TRUE",
            Self::False => "VALUE_FALSE",
            Self::Null => "VALUE_NULL",
        }
    }

    /// Returns `true` for events that may begin a value.
    #[inline]
    pub const fn starts_value(&self) -> bool {
        !matches!(self, Self::EndObject | Self::EndArray | Self::Key(_))
    }

    /// Converts a scalar event into its document value.
    ///
    /// Returns `None` for structural events.
    pub fn into_scalar(self) -> Option<Value> {
        match self {
            Self::String(s) => Some(Value::String(s)),
            Self::Number(n) => Some(Value::Number(n)),
            Self::True => Some(Value::Bool(true)),
            Self::False => Some(Value::Bool(false)),
            Self::Null => Some(Value::Null),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::JsonEvent;
    use serde_json::Value;

    #[test]
    fn scalar_events_convert() {
        assert_eq!(JsonEvent::True.into_scalar(), Some(Value::Bool(true)));
        assert_eq!(JsonEvent::Null.into_scalar(), Some(Value::Null));
        assert_eq!(JsonEvent::StartArray.into_scalar(), None);
        assert!(!JsonEvent::Key("a".into()).starts_value());
        assert!(JsonEvent::StartObject.starts_value());
    }
}
