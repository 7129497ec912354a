use serde_json::Value;

use crate::BindError;
use crate::convert::converter::invalid;
use crate::convert::{ConvertContext, ConverterRegistry, TypedConverter};

/// Strings accept any JSON scalar on read.
struct StringConverter;

impl TypedConverter<String> for StringConverter {
    #[inline]
    fn to_json(&self, value: &String, _: &ConvertContext) -> Result<Value, BindError> {
        Ok(Value::String(value.clone()))
    }

    fn from_json(&self, json: &Value, _: &ConvertContext) -> Result<String, BindError> {
        match json {
            Value::String(text) => Ok(text.clone()),
            Value::Number(number) => Ok(number.to_string()),
            Value::Bool(flag) => Ok(flag.to_string()),
            _ => Err(invalid::<String>(json, "not a scalar")),
        }
    }
}

struct CharConverter;

impl TypedConverter<char> for CharConverter {
    #[inline]
    fn to_json(&self, value: &char, _: &ConvertContext) -> Result<Value, BindError> {
        Ok(Value::String(value.to_string()))
    }

    fn from_json(&self, json: &Value, _: &ConvertContext) -> Result<char, BindError> {
        let text = json
            .as_str()
            .ok_or_else(|| invalid::<char>(json, "not a string"))?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(invalid::<char>(json, "expected exactly one character")),
        }
    }
}

struct BoolConverter;

impl TypedConverter<bool> for BoolConverter {
    #[inline]
    fn to_json(&self, value: &bool, _: &ConvertContext) -> Result<Value, BindError> {
        Ok(Value::Bool(*value))
    }

    fn from_json(&self, json: &Value, _: &ConvertContext) -> Result<bool, BindError> {
        match json {
            Value::Bool(flag) => Ok(*flag),
            Value::String(text) => text
                .trim()
                .parse()
                .map_err(|_| invalid::<bool>(json, "expected `true` or `false`")),
            _ => Err(invalid::<bool>(json, "not a boolean")),
        }
    }
}

pub(super) fn install(registry: &mut ConverterRegistry) {
    registry.insert_typed::<String, _>(StringConverter);
    registry.insert_typed::<char, _>(CharConverter);
    registry.insert_typed::<bool, _>(BoolConverter);
}
