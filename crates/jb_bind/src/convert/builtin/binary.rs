use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use serde_json::Value;

use crate::BindError;
use crate::convert::converter::invalid;
use crate::convert::{BinaryStrategy, ConvertContext, ConverterRegistry, TypedConverter};

/// `Vec<u8>` under the configured [`BinaryStrategy`].
///
/// On read, arrays of integers are accepted under every strategy.
struct BinaryConverter;

impl TypedConverter<Vec<u8>> for BinaryConverter {
    fn to_json(&self, value: &Vec<u8>, cx: &ConvertContext) -> Result<Value, BindError> {
        Ok(match cx.binary() {
            BinaryStrategy::Base64 => Value::String(STANDARD.encode(value)),
            BinaryStrategy::Base64Url => Value::String(URL_SAFE.encode(value)),
            BinaryStrategy::ByteArray => {
                Value::Array(value.iter().map(|b| Value::from(*b)).collect())
            }
        })
    }

    fn from_json(&self, json: &Value, cx: &ConvertContext) -> Result<Vec<u8>, BindError> {
        match json {
            Value::String(text) => {
                let decoded = match cx.binary() {
                    BinaryStrategy::Base64Url => URL_SAFE.decode(text),
                    BinaryStrategy::Base64 | BinaryStrategy::ByteArray => STANDARD.decode(text),
                };
                decoded.map_err(|e| invalid::<Vec<u8>>(json, format!("invalid base64: {e}")))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_u64()
                        .and_then(|b| u8::try_from(b).ok())
                        .ok_or_else(|| invalid::<Vec<u8>>(item, "not a byte"))
                })
                .collect(),
            _ => Err(invalid::<Vec<u8>>(json, "expected a string or an array of bytes")),
        }
    }
}

pub(super) fn install(registry: &mut ConverterRegistry) {
    registry.insert_typed::<Vec<u8>, _>(BinaryConverter);
}
