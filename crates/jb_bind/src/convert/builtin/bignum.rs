use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use serde_json::Value;

use super::number::{number_value, numeric_text};
use crate::BindError;
use crate::convert::converter::invalid;
use crate::convert::{ConvertContext, ConverterRegistry, TypedConverter};

/// Arbitrary precision numbers, written as strings unless disabled.
///
/// Numbers keep their exact text both ways.
struct BigNumberConverter;

impl TypedConverter<BigInt> for BigNumberConverter {
    fn to_json(&self, value: &BigInt, cx: &ConvertContext) -> Result<Value, BindError> {
        let text = value.to_string();
        if cx.bigint_as_string() {
            Ok(Value::String(text))
        } else {
            number_value(&text, "BigInt")
        }
    }

    fn from_json(&self, json: &Value, _: &ConvertContext) -> Result<BigInt, BindError> {
        let text = numeric_text(json).ok_or_else(|| invalid::<BigInt>(json, "not a number"))?;
        text.parse()
            .map_err(|e: num_bigint::ParseBigIntError| invalid::<BigInt>(json, e.to_string()))
    }
}

impl TypedConverter<BigDecimal> for BigNumberConverter {
    fn to_json(&self, value: &BigDecimal, cx: &ConvertContext) -> Result<Value, BindError> {
        let text = value.to_string();
        if cx.bigdecimal_as_string() {
            Ok(Value::String(text))
        } else {
            number_value(&text, "BigDecimal")
        }
    }

    fn from_json(&self, json: &Value, _: &ConvertContext) -> Result<BigDecimal, BindError> {
        let text = numeric_text(json).ok_or_else(|| invalid::<BigDecimal>(json, "not a number"))?;
        text.parse()
            .map_err(|e: bigdecimal::ParseBigDecimalError| invalid::<BigDecimal>(json, e.to_string()))
    }
}

pub(super) fn install(registry: &mut ConverterRegistry) {
    registry.insert_typed::<BigInt, _>(BigNumberConverter);
    registry.insert_typed::<BigDecimal, _>(BigNumberConverter);
}
