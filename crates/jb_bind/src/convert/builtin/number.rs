use core::any::Any;
use core::fmt::Display;
use core::str::FromStr;
use std::borrow::Cow;

use serde_json::{Number, Value};

use crate::BindError;
use crate::convert::converter::invalid;
use crate::convert::{ConvertContext, ConverterRegistry, TypedConverter};

/// Integers and floats, accepting numeric strings on read.
struct NumberConverter;

/// The numeric text of a JSON number or string.
pub(super) fn numeric_text(json: &Value) -> Option<Cow<'_, str>> {
    match json {
        Value::Number(number) => Some(Cow::Owned(number.to_string())),
        Value::String(text) => Some(Cow::Borrowed(text.trim())),
        _ => None,
    }
}

/// Parses the numeric text of `json` as `T`.
pub(super) fn parse_numeric<T>(json: &Value) -> Result<T, BindError>
where
    T: FromStr + Any,
    T::Err: Display,
{
    let text = numeric_text(json).ok_or_else(|| invalid::<T>(json, "not a number"))?;
    text.parse::<T>().map_err(|e| invalid::<T>(json, e.to_string()))
}

/// A JSON number holding exactly `text`.
pub(super) fn number_value(text: &str, target: &'static str) -> Result<Value, BindError> {
    text.parse::<Number>()
        .map(Value::Number)
        .map_err(|e| BindError::conversion(text, target, e.to_string()))
}

macro_rules! integers {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl TypedConverter<$ty> for NumberConverter {
                #[inline]
                fn to_json(&self, value: &$ty, _: &ConvertContext) -> Result<Value, BindError> {
                    Ok(Value::Number(Number::from(*value)))
                }

                #[inline]
                fn from_json(&self, json: &Value, _: &ConvertContext) -> Result<$ty, BindError> {
                    parse_numeric::<$ty>(json)
                }
            }
        )+

        fn install_integers(registry: &mut ConverterRegistry) {
            $( registry.insert_typed::<$ty, _>(NumberConverter); )+
        }
    };
}

integers!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! wide_integers {
    ($($ty:ty),+) => {
        $(
            impl TypedConverter<$ty> for NumberConverter {
                fn to_json(&self, value: &$ty, _: &ConvertContext) -> Result<Value, BindError> {
                    number_value(&value.to_string(), stringify!($ty))
                }

                #[inline]
                fn from_json(&self, json: &Value, _: &ConvertContext) -> Result<$ty, BindError> {
                    parse_numeric::<$ty>(json)
                }
            }
        )+
    };
}

wide_integers!(i128, u128);

macro_rules! floats {
    ($($ty:ty),+) => {
        $(
            impl TypedConverter<$ty> for NumberConverter {
                // Shortest text that reads back as the same `$ty`.
                fn to_json(&self, value: &$ty, _: &ConvertContext) -> Result<Value, BindError> {
                    if !value.is_finite() {
                        return Err(BindError::conversion(
                            value.to_string(),
                            stringify!($ty),
                            "not a finite number",
                        ));
                    }
                    number_value(&format!("{value:?}"), stringify!($ty))
                }

                #[inline]
                fn from_json(&self, json: &Value, _: &ConvertContext) -> Result<$ty, BindError> {
                    parse_numeric::<$ty>(json)
                }
            }
        )+
    };
}

floats!(f32, f64);

pub(super) fn install(registry: &mut ConverterRegistry) {
    install_integers(registry);
    registry.insert_typed::<i128, _>(NumberConverter);
    registry.insert_typed::<u128, _>(NumberConverter);
    registry.insert_typed::<f32, _>(NumberConverter);
    registry.insert_typed::<f64, _>(NumberConverter);
}
