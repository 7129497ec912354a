use chrono::FixedOffset;
use chrono_tz::Tz;
use serde_json::Value;

use crate::BindError;
use crate::convert::converter::invalid;
use crate::convert::{ConvertContext, ConverterRegistry, TypedConverter};

/// Zone ids (`Europe/Paris`) and offsets (`Z`, `+02:00`).
struct ZoneConverter;

impl TypedConverter<Tz> for ZoneConverter {
    #[inline]
    fn to_json(&self, value: &Tz, _: &ConvertContext) -> Result<Value, BindError> {
        Ok(Value::String(value.name().to_owned()))
    }

    fn from_json(&self, json: &Value, _: &ConvertContext) -> Result<Tz, BindError> {
        let text = json
            .as_str()
            .ok_or_else(|| invalid::<Tz>(json, "expected a zone id"))?;
        text.parse::<Tz>()
            .map_err(|e| invalid::<Tz>(json, e.to_string()))
    }
}

impl TypedConverter<FixedOffset> for ZoneConverter {
    fn to_json(&self, value: &FixedOffset, _: &ConvertContext) -> Result<Value, BindError> {
        Ok(Value::String(format_offset(value.local_minus_utc())))
    }

    fn from_json(&self, json: &Value, _: &ConvertContext) -> Result<FixedOffset, BindError> {
        json.as_str()
            .and_then(parse_offset)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| invalid::<FixedOffset>(json, "expected `Z` or `+HH:MM`"))
    }
}

pub(crate) fn format_offset(seconds: i32) -> String {
    if seconds == 0 {
        return "Z".to_owned();
    }
    let sign = if seconds < 0 { '-' } else { '+' };
    let abs = seconds.unsigned_abs();
    let (hours, minutes, secs) = (abs / 3600, (abs % 3600) / 60, abs % 60);
    if secs == 0 {
        format!("{sign}{hours:02}:{minutes:02}")
    } else {
        format!("{sign}{hours:02}:{minutes:02}:{secs:02}")
    }
}

/// `Z`, `±HH`, `±HHMM`, `±HH:MM` or `±HH:MM:SS`, in seconds east of UTC.
pub(crate) fn parse_offset(text: &str) -> Option<i32> {
    if text.eq_ignore_ascii_case("z") {
        return Some(0);
    }
    let sign = match text.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let digits: String = text[1..].chars().filter(|c| *c != ':').collect();
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let field = |range: core::ops::Range<usize>| digits.get(range).and_then(|s| s.parse::<i32>().ok());
    let (hours, minutes, secs) = match digits.len() {
        2 => (field(0..2)?, 0, 0),
        4 => (field(0..2)?, field(2..4)?, 0),
        6 => (field(0..2)?, field(2..4)?, field(4..6)?),
        _ => return None,
    };
    if minutes > 59 || secs > 59 {
        return None;
    }
    Some(sign * (hours * 3600 + minutes * 60 + secs))
}

pub(super) fn install(registry: &mut ConverterRegistry) {
    registry.insert_typed::<Tz, _>(ZoneConverter);
    registry.insert_typed::<FixedOffset, _>(ZoneConverter);
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn zone_ids() {
        let cx = ConvertContext::default();
        let tz = TypedConverter::<Tz>::from_json(&ZoneConverter, &json!("Europe/Paris"), &cx).unwrap();
        assert_eq!(tz, Tz::Europe__Paris);
        assert_eq!(ZoneConverter.to_json(&Tz::UTC, &cx).unwrap(), json!("UTC"));
        assert!(TypedConverter::<Tz>::from_json(&ZoneConverter, &json!("Mars/Base"), &cx).is_err());
    }

    #[test]
    fn offsets() {
        let cx = ConvertContext::default();
        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(ZoneConverter.to_json(&utc, &cx).unwrap(), json!("Z"));
        let west = FixedOffset::west_opt(5 * 3600 + 30 * 60).unwrap();
        assert_eq!(ZoneConverter.to_json(&west, &cx).unwrap(), json!("-05:30"));

        for (text, seconds) in [("Z", 0), ("+02:00", 7200), ("-0530", -19800), ("+01", 3600)] {
            let offset =
                TypedConverter::<FixedOffset>::from_json(&ZoneConverter, &json!(text), &cx).unwrap();
            assert_eq!(offset.local_minus_utc(), seconds, "{text}");
        }
        assert!(TypedConverter::<FixedOffset>::from_json(&ZoneConverter, &json!("02:00"), &cx).is_err());
        assert!(TypedConverter::<FixedOffset>::from_json(&ZoneConverter, &json!("+02:75"), &cx).is_err());
    }
}
