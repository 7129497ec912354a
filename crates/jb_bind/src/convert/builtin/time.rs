use core::any::Any;
use core::fmt::Write;
use std::borrow::Cow;
use std::time::{Duration, SystemTime};

use chrono::format::{DelayedFormat, Parsed, StrftimeItems};
use chrono::{
    DateTime, FixedOffset, Locale, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc,
};
use chrono_tz::Tz;
use serde_json::Value;

use crate::BindError;
use crate::convert::converter::invalid;
use crate::convert::{ConvertContext, ConverterRegistry, TypedConverter, parse_locale};
use crate::time::{OffsetTime, Period};

/// Date and time values: ISO-8601 text, or the configured pattern.
///
/// Under a pattern, month names, weekday names and the day period follow the
/// mapper locale in both directions.
struct TimeConverter;

fn text<T: Any>(json: &Value) -> Result<&str, BindError> {
    json.as_str()
        .ok_or_else(|| invalid::<T>(json, "expected a date/time string"))
}

fn render<T: Any>(formatted: DelayedFormat<StrftimeItems<'_>>) -> Result<Value, BindError> {
    let mut out = String::new();
    write!(out, "{formatted}")
        .map_err(|_| BindError::conversion("<value>", core::any::type_name::<T>(), "invalid date format"))?;
    Ok(Value::String(out))
}

fn parse_failed<T: Any>(json: &Value) -> impl FnOnce(chrono::ParseError) -> BindError + '_ {
    move |e| invalid::<T>(json, e.to_string())
}

// -----------------------------------------------------------------------------
// Locale

/// The mapper locale; unknown tags were rejected when the mapper was built.
fn locale(cx: &ConvertContext) -> Option<Locale> {
    cx.locale().and_then(|tag| parse_locale(tag).ok())
}

/// `pattern` over a local date and/or time, localized when a locale is set.
fn naive_format<'a>(
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    pattern: &'a str,
    cx: &ConvertContext,
) -> DelayedFormat<StrftimeItems<'a>> {
    match locale(cx) {
        Some(locale) => DelayedFormat::new_with_locale(
            date,
            time,
            StrftimeItems::new_with_locale(pattern, locale),
            locale,
        ),
        None => DelayedFormat::new(date, time, StrftimeItems::new(pattern)),
    }
}

/// Localized names paired with their `chrono` (English) spelling, longest first.
fn names(locale: Locale) -> Vec<(String, String)> {
    let mut names = Vec::new();
    let mut add = |date: Option<NaiveDate>, time: Option<NaiveTime>, directive: &str| {
        let items = StrftimeItems::new_with_locale(directive, locale);
        let local = DelayedFormat::new_with_locale(date, time, items, locale);
        let english = DelayedFormat::new(date, time, StrftimeItems::new(directive));
        let (local, english) = (local.to_string(), english.to_string());
        if !local.is_empty() && local != english {
            names.push((local, english));
        }
    };
    for month in 1..=12 {
        let date = NaiveDate::from_ymd_opt(2001, month, 1);
        add(date, None, "%B");
        add(date, None, "%b");
    }
    // 2001-01-01 is a Monday.
    for day in 1..=7 {
        let date = NaiveDate::from_ymd_opt(2001, 1, day);
        add(date, None, "%A");
        add(date, None, "%a");
    }
    for hour in [9, 21] {
        add(None, NaiveTime::from_hms_opt(hour, 0, 0), "%p");
    }
    names.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    names
}

/// Rewrites localized names in `text` to the spelling `chrono` parses.
fn delocalize<'a>(text: &'a str, cx: &ConvertContext) -> Cow<'a, str> {
    let (Some(_), Some(locale)) = (cx.date_format(), locale(cx)) else {
        return Cow::Borrowed(text);
    };
    let names = names(locale);
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    'scan: while let Some(c) = rest.chars().next() {
        for (local, english) in &names {
            if let Some(after) = rest.strip_prefix(local.as_str()) {
                out.push_str(english);
                rest = after;
                continue 'scan;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    Cow::Owned(out)
}

// -----------------------------------------------------------------------------
// Zoned date-times

impl TypedConverter<DateTime<Utc>> for TimeConverter {
    fn to_json(&self, value: &DateTime<Utc>, cx: &ConvertContext) -> Result<Value, BindError> {
        match (cx.date_format(), locale(cx)) {
            (Some(pattern), Some(locale)) => render::<DateTime<Utc>>(value.format_localized(pattern, locale)),
            (Some(pattern), None) => render::<DateTime<Utc>>(value.format(pattern)),
            (None, _) => Ok(Value::String(value.to_rfc3339_opts(SecondsFormat::AutoSi, true))),
        }
    }

    fn from_json(&self, json: &Value, cx: &ConvertContext) -> Result<DateTime<Utc>, BindError> {
        let text = delocalize(text::<DateTime<Utc>>(json)?, cx);
        match cx.date_format() {
            Some(pattern) => DateTime::parse_from_str(&text, pattern)
                .map(|dt| dt.with_timezone(&Utc))
                .or_else(|_| NaiveDateTime::parse_from_str(&text, pattern).map(|dt| dt.and_utc()))
                .map_err(parse_failed::<DateTime<Utc>>(json)),
            None => DateTime::parse_from_rfc3339(&text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(parse_failed::<DateTime<Utc>>(json)),
        }
    }
}

impl TypedConverter<DateTime<FixedOffset>> for TimeConverter {
    fn to_json(&self, value: &DateTime<FixedOffset>, cx: &ConvertContext) -> Result<Value, BindError> {
        match (cx.date_format(), locale(cx)) {
            (Some(pattern), Some(locale)) => {
                render::<DateTime<FixedOffset>>(value.format_localized(pattern, locale))
            }
            (Some(pattern), None) => render::<DateTime<FixedOffset>>(value.format(pattern)),
            (None, _) => Ok(Value::String(value.to_rfc3339_opts(SecondsFormat::AutoSi, true))),
        }
    }

    fn from_json(&self, json: &Value, cx: &ConvertContext) -> Result<DateTime<FixedOffset>, BindError> {
        let text = delocalize(text::<DateTime<FixedOffset>>(json)?, cx);
        match cx.date_format() {
            Some(pattern) => DateTime::parse_from_str(&text, pattern),
            None => DateTime::parse_from_rfc3339(&text),
        }
        .map_err(parse_failed::<DateTime<FixedOffset>>(json))
    }
}

/// Calendar values: `2015-01-01T01:01:00Z[UTC]`, the offset and then the zone id.
///
/// Text without a bracketed zone reads at UTC.
impl TypedConverter<DateTime<Tz>> for TimeConverter {
    fn to_json(&self, value: &DateTime<Tz>, cx: &ConvertContext) -> Result<Value, BindError> {
        match (cx.date_format(), locale(cx)) {
            (Some(pattern), Some(locale)) => render::<DateTime<Tz>>(value.format_localized(pattern, locale)),
            (Some(pattern), None) => render::<DateTime<Tz>>(value.format(pattern)),
            (None, _) => Ok(Value::String(format!(
                "{}[{}]",
                value.to_rfc3339_opts(SecondsFormat::AutoSi, true),
                value.timezone().name()
            ))),
        }
    }

    fn from_json(&self, json: &Value, cx: &ConvertContext) -> Result<DateTime<Tz>, BindError> {
        let text = text::<DateTime<Tz>>(json)?;
        if cx.date_format().is_some() {
            let utc = TypedConverter::<DateTime<Utc>>::from_json(self, json, cx)?;
            return Ok(utc.with_timezone(&Tz::UTC));
        }
        let (instant, zone) = match text.strip_suffix(']').and_then(|rest| rest.split_once('[')) {
            Some((instant, id)) => {
                let zone = id
                    .parse::<Tz>()
                    .map_err(|e| invalid::<DateTime<Tz>>(json, e.to_string()))?;
                (instant, zone)
            }
            None => (text, Tz::UTC),
        };
        DateTime::parse_from_rfc3339(instant)
            .map(|dt| dt.with_timezone(&zone))
            .map_err(parse_failed::<DateTime<Tz>>(json))
    }
}

// -----------------------------------------------------------------------------
// Local date-times

impl TypedConverter<NaiveDateTime> for TimeConverter {
    fn to_json(&self, value: &NaiveDateTime, cx: &ConvertContext) -> Result<Value, BindError> {
        let (date, time) = (Some(value.date()), Some(value.time()));
        match cx.date_format() {
            Some(pattern) => render::<NaiveDateTime>(naive_format(date, time, pattern, cx)),
            None => render::<NaiveDateTime>(value.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }

    fn from_json(&self, json: &Value, cx: &ConvertContext) -> Result<NaiveDateTime, BindError> {
        let text = delocalize(text::<NaiveDateTime>(json)?, cx);
        match cx.date_format() {
            Some(pattern) => NaiveDateTime::parse_from_str(&text, pattern),
            None => text.parse(),
        }
        .map_err(parse_failed::<NaiveDateTime>(json))
    }
}

impl TypedConverter<NaiveDate> for TimeConverter {
    fn to_json(&self, value: &NaiveDate, cx: &ConvertContext) -> Result<Value, BindError> {
        match cx.date_format() {
            Some(pattern) => render::<NaiveDate>(naive_format(Some(*value), None, pattern, cx)),
            None => render::<NaiveDate>(value.format("%Y-%m-%d")),
        }
    }

    fn from_json(&self, json: &Value, cx: &ConvertContext) -> Result<NaiveDate, BindError> {
        let text = delocalize(text::<NaiveDate>(json)?, cx);
        match cx.date_format() {
            Some(pattern) => NaiveDate::parse_from_str(&text, pattern),
            None => text.parse(),
        }
        .map_err(parse_failed::<NaiveDate>(json))
    }
}

impl TypedConverter<NaiveTime> for TimeConverter {
    fn to_json(&self, value: &NaiveTime, cx: &ConvertContext) -> Result<Value, BindError> {
        match cx.date_format() {
            Some(pattern) => render::<NaiveTime>(naive_format(None, Some(*value), pattern, cx)),
            None => render::<NaiveTime>(value.format("%H:%M:%S%.f")),
        }
    }

    fn from_json(&self, json: &Value, cx: &ConvertContext) -> Result<NaiveTime, BindError> {
        let text = delocalize(text::<NaiveTime>(json)?, cx);
        match cx.date_format() {
            Some(pattern) => NaiveTime::parse_from_str(&text, pattern),
            None => text.parse(),
        }
        .map_err(parse_failed::<NaiveTime>(json))
    }
}

// -----------------------------------------------------------------------------
// OffsetTime and Period

impl TypedConverter<OffsetTime> for TimeConverter {
    fn to_json(&self, value: &OffsetTime, cx: &ConvertContext) -> Result<Value, BindError> {
        let Some(pattern) = cx.date_format() else {
            return Ok(Value::String(value.to_string()));
        };
        let items = match locale(cx) {
            Some(locale) => StrftimeItems::new_with_locale(pattern, locale),
            None => StrftimeItems::new(pattern),
        };
        let formatted = match locale(cx) {
            Some(locale) => {
                DelayedFormat::new_with_offset_and_locale(None, Some(value.time), &value.offset, items, locale)
            }
            None => DelayedFormat::new_with_offset(None, Some(value.time), &value.offset, items),
        };
        render::<OffsetTime>(formatted)
    }

    fn from_json(&self, json: &Value, cx: &ConvertContext) -> Result<OffsetTime, BindError> {
        let text = delocalize(text::<OffsetTime>(json)?, cx);
        let Some(pattern) = cx.date_format() else {
            return text
                .parse()
                .map_err(|e: crate::time::ParseTimeError| invalid::<OffsetTime>(json, e.to_string()));
        };
        let mut parsed = Parsed::new();
        chrono::format::parse(&mut parsed, &text, StrftimeItems::new(pattern))
            .and_then(|()| Ok(OffsetTime::new(parsed.to_naive_time()?, parsed.to_fixed_offset()?)))
            .map_err(parse_failed::<OffsetTime>(json))
    }
}

/// ISO-8601 period text, `P1Y2M3D`.
impl TypedConverter<Period> for TimeConverter {
    #[inline]
    fn to_json(&self, value: &Period, _: &ConvertContext) -> Result<Value, BindError> {
        Ok(Value::String(value.to_string()))
    }

    fn from_json(&self, json: &Value, _: &ConvertContext) -> Result<Period, BindError> {
        text::<Period>(json)?
            .parse()
            .map_err(|e: crate::time::ParseTimeError| invalid::<Period>(json, e.to_string()))
    }
}

// -----------------------------------------------------------------------------
// SystemTime

/// Epoch milliseconds, or UTC text when a pattern is configured.
impl TypedConverter<SystemTime> for TimeConverter {
    fn to_json(&self, value: &SystemTime, cx: &ConvertContext) -> Result<Value, BindError> {
        let utc = DateTime::<Utc>::from(*value);
        match cx.date_format() {
            Some(_) => TypedConverter::<DateTime<Utc>>::to_json(self, &utc, cx),
            None => Ok(Value::from(utc.timestamp_millis())),
        }
    }

    fn from_json(&self, json: &Value, cx: &ConvertContext) -> Result<SystemTime, BindError> {
        let utc = match (json, cx.date_format()) {
            (Value::String(_), Some(_)) => TypedConverter::<DateTime<Utc>>::from_json(self, json, cx)?,
            _ => {
                let millis = super::number::parse_numeric::<i64>(json)?;
                DateTime::<Utc>::from_timestamp_millis(millis)
                    .ok_or_else(|| invalid::<SystemTime>(json, "out of range"))?
            }
        };
        Ok(SystemTime::from(utc))
    }
}

// -----------------------------------------------------------------------------
// Duration

/// ISO-8601 duration text, `PT8H6M12.345S`.
impl TypedConverter<Duration> for TimeConverter {
    fn to_json(&self, value: &Duration, _: &ConvertContext) -> Result<Value, BindError> {
        Ok(Value::String(format_duration(*value)))
    }

    fn from_json(&self, json: &Value, _: &ConvertContext) -> Result<Duration, BindError> {
        let text = text::<Duration>(json)?;
        parse_duration(text).ok_or_else(|| invalid::<Duration>(json, "not an ISO-8601 duration"))
    }
}

fn format_duration(value: Duration) -> String {
    let total = value.as_secs();
    let nanos = value.subsec_nanos();
    if total == 0 && nanos == 0 {
        return "PT0S".to_owned();
    }
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    let mut out = String::from("PT");
    if hours > 0 {
        out.push_str(&format!("{hours}H"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}M"));
    }
    if seconds > 0 || nanos > 0 {
        out.push_str(&seconds.to_string());
        if nanos > 0 {
            let fraction = format!("{nanos:09}");
            out.push('.');
            out.push_str(fraction.trim_end_matches('0'));
        }
        out.push('S');
    }
    out
}

/// Accepts `PnDTnHnMn.nS` with every part optional, in that order.
fn parse_duration(text: &str) -> Option<Duration> {
    let rest = text.strip_prefix(['P', 'p'])?;
    let (days, time) = match rest.find(['T', 't']) {
        Some(index) => (&rest[..index], Some(&rest[index + 1..])),
        None => (rest, None),
    };

    let mut secs: u64 = 0;
    if !days.is_empty() {
        let count: u64 = days.strip_suffix(['D', 'd'])?.parse().ok()?;
        secs = secs.checked_add(count.checked_mul(86_400)?)?;
    }

    let mut nanos = 0u32;
    if let Some(mut time) = time {
        if time.is_empty() {
            return None;
        }
        for (unit, scale) in [('H', 3600u64), ('M', 60), ('S', 1)] {
            let Some(index) = time.find([unit, unit.to_ascii_lowercase()]) else {
                continue;
            };
            let number = &time[..index];
            time = &time[index + 1..];
            match number.split_once('.') {
                Some((whole, fraction)) if unit == 'S' => {
                    secs = secs.checked_add(whole.parse().ok()?)?;
                    if fraction.is_empty() || fraction.len() > 9 {
                        return None;
                    }
                    nanos = format!("{fraction:0<9}").parse().ok()?;
                }
                _ => {
                    let count: u64 = number.parse().ok()?;
                    secs = secs.checked_add(count.checked_mul(scale)?)?;
                }
            }
        }
        if !time.is_empty() {
            return None;
        }
    }
    Some(Duration::new(secs, nanos))
}

pub(super) fn install(registry: &mut ConverterRegistry) {
    registry.insert_typed::<DateTime<Utc>, _>(TimeConverter);
    registry.insert_typed::<DateTime<FixedOffset>, _>(TimeConverter);
    registry.insert_typed::<DateTime<Tz>, _>(TimeConverter);
    registry.insert_typed::<NaiveDateTime, _>(TimeConverter);
    registry.insert_typed::<NaiveDate, _>(TimeConverter);
    registry.insert_typed::<NaiveTime, _>(TimeConverter);
    registry.insert_typed::<SystemTime, _>(TimeConverter);
    registry.insert_typed::<Duration, _>(TimeConverter);
    registry.insert_typed::<OffsetTime, _>(TimeConverter);
    registry.insert_typed::<Period, _>(TimeConverter);
}

/// Whether `pattern` is a valid strftime pattern.
pub(crate) fn is_valid_pattern(pattern: &str) -> bool {
    StrftimeItems::new(pattern).all(|item| !matches!(item, chrono::format::Item::Error))
}
