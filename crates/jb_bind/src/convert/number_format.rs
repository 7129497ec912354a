use core::any::Any;
use std::sync::Arc;

use pure_rust_locales::Locale;
use serde_json::Value;

use crate::BindError;
use crate::convert::converter::invalid;
use crate::convert::locale::{numeric_symbols, parse_locale};
use crate::convert::{ConvertContext, Converter, TypedConverter, typed};
use crate::info::Type;

// -----------------------------------------------------------------------------
// NumberFormat

/// A decimal pattern such as `#,##0.0##`, applied to one numeric property.
///
/// The pattern is `prefix integer[.fraction] suffix`:
///
/// - `0` is a mandatory digit, `#` an optional one;
/// - `,` in the integer part sets the grouping size (digits after the last comma);
/// - the fraction keeps at least as many digits as it has `0`s and at most
///   as many as it has characters, rounding half to even;
/// - any other leading or trailing text is copied verbatim.
///
/// Decimal and grouping symbols come from the format's locale, else from the
/// mapper locale, else `.` and `,`. Formatted values are JSON strings; reading
/// accepts the same text as well as plain JSON numbers.
///
/// # Examples
///
/// ```
/// use jb_bind::convert::NumberFormat;
///
/// let format = NumberFormat::new("#,##0.0##", Some("de_DE")).unwrap();
/// assert_eq!(format.format_decimal("123456.8", None), "123.456,8");
/// assert_eq!(format.parse_decimal("123.456,8", None).as_deref(), Some("123456.8"));
/// ```
#[derive(Debug, Clone)]
pub struct NumberFormat {
    pattern: String,
    prefix: String,
    suffix: String,
    min_integer: usize,
    grouping: usize,
    min_fraction: usize,
    max_fraction: usize,
    locale: Option<Locale>,
}

impl NumberFormat {
    /// Parses `pattern`; `locale` must be a known tag when given.
    pub fn new(pattern: &str, locale: Option<&str>) -> Result<Self, BindError> {
        let bad = |reason: &str| BindError::configuration(format!("invalid number format `{pattern}`: {reason}"));

        let is_body = |c: char| matches!(c, '0' | '#' | ',' | '.');
        let start = pattern.find(is_body).ok_or_else(|| bad("no digits"))?;
        let end = pattern
            .rfind(is_body)
            .map_or(start, |index| index + 1);
        let body = &pattern[start..end];

        let (integer, fraction) = match body.split_once('.') {
            Some((integer, fraction)) => (integer, fraction),
            None => (body, ""),
        };
        if fraction.contains(['.', ',']) {
            return Err(bad("misplaced separator in the fraction"));
        }
        if fraction.trim_start_matches('0').contains('0') {
            return Err(bad("`0` after `#` in the fraction"));
        }
        let digits = integer.replace(',', "");
        if digits.trim_start_matches('#').contains('#') {
            return Err(bad("`#` after `0` in the integer part"));
        }
        if digits.is_empty() && fraction.is_empty() {
            return Err(bad("no digits"));
        }
        let grouping = match integer.rfind(',') {
            Some(index) => {
                let size = integer.len() - index - 1;
                if size == 0 {
                    return Err(bad("empty grouping"));
                }
                size
            }
            None => 0,
        };

        Ok(Self {
            pattern: pattern.to_owned(),
            prefix: pattern[..start].to_owned(),
            suffix: pattern[end..].to_owned(),
            min_integer: digits.matches('0').count(),
            grouping,
            min_fraction: fraction.matches('0').count(),
            max_fraction: fraction.len(),
            locale: locale.map(parse_locale).transpose()?,
        })
    }

    #[inline]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn symbols(&self, fallback: Option<&str>) -> (&'static str, &'static str) {
        self.locale
            .or_else(|| fallback.and_then(|tag| parse_locale(tag).ok()))
            .map_or((".", ","), numeric_symbols)
    }

    /// Lays out plain decimal text (`-1234.5`) per the pattern.
    ///
    /// `fallback` is the locale tag used when the format has none.
    pub fn format_decimal(&self, plain: &str, fallback: Option<&str>) -> String {
        let (decimal, group) = self.symbols(fallback);
        let (negative, digits) = match plain.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, plain),
        };
        let (integer, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        let (integer, mut fraction) = round_half_even(integer, fraction, self.max_fraction);

        while fraction.len() > self.min_fraction && fraction.ends_with('0') {
            fraction.pop();
        }
        while fraction.len() < self.min_fraction {
            fraction.push('0');
        }
        let mut integer = integer.trim_start_matches('0').to_owned();
        while integer.len() < self.min_integer {
            integer.insert(0, '0');
        }
        let zero = !integer.chars().chain(fraction.chars()).any(|c| c != '0');

        let mut out = self.prefix.clone();
        if negative && !zero {
            out.push('-');
        }
        for (index, digit) in integer.chars().enumerate() {
            let remaining = integer.len() - index;
            if index > 0 && self.grouping > 0 && remaining % self.grouping == 0 {
                out.push_str(group);
            }
            out.push(digit);
        }
        if !fraction.is_empty() {
            out.push_str(decimal);
            out.push_str(&fraction);
        }
        out.push_str(&self.suffix);
        out
    }

    /// Reads text laid out per the pattern back to plain decimal text.
    pub fn parse_decimal(&self, text: &str, fallback: Option<&str>) -> Option<String> {
        let (decimal, group) = self.symbols(fallback);
        let text = text.trim();
        let text = text.strip_prefix(self.prefix.as_str()).unwrap_or(text);
        let text = text.strip_suffix(self.suffix.as_str()).unwrap_or(text);
        let (negative, text) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let text = if group.is_empty() {
            text.to_owned()
        } else {
            text.replace(group, "")
        };
        let (integer, fraction) = text.split_once(decimal).unwrap_or((text.as_str(), ""));
        let numeric = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !numeric(integer) || !numeric(fraction) || (integer.is_empty() && fraction.is_empty()) {
            return None;
        }

        let mut plain = String::with_capacity(text.len() + 2);
        if negative {
            plain.push('-');
        }
        plain.push_str(if integer.is_empty() { "0" } else { integer });
        if !fraction.is_empty() {
            plain.push('.');
            plain.push_str(fraction);
        }
        Some(plain)
    }

    /// A converter applying this format to values of `ty`, if numeric.
    pub(crate) fn converter_for(&self, ty: &Type) -> Option<Arc<dyn Converter>> {
        macro_rules! select {
            ($($ty:ty),+) => {
                $(
                    if ty.is::<$ty>() {
                        return Some(typed::<$ty, _>(Formatted(self.clone())));
                    }
                )+
            };
        }
        select!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);
        None
    }
}

/// Rounds `integer.fraction` to `scale` fraction digits, half to even.
fn round_half_even(integer: &str, fraction: &str, scale: usize) -> (String, String) {
    if fraction.len() <= scale {
        return (integer.to_owned(), fraction.to_owned());
    }
    let (kept, dropped) = fraction.split_at(scale);
    let mut digits: Vec<u8> = integer.bytes().chain(kept.bytes()).collect();

    let first = dropped.as_bytes()[0];
    let tail_nonzero = dropped.bytes().skip(1).any(|b| b != b'0');
    let last_odd = digits.last().is_some_and(|d| (d - b'0') % 2 == 1);
    let up = first > b'5' || (first == b'5' && (tail_nonzero || last_odd));

    if up {
        let mut index = digits.len();
        loop {
            if index == 0 {
                digits.insert(0, b'1');
                break;
            }
            index -= 1;
            if digits[index] == b'9' {
                digits[index] = b'0';
            } else {
                digits[index] += 1;
                break;
            }
        }
    }

    let split = digits.len() - scale;
    let text = String::from_utf8_lossy(&digits);
    (text[..split].to_owned(), text[split..].to_owned())
}

// -----------------------------------------------------------------------------
// Formatted

struct Formatted(NumberFormat);

trait Decimal: Any + Sized {
    fn plain(&self) -> Option<String>;

    fn from_plain(text: &str) -> Option<Self>;
}

macro_rules! integer_decimals {
    ($($ty:ty),+) => {
        $(
            impl Decimal for $ty {
                fn plain(&self) -> Option<String> {
                    Some(self.to_string())
                }

                fn from_plain(text: &str) -> Option<Self> {
                    let (integer, fraction) = text.split_once('.').unwrap_or((text, ""));
                    if fraction.bytes().any(|b| b != b'0') {
                        return None;
                    }
                    integer.parse().ok()
                }
            }
        )+
    };
}

integer_decimals!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! float_decimals {
    ($($ty:ty),+) => {
        $(
            impl Decimal for $ty {
                // Display never uses exponent notation.
                fn plain(&self) -> Option<String> {
                    self.is_finite().then(|| self.to_string())
                }

                fn from_plain(text: &str) -> Option<Self> {
                    text.parse().ok()
                }
            }
        )+
    };
}

float_decimals!(f32, f64);

impl<T: Decimal> TypedConverter<T> for Formatted {
    fn to_json(&self, value: &T, cx: &ConvertContext) -> Result<Value, BindError> {
        let plain = value.plain().ok_or_else(|| {
            BindError::conversion("<value>", core::any::type_name::<T>(), "not a finite number")
        })?;
        Ok(Value::String(self.0.format_decimal(&plain, cx.locale())))
    }

    fn from_json(&self, json: &Value, cx: &ConvertContext) -> Result<T, BindError> {
        let plain = match json {
            Value::String(text) => self.0.parse_decimal(text, cx.locale()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        };
        plain
            .as_deref()
            .and_then(T::from_plain)
            .ok_or_else(|| invalid::<T>(json, format!("does not match number format `{}`", self.0.pattern)))
    }
}
