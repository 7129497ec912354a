use core::fmt;
use core::str::FromStr;

use crate::BindError;

// -----------------------------------------------------------------------------
// BinaryStrategy

/// How `Vec<u8>` values are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinaryStrategy {
    /// Standard alphabet, padded.
    #[default]
    Base64,
    /// URL-safe alphabet, padded.
    Base64Url,
    /// A JSON array of integers.
    ByteArray,
}

impl fmt::Display for BinaryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base64 => f.pad("base64"),
            Self::Base64Url => f.pad("base64-url"),
            Self::ByteArray => f.pad("byte-array"),
        }
    }
}

impl FromStr for BinaryStrategy {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "base64" => Ok(Self::Base64),
            "base64-url" => Ok(Self::Base64Url),
            "byte-array" | "byte" => Ok(Self::ByteArray),
            _ => Err(BindError::configuration(format!(
                "unknown binary data strategy `{s}`"
            ))),
        }
    }
}

// -----------------------------------------------------------------------------
// ConvertContext

/// Mapper settings visible to converters.
#[derive(Debug, Clone)]
pub struct ConvertContext {
    pub(crate) binary: BinaryStrategy,
    pub(crate) bigint_as_string: bool,
    pub(crate) bigdecimal_as_string: bool,
    pub(crate) date_format: Option<String>,
    pub(crate) locale: Option<String>,
}

impl Default for ConvertContext {
    fn default() -> Self {
        Self {
            binary: BinaryStrategy::Base64,
            bigint_as_string: true,
            bigdecimal_as_string: true,
            date_format: None,
            locale: None,
        }
    }
}

impl ConvertContext {
    #[inline]
    pub fn binary(&self) -> BinaryStrategy {
        self.binary
    }

    #[inline]
    pub fn bigint_as_string(&self) -> bool {
        self.bigint_as_string
    }

    #[inline]
    pub fn bigdecimal_as_string(&self) -> bool {
        self.bigdecimal_as_string
    }

    /// The `chrono` strftime pattern used for date/time values, if set.
    #[inline]
    pub fn date_format(&self) -> Option<&str> {
        self.date_format.as_deref()
    }

    /// The configured locale tag.
    ///
    /// Date converters use it for month and weekday names under a date
    /// pattern; number formats use it for their symbols when they carry no
    /// locale of their own.
    #[inline]
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_strategy_names() {
        for strategy in [
            BinaryStrategy::Base64,
            BinaryStrategy::Base64Url,
            BinaryStrategy::ByteArray,
        ] {
            assert_eq!(strategy.to_string().parse::<BinaryStrategy>().unwrap(), strategy);
        }
        assert_eq!("BASE64_URL".parse::<BinaryStrategy>().unwrap(), BinaryStrategy::Base64Url);
        assert!("hex".parse::<BinaryStrategy>().is_err());
    }
}
