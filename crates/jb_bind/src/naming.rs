//! Naming strategies and attribute ordering.
//!
//! A [`NamingStrategy`] maps a property identifier to its wire name. It is a
//! pure function of the identifier: the same input always yields the same
//! name, whatever the other properties of the class are.
//!
//! An [`AttributeOrder`] sorts written properties by wire name. Without one,
//! declaration order is kept. Ordering never affects reading.

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;
use std::sync::Arc;

use crate::BindError;

// -----------------------------------------------------------------------------
// NamingStrategy

/// Translation from property identifier to wire name.
///
/// # Examples
///
/// ```
/// use jb_bind::naming::NamingStrategy;
///
/// assert_eq!(NamingStrategy::LowerCaseWithDashes.translate("lowerDash"), "lower-dash");
/// assert_eq!(NamingStrategy::UpperCamelCaseWithSpaces.translate("fooBar"), "Foo Bar");
///
/// let custom = NamingStrategy::custom(|name| name.to_uppercase());
/// assert_eq!(custom.translate("id"), "ID");
/// ```
#[derive(Clone, Default)]
pub enum NamingStrategy {
    #[default]
    Identity,
    /// Identity on write, case-insensitive key matching on read.
    CaseInsensitive,
    LowerCaseWithDashes,
    LowerCaseWithUnderscores,
    UpperCamelCase,
    UpperCamelCaseWithSpaces,
    Custom(Arc<dyn Fn(&str) -> String + Send + Sync>),
}

impl NamingStrategy {
    pub fn custom<F>(translate: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(translate))
    }

    pub fn translate(&self, name: &str) -> String {
        match self {
            Self::Identity | Self::CaseInsensitive => name.to_owned(),
            Self::LowerCaseWithDashes => lower_with_separator(name, '-'),
            Self::LowerCaseWithUnderscores => lower_with_separator(name, '_'),
            Self::UpperCamelCase => upper_first(name),
            Self::UpperCamelCaseWithSpaces => upper_first(&spaced(name)),
            Self::Custom(translate) => translate(name),
        }
    }

    #[inline]
    pub fn is_case_insensitive(&self) -> bool {
        matches!(self, Self::CaseInsensitive)
    }
}

impl fmt::Debug for NamingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.pad("Identity"),
            Self::CaseInsensitive => f.pad("CaseInsensitive"),
            Self::LowerCaseWithDashes => f.pad("LowerCaseWithDashes"),
            Self::LowerCaseWithUnderscores => f.pad("LowerCaseWithUnderscores"),
            Self::UpperCamelCase => f.pad("UpperCamelCase"),
            Self::UpperCamelCaseWithSpaces => f.pad("UpperCamelCaseWithSpaces"),
            Self::Custom(_) => f.pad("Custom(..)"),
        }
    }
}

/// Accepts both the kebab-case names (`lower-case-with-dashes`) and the
/// constant names (`LOWER_CASE_WITH_DASHES`).
impl FromStr for NamingStrategy {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('_', "-");
        match key.as_str() {
            "identity" => Ok(Self::Identity),
            "case-insensitive" => Ok(Self::CaseInsensitive),
            "lower-case-with-dashes" => Ok(Self::LowerCaseWithDashes),
            "lower-case-with-underscores" => Ok(Self::LowerCaseWithUnderscores),
            "upper-camel-case" => Ok(Self::UpperCamelCase),
            "upper-camel-case-with-spaces" => Ok(Self::UpperCamelCaseWithSpaces),
            _ => Err(BindError::configuration(format!(
                "unknown naming strategy `{s}`"
            ))),
        }
    }
}

fn lower_with_separator(name: &str, separator: char) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (index, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if index > 0 && !out.ends_with(separator) {
                out.push(separator);
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn spaced(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (index, c) in name.chars().enumerate() {
        if index > 0 && c.is_uppercase() && !out.ends_with(' ') {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// -----------------------------------------------------------------------------
// AttributeOrder

type Comparator = Arc<dyn Fn(&str, &str) -> Ordering + Send + Sync>;

/// Comparator over wire names fixing the order of written properties.
#[derive(Clone)]
pub struct AttributeOrder(Comparator);

impl AttributeOrder {
    pub fn lexicographic() -> Self {
        Self(Arc::new(|a: &str, b: &str| a.cmp(b)))
    }

    pub fn reverse() -> Self {
        Self(Arc::new(|a: &str, b: &str| b.cmp(a)))
    }

    pub fn custom<F>(compare: F) -> Self
    where
        F: Fn(&str, &str) -> Ordering + Send + Sync + 'static,
    {
        Self(Arc::new(compare))
    }

    #[inline]
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        (self.0)(a, b)
    }
}

impl fmt::Debug for AttributeOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AttributeOrder(..)")
    }
}

impl FromStr for AttributeOrder {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lexicographic" | "lexicographical" => Ok(Self::lexicographic()),
            "reverse" => Ok(Self::reverse()),
            _ => Err(BindError::configuration(format!(
                "unknown attribute order `{s}`"
            ))),
        }
    }
}
