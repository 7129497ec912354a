use pure_rust_locales::{Locale, locale_match};

use crate::BindError;

/// Resolves a locale tag such as `de_DE`, `fr-FR` or `de`.
///
/// A bare language resolves to the region of the same name (`de` to `de_DE`).
pub(crate) fn parse_locale(tag: &str) -> Result<Locale, BindError> {
    let normalized = tag.trim().replace('-', "_");
    if let Ok(locale) = Locale::try_from(normalized.as_str()) {
        return Ok(locale);
    }
    if !normalized.is_empty() && !normalized.contains('_') {
        let regional = format!("{normalized}_{}", normalized.to_ascii_uppercase());
        if let Ok(locale) = Locale::try_from(regional.as_str()) {
            return Ok(locale);
        }
    }
    Err(BindError::configuration(format!("unknown locale `{tag}`")))
}

/// The decimal point and grouping separator of `locale`.
pub(crate) fn numeric_symbols(locale: Locale) -> (&'static str, &'static str) {
    (
        locale_match!(locale => LC_NUMERIC::DECIMAL_POINT),
        locale_match!(locale => LC_NUMERIC::THOUSANDS_SEP),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn tags_resolve_with_either_separator() {
        assert_eq!(parse_locale("de_DE").unwrap(), Locale::de_DE);
        assert_eq!(parse_locale("fr-FR").unwrap(), Locale::fr_FR);
        assert_eq!(parse_locale("de").unwrap(), Locale::de_DE);
    }

    #[test]
    fn unknown_tags_are_configuration_errors() {
        let err = parse_locale("xx_YY").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(parse_locale("").is_err());
    }

    #[test]
    fn german_symbols() {
        assert_eq!(numeric_symbols(Locale::de_DE), (",", "."));
        assert_eq!(numeric_symbols(Locale::en_US), (".", ","));
    }
}
