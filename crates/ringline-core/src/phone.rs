use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::config::Config;

static E164: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9]\d{9,14}$").expect("E.164 pattern compiles"));

/// A destination number in E.164 form (`+` followed by 10–15 digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// The number including the leading `+`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The number without the leading `+`, as the voice API expects it.
    pub fn digits(&self) -> &str {
        &self.0[1..]
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Converts user-supplied numbers to E.164.
///
/// Local numbers (leading `0`) take the configured country code.
#[derive(Debug, Clone)]
pub struct Normalizer {
    country_code: String,
}

impl Normalizer {
    #[must_use]
    pub fn new(country_code: impl Into<String>) -> Self {
        Self {
            country_code: country_code.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.default_country_code.clone())
    }

    /// Strip whitespace and hyphens, then coerce to a `+`-prefixed number.
    ///
    /// The result is not guaranteed to be valid; see [`Normalizer::validate`].
    pub fn normalize(&self, raw: &str) -> String {
        let compact: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();

        if let Some(local) = compact.strip_prefix('0') {
            format!("+{}{local}", self.country_code)
        } else if compact.starts_with('+') {
            compact
        } else {
            format!("+{compact}")
        }
    }

    /// Whether `raw` normalizes to a valid E.164 number.
    pub fn validate(&self, raw: &str) -> bool {
        self.parse(raw).is_some()
    }

    /// Normalize and validate in one step.
    pub fn parse(&self, raw: &str) -> Option<PhoneNumber> {
        let normalized = self.normalize(raw);
        E164.is_match(&normalized).then_some(PhoneNumber(normalized))
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_COUNTRY_CODE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_numbers_take_country_code() {
        let n = Normalizer::default();
        assert_eq!(n.normalize("09012345678"), "+819012345678");
        assert_eq!(n.normalize("090-1234-5678"), "+819012345678");
        assert_eq!(n.normalize("090 1234 5678"), "+819012345678");
        assert!(n.validate("09012345678"));
    }

    #[test]
    fn configured_country_code_is_used() {
        let n = Normalizer::new("44");
        assert_eq!(n.normalize("07700900123"), "+447700900123");
        assert!(n.validate("07700900123"));
    }

    #[test]
    fn plus_prefixed_numbers_are_kept() {
        let n = Normalizer::default();
        assert_eq!(n.normalize("+819012345678"), "+819012345678");
        assert_eq!(n.normalize("+1 415-555-0100"), "+14155550100");
        assert!(n.validate("+14155550100"));
    }

    #[test]
    fn fully_qualified_numbers_without_plus_are_accepted() {
        let n = Normalizer::default();
        assert_eq!(n.normalize("819012345678"), "+819012345678");
        assert!(n.validate("819012345678"));
    }

    #[test]
    fn digit_count_bounds() {
        let n = Normalizer::default();
        // 9 digits after `+`: too short
        assert!(!n.validate("+123456789"));
        // 10 and 15 digits: accepted
        assert!(n.validate("+1234567890"));
        assert!(n.validate("+123456789012345"));
        // 16 digits: too long
        assert!(!n.validate("+1234567890123456"));
    }

    #[test]
    fn local_format_validity_depends_on_length() {
        let n = Normalizer::default();
        // `0` + 8 digits -> +81 + 8 digits = 10 digits
        assert!(n.validate("012345678"));
        // `0` + 7 digits -> 9 digits
        assert!(!n.validate("01234567"));
    }

    #[test]
    fn garbage_is_rejected() {
        let n = Normalizer::default();
        assert!(!n.validate(""));
        assert!(!n.validate("abc"));
        assert!(!n.validate("+"));
        assert!(!n.validate("+0123456789"));
        assert!(!n.validate("12345"));
        assert!(!n.validate("+81-90-abcd-5678"));
    }

    #[test]
    fn parsed_number_exposes_digits() {
        let number = Normalizer::default().parse("090-1234-5678").unwrap();
        assert_eq!(number.as_str(), "+819012345678");
        assert_eq!(number.digits(), "819012345678");
        assert_eq!(number.to_string(), "+819012345678");
    }
}
