//! Validated text primitives shared by the triage crates.
//!
//! Two kinds of text cross the system boundary:
//! - health card numbers, the directory key for every patient
//! - free text (names, medication, instructions) that must stay representable in the
//!   legacy `~`-delimited export format
//!
//! Both are validated once at construction so downstream code never re-checks them.

/// Delimiter reserved by the legacy flat-text export format.
pub const EXPORT_DELIMITER: char = '~';

/// Number of characters in a health card number.
pub const HEALTH_CARD_LENGTH: usize = 6;

/// Errors that can occur when creating validated text types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// A health card number was not exactly six ASCII digits.
    #[error("health card number must be exactly {HEALTH_CARD_LENGTH} digits, got {0:?}")]
    InvalidHealthCard(String),

    /// The text contained the export delimiter.
    #[error("text must not contain the '{EXPORT_DELIMITER}' character")]
    ContainsDelimiter,

    /// The text contained a line break where a single line is required.
    #[error("text must not contain a line break")]
    ContainsLineBreak,
}

/// A patient health card number: exactly [`HEALTH_CARD_LENGTH`] ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HealthCardNumber(String);

impl HealthCardNumber {
    /// Parses a health card number.
    ///
    /// The input is used verbatim: surrounding whitespace is not trimmed and counts
    /// towards the length.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::InvalidHealthCard`] if the input is not exactly six digits.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let input = input.as_ref();
        let ok = input.len() == HEALTH_CARD_LENGTH && input.bytes().all(|b| b.is_ascii_digit());
        if !ok {
            return Err(TextError::InvalidHealthCard(input.to_owned()));
        }
        Ok(Self(input.to_owned()))
    }

    /// Returns the number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HealthCardNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for HealthCardNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for HealthCardNumber {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for HealthCardNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for HealthCardNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        HealthCardNumber::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Free text that is safe to write into the `~`-delimited export format.
///
/// Empty text is allowed; the only guarantees are about reserved characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportText(String);

impl ExportText {
    /// Creates export-safe text that may span several lines.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::ContainsDelimiter`] if the input contains `~`.
    pub fn new(input: impl Into<String>) -> Result<Self, TextError> {
        let input = input.into();
        if input.contains(EXPORT_DELIMITER) {
            return Err(TextError::ContainsDelimiter);
        }
        Ok(Self(input))
    }

    /// Creates export-safe text restricted to a single line.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::ContainsDelimiter`] if the input contains `~`, or
    /// [`TextError::ContainsLineBreak`] if it contains `\n` or `\r`.
    pub fn single_line(input: impl Into<String>) -> Result<Self, TextError> {
        let text = Self::new(input)?;
        if text.0.contains(['\n', '\r']) {
            return Err(TextError::ContainsLineBreak);
        }
        Ok(text)
    }

    /// Wraps text read back from storage without re-validating it.
    pub fn unchecked(input: impl Into<String>) -> Self {
        Self(input.into())
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ExportText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ExportText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_card_accepts_six_digits() {
        let hcn = HealthCardNumber::parse("123456").expect("six digits should parse");
        assert_eq!(hcn.as_str(), "123456");
        assert_eq!(hcn.to_string(), "123456");
    }

    #[test]
    fn health_card_rejects_wrong_length() {
        for input in ["", "12345", "1234567", " 12345"] {
            let err = HealthCardNumber::parse(input).expect_err("should reject length");
            assert_eq!(err, TextError::InvalidHealthCard(input.to_string()));
        }
    }

    #[test]
    fn health_card_rejects_non_digits() {
        assert!(HealthCardNumber::parse("12a456").is_err());
        assert!(HealthCardNumber::parse("１２３４５６").is_err());
    }

    #[test]
    fn health_card_deserialize_validates() {
        let ok: HealthCardNumber = serde_json::from_str("\"654321\"").expect("valid");
        assert_eq!(ok.as_str(), "654321");

        let err = serde_json::from_str::<HealthCardNumber>("\"65432\"");
        assert!(err.is_err());
    }

    #[test]
    fn export_text_rejects_delimiter() {
        assert_eq!(ExportText::new("Jane~Doe"), Err(TextError::ContainsDelimiter));
        assert_eq!(
            ExportText::single_line("take ~ twice"),
            Err(TextError::ContainsDelimiter)
        );
    }

    #[test]
    fn export_text_line_breaks() {
        assert!(ExportText::new("two\nlines").is_ok());
        assert_eq!(
            ExportText::single_line("two\nlines"),
            Err(TextError::ContainsLineBreak)
        );
        assert_eq!(
            ExportText::single_line("carriage\rreturn"),
            Err(TextError::ContainsLineBreak)
        );
    }

    #[test]
    fn export_text_allows_empty() {
        let text = ExportText::single_line("").expect("empty text is allowed");
        assert_eq!(text.as_str(), "");
    }
}
