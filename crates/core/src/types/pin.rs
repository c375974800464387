//! Kid login PIN type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Pin`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PinError {
    /// The input is not exactly six characters.
    #[error("PIN must be exactly {expected} digits")]
    WrongLength {
        /// Required number of digits.
        expected: usize,
    },
    /// The input contains a non-digit character.
    #[error("PIN must contain only digits")]
    NonDigit,
}

/// A six-digit login PIN issued to a child by a parent.
///
/// PINs replace email/password authentication for kids. They are generated
/// server-side; this type only guards the shape before a login request goes
/// out, so a typo fails locally instead of as a backend 404.
///
/// ## Examples
///
/// ```
/// use kidsgpt_core::Pin;
///
/// assert!(Pin::parse("482916").is_ok());
/// assert!(Pin::parse("1234").is_err());   // too short
/// assert!(Pin::parse("12a456").is_err()); // non-digit
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Pin(String);

impl Pin {
    /// Number of digits in a PIN.
    pub const LENGTH: usize = 6;

    /// Parse a `Pin` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly six ASCII digits.
    pub fn parse(s: &str) -> Result<Self, PinError> {
        if s.len() != Self::LENGTH {
            return Err(PinError::WrongLength {
                expected: Self::LENGTH,
            });
        }

        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PinError::NonDigit);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the PIN as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Pin {
    type Err = PinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let pin = Pin::parse("123456").unwrap();
        assert_eq!(pin.as_str(), "123456");
    }

    #[test]
    fn test_parse_leading_zeros() {
        assert!(Pin::parse("000042").is_ok());
    }

    #[test]
    fn test_parse_wrong_length() {
        assert_eq!(
            Pin::parse("12345"),
            Err(PinError::WrongLength { expected: 6 })
        );
        assert_eq!(
            Pin::parse("1234567"),
            Err(PinError::WrongLength { expected: 6 })
        );
    }

    #[test]
    fn test_parse_non_digit() {
        assert_eq!(Pin::parse("12a456"), Err(PinError::NonDigit));
        // Multibyte input must not slip past the length check
        assert!(Pin::parse("12345é").is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let pin = Pin::parse("482916").unwrap();
        let json = serde_json::to_string(&pin).unwrap();
        assert_eq!(json, "\"482916\"");

        let parsed: Pin = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, pin);
    }
}
