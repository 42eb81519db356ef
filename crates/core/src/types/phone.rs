//! Indian mobile numbers and postal pincodes.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// Nothing was entered.
    #[error("phone number is required")]
    Empty,
    /// Not exactly ten digits once separators and the country code are stripped.
    #[error("phone number must have 10 digits")]
    WrongLength,
    /// Mobile numbers start with 6, 7, 8 or 9.
    #[error("phone number must start with 6, 7, 8 or 9")]
    InvalidPrefix,
}

/// A 10-digit Indian mobile number, stored without country code.
///
/// Spaces, dashes and a leading `+91`/`91`/`0` are accepted on input.
///
/// ```
/// use freshcatch_core::Phone;
///
/// assert_eq!(Phone::parse("+91 98765-43210").unwrap().as_str(), "9876543210");
/// assert!(Phone::parse("5876543210").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    /// Parse and normalise a phone number.
    ///
    /// # Errors
    ///
    /// Returns a [`PhoneError`] describing the first problem found.
    pub fn parse(input: &str) -> Result<Self, PhoneError> {
        let digits: String = input
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
            .collect();
        if digits.is_empty() {
            return Err(PhoneError::Empty);
        }

        let digits = digits.strip_prefix('+').unwrap_or(&digits);
        let national = match digits.len() {
            12 => digits.strip_prefix("91"),
            11 => digits.strip_prefix('0'),
            _ => Some(digits),
        }
        .ok_or(PhoneError::WrongLength)?;

        if national.len() != 10 || !national.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PhoneError::WrongLength);
        }
        if !matches!(national.as_bytes().first(), Some(b'6'..=b'9')) {
            return Err(PhoneError::InvalidPrefix);
        }

        Ok(Self(national.to_owned()))
    }

    /// The ten national digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The number in international form without `+`, as used by `wa.me` links.
    #[must_use]
    pub fn international(&self) -> String {
        format!("91{}", self.0)
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Phone {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Phone> for String {
    fn from(phone: Phone) -> Self {
        phone.0
    }
}

/// Errors that can occur when parsing a [`Pincode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PincodeError {
    /// Not six ASCII digits.
    #[error("pincode must have 6 digits")]
    WrongLength,
    /// Pincodes never start with 0.
    #[error("pincode cannot start with 0")]
    LeadingZero,
}

/// A six-digit Indian postal code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pincode(String);

impl Pincode {
    /// Parse a pincode.
    ///
    /// # Errors
    ///
    /// Returns a [`PincodeError`] for anything other than six digits not
    /// starting with zero.
    pub fn parse(input: &str) -> Result<Self, PincodeError> {
        let input = input.trim();
        if input.len() != 6 || !input.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PincodeError::WrongLength);
        }
        if input.starts_with('0') {
            return Err(PincodeError::LeadingZero);
        }
        Ok(Self(input.to_owned()))
    }

    /// The six digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Pincode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Pincode {
    type Error = PincodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Pincode> for String {
    fn from(pincode: Pincode) -> Self {
        pincode.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_accepts_common_formats() {
        for input in ["9876543210", "+919876543210", "91 98765 43210", "09876543210", "98765-43210"] {
            assert_eq!(Phone::parse(input).unwrap().as_str(), "9876543210", "{input}");
        }
    }

    #[test]
    fn test_phone_leading_digit_must_be_six_to_nine() {
        assert_eq!(Phone::parse("5876543210"), Err(PhoneError::InvalidPrefix));
        assert!(Phone::parse("6000000000").is_ok());
    }

    #[test]
    fn test_phone_length() {
        assert_eq!(Phone::parse(""), Err(PhoneError::Empty));
        assert_eq!(Phone::parse("98765"), Err(PhoneError::WrongLength));
        assert_eq!(Phone::parse("98765432101"), Err(PhoneError::WrongLength));
        assert_eq!(Phone::parse("98765abcde"), Err(PhoneError::WrongLength));
    }

    #[test]
    fn test_phone_international() {
        assert_eq!(Phone::parse("9876543210").unwrap().international(), "919876543210");
    }

    #[test]
    fn test_pincode() {
        assert!(Pincode::parse("400001").is_ok());
        assert_eq!(Pincode::parse("40001"), Err(PincodeError::WrongLength));
        assert_eq!(Pincode::parse("40000a"), Err(PincodeError::WrongLength));
        assert_eq!(Pincode::parse("012345"), Err(PincodeError::LeadingZero));
    }
}
