//! Field-level validation errors.
//!
//! Forms collect every problem before rejecting so the UI can mark all bad
//! fields at once.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    /// An empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding a single message.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a message for `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    /// Run a parser and record its error under `field`.
    ///
    /// Returns the parsed value when it succeeded.
    pub fn check<T, E: fmt::Display>(&mut self, field: &str, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.add(field, err.to_string());
                None
            }
        }
    }

    /// Whether no field has an error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for `field`.
    #[must_use]
    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Names of fields with errors, sorted.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(value)` when empty, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns `self` when any field has an error.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_messages_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("phone", "phone number is required");
        errors.add("street", "street is required");
        errors.add("phone", "second problem");

        assert_eq!(errors.field("phone").len(), 2);
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["phone", "street"]);
        assert_eq!(
            errors.to_string(),
            "phone: phone number is required; phone: second problem; street: street is required"
        );
    }

    #[test]
    fn test_check_records_parse_errors() {
        let mut errors = ValidationErrors::new();
        let ok: Option<u8> = errors.check("a", "7".parse::<u8>());
        let bad: Option<u8> = errors.check("b", "x".parse::<u8>());
        assert_eq!(ok, Some(7));
        assert_eq!(bad, None);
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_serializes_as_map() {
        let errors = ValidationErrors::single("quantity", "quantity must be at least 1");
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!({"quantity": ["quantity must be at least 1"]})
        );
    }
}
