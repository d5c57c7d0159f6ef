//! Field-level validation results shared by the form inputs.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Ten ASCII digits.
pub static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("static regex"));

/// Six ASCII digits.
pub static POSTAL_CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{6}$").expect("static regex"));

/// Stock keeping unit: letters, digits, hyphen and underscore.
pub static SKU_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static regex"));

/// Error messages keyed by form field name.
///
/// Nested fields use a path such as `variants[1].sku`. Adding a second
/// message for the same field replaces the first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Create an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    /// Record `message` for `field` when `value` is blank.
    ///
    /// Returns `true` when the value was blank.
    pub fn require(&mut self, field: &str, value: &str, message: &str) -> bool {
        if value.trim().is_empty() {
            self.add(field, message);
            return true;
        }
        false
    }

    /// Message recorded for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Whether any field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when no field failed, otherwise the collected errors.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl std::error::Error for FieldErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_later_message_replaces_earlier() {
        let mut errors = FieldErrors::new();
        errors.add("phone_number", "Phone number is required");
        errors.add("phone_number", "Invalid phone number");
        assert_eq!(errors.get("phone_number"), Some("Invalid phone number"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_require_blank() {
        let mut errors = FieldErrors::new();
        assert!(errors.require("city", "   ", "City is required"));
        assert!(!errors.require("state", "KA", "State is required"));
        assert_eq!(errors.to_string(), "city: City is required");
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_patterns() {
        assert!(PHONE_PATTERN.is_match("9876543210"));
        assert!(!PHONE_PATTERN.is_match("98765 43210"));
        assert!(POSTAL_CODE_PATTERN.is_match("560001"));
        assert!(!POSTAL_CODE_PATTERN.is_match("5600011"));
        assert!(!PHONE_PATTERN.is_match("९८७६५४३२१०"));
        assert!(!POSTAL_CODE_PATTERN.is_match("५६००३८"));
        assert!(SKU_PATTERN.is_match("TSHIRT-blue_01"));
        assert!(!SKU_PATTERN.is_match("tshirt blue"));
    }
}
