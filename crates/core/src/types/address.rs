//! Shipping addresses.

use serde::{Deserialize, Serialize};

use super::id::AddressId;
use super::validation::{FieldErrors, PHONE_PATTERN, POSTAL_CODE_PATTERN};

/// Kind of address, as stored by the user service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    #[default]
    Home,
    Work,
    Other,
}

/// A saved address as returned by the user service.
///
/// Whether an address is primary is decided server-side; setting one primary
/// clears the flag on the others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub address_id: AddressId,
    pub full_name: String,
    pub phone_number: String,
    pub street: String,
    pub area: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub address_type: AddressType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_address_type: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

/// Address form payload for create and update calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInput {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub address_type: AddressType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_address_type: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

impl AddressInput {
    /// Validate the form.
    ///
    /// Format checks run even on blank values, so an empty phone number ends
    /// up reported as invalid rather than missing.
    ///
    /// # Errors
    ///
    /// Returns every failing field with its message.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        errors.require("full_name", &self.full_name, "Name is required");
        errors.require("phone_number", &self.phone_number, "Phone number is required");
        if !PHONE_PATTERN.is_match(&self.phone_number) {
            errors.add("phone_number", "Invalid phone number");
        }
        errors.require("street", &self.street, "Street is required");
        errors.require("area", &self.area, "Area is required");
        errors.require("city", &self.city, "City is required");
        errors.require("state", &self.state, "State is required");
        errors.require("postal_code", &self.postal_code, "Postal code is required");
        errors.require("country", &self.country, "Country is required");
        if !POSTAL_CODE_PATTERN.is_match(&self.postal_code) {
            errors.add("postal_code", "Invalid postal code");
        }

        if self.address_type == AddressType::Other
            && self
                .other_address_type
                .as_deref()
                .is_none_or(|label| label.trim().is_empty())
        {
            errors.add("other_address_type", "Other address type is required");
        }

        errors.into_result()
    }
}

impl From<&Address> for AddressInput {
    fn from(address: &Address) -> Self {
        Self {
            full_name: address.full_name.clone(),
            phone_number: address.phone_number.clone(),
            street: address.street.clone(),
            area: address.area.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            postal_code: address.postal_code.clone(),
            country: address.country.clone(),
            address_type: address.address_type,
            other_address_type: address.other_address_type.clone(),
            is_primary: address.is_primary,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_input() -> AddressInput {
        AddressInput {
            full_name: "Asha Rao".to_string(),
            phone_number: "9876543210".to_string(),
            street: "12 MG Road".to_string(),
            area: "Indiranagar".to_string(),
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            postal_code: "560038".to_string(),
            country: "India".to_string(),
            address_type: AddressType::Home,
            other_address_type: None,
            is_primary: false,
        }
    }

    #[test]
    fn test_valid_address_passes() {
        assert!(valid_input().validate().is_ok());
    }

    #[test]
    fn test_rejects_malformed_phone() {
        for phone in [
            "987654321",
            "98765432101",
            "98765-4321",
            "abcdefghij",
            "९८७६५४३२१०",
        ] {
            let input = AddressInput {
                phone_number: phone.to_string(),
                ..valid_input()
            };
            let errors = input.validate().unwrap_err();
            assert_eq!(errors.get("phone_number"), Some("Invalid phone number"), "{phone}");
        }
    }

    #[test]
    fn test_rejects_malformed_postal_code() {
        for code in ["56003", "5600380", "56O038", "५६००३८"] {
            let input = AddressInput {
                postal_code: code.to_string(),
                ..valid_input()
            };
            let errors = input.validate().unwrap_err();
            assert_eq!(errors.get("postal_code"), Some("Invalid postal code"), "{code}");
        }
    }

    #[test]
    fn test_blank_phone_reports_invalid() {
        let input = AddressInput {
            phone_number: String::new(),
            ..valid_input()
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.get("phone_number"), Some("Invalid phone number"));
    }

    #[test]
    fn test_other_type_needs_label() {
        let input = AddressInput {
            address_type: AddressType::Other,
            other_address_type: Some("  ".to_string()),
            ..valid_input()
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.get("other_address_type").is_some());

        let input = AddressInput {
            address_type: AddressType::Other,
            other_address_type: Some("Parents".to_string()),
            ..valid_input()
        };
        assert!(input.validate().is_ok());
    }
}
