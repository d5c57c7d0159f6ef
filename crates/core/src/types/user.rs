//! User identity, roles and the account forms.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::UserId;
use super::validation::FieldErrors;

/// Role name that unlocks the seller product panel.
pub const SELLER_ROLE: &str = "seller";

/// Minimum password length accepted by signup and reset.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// One role-bound account of a user.
///
/// A person can hold several role accounts (buyer, seller); switching role
/// means logging in as the account's `username`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAccount {
    pub role: String,
    #[serde(default)]
    pub username: String,
}

/// The active role plus all roles the user holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RoleSet {
    #[serde(default)]
    pub active_role: Option<RoleAccount>,
    #[serde(default)]
    pub roles: Vec<RoleAccount>,
}

impl RoleSet {
    /// Name of the active role, if any.
    #[must_use]
    pub fn active(&self) -> Option<&str> {
        self.active_role.as_ref().map(|r| r.role.as_str())
    }

    /// Role accounts the user could switch to.
    pub fn switchable(&self) -> impl Iterator<Item = &RoleAccount> {
        let active = self.active();
        self.roles
            .iter()
            .filter(move |r| Some(r.role.as_str()) != active)
    }
}

/// Profile as returned by the user service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub role: RoleSet,
}

impl UserProfile {
    /// Whether the active role is the seller role.
    #[must_use]
    pub fn is_seller(&self) -> bool {
        self.role.active() == Some(SELLER_ROLE)
    }
}

/// Login form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub username: String,
}

impl LoginInput {
    /// A login needs a password and either an email or a username.
    ///
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.email.trim().is_empty() && self.username.trim().is_empty() {
            errors.add("email", "Email or username is required");
        }
        errors.require("password", &self.password, "Password is required");
        errors.into_result()
    }
}

/// Signup form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupInput {
    pub username: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing)]
    pub confirm_password: String,
}

impl SignupInput {
    /// Check the form in order and stop at the first failure.
    ///
    /// # Errors
    ///
    /// Returns a single-field error describing the first broken rule.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        let any_blank = [
            &self.username,
            &self.first_name,
            &self.email,
            &self.password,
            &self.confirm_password,
        ]
        .iter()
        .any(|v| v.is_empty());

        if any_blank {
            errors.add("form", "Please fill in all fields");
        } else if self.username.chars().count() < 3 {
            errors.add("username", "Username must be at least 3 characters long");
        } else if self.first_name.chars().count() < 2 {
            errors.add("first_name", "First name must be at least 2 characters long");
        } else if Email::parse(&self.email).is_err() {
            errors.add("email", "Invalid email address");
        } else if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add("password", "Password must be at least 6 characters long");
        } else if self.password != self.confirm_password {
            errors.add("confirm_password", "Passwords do not match");
        }

        errors.into_result()
    }
}

/// Profile edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl ProfileUpdate {
    /// Validate against the current profile.
    ///
    /// # Errors
    ///
    /// Returns required-field errors, or a `form` error when nothing changed.
    pub fn validate(&self, current: &UserProfile) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("first_name", &self.first_name, "First name is required");
        errors.require("last_name", &self.last_name, "Last name is required");
        if !errors.require("email", &self.email, "Email is required")
            && Email::parse(self.email.trim()).is_err()
        {
            errors.add("email", "Invalid email address");
        }

        if errors.is_empty()
            && self.first_name == current.first_name
            && self.last_name == current.last_name
            && self.email == current.email
        {
            errors.add("form", "No changes to update");
        }

        errors.into_result()
    }
}

/// New password form used with a reset token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PasswordResetInput {
    pub token: String,
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl PasswordResetInput {
    /// # Errors
    ///
    /// Returns the first failing rule.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.token.trim().is_empty() {
            errors.add("token", "Reset link is invalid or incomplete");
        } else if self.new_password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add("new_password", "Password must be at least 6 characters long");
        } else if self.new_password != self.confirm_password {
            errors.add("confirm_password", "Passwords do not match");
        }
        errors.into_result()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn signup() -> SignupInput {
        SignupInput {
            username: "asha".to_string(),
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            email: "asha@example.com".to_string(),
            password: "hunter22".to_string(),
            confirm_password: "hunter22".to_string(),
        }
    }

    fn profile() -> UserProfile {
        serde_json::from_value(serde_json::json!({
            "id": 9,
            "first_name": "Asha",
            "last_name": "Rao",
            "email": "asha@example.com",
            "role": {
                "active_role": {"role": "buyer", "username": "asha"},
                "roles": [
                    {"role": "buyer", "username": "asha"},
                    {"role": "seller", "username": "asha-shop"}
                ]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_signup_first_failure_wins() {
        assert!(signup().validate().is_ok());

        let short = SignupInput {
            username: "as".to_string(),
            password: "x".to_string(),
            ..signup()
        };
        let errors = short.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.get("username").is_some());
    }

    #[test]
    fn test_signup_rejects_mismatched_passwords() {
        let input = SignupInput {
            confirm_password: "hunter23".to_string(),
            ..signup()
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.get("confirm_password"), Some("Passwords do not match"));
    }

    #[test]
    fn test_signup_rejects_bad_email() {
        let input = SignupInput {
            email: "asha@example".to_string(),
            ..signup()
        };
        assert_eq!(
            input.validate().unwrap_err().get("email"),
            Some("Invalid email address")
        );
    }

    #[test]
    fn test_confirm_password_is_not_sent_upstream() {
        let json = serde_json::to_value(signup()).unwrap();
        assert!(json.get("confirm_password").is_none());
    }

    #[test]
    fn test_role_switching_candidates() {
        let profile = profile();
        assert!(!profile.is_seller());
        let targets: Vec<_> = profile.role.switchable().map(|r| r.username.as_str()).collect();
        assert_eq!(targets, vec!["asha-shop"]);
    }

    #[test]
    fn test_profile_update_requires_change() {
        let current = profile();
        let same = ProfileUpdate {
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            email: "asha@example.com".to_string(),
        };
        assert_eq!(
            same.validate(&current).unwrap_err().get("form"),
            Some("No changes to update")
        );

        let changed = ProfileUpdate {
            last_name: "Rao-Menon".to_string(),
            ..same
        };
        assert!(changed.validate(&current).is_ok());
    }

    #[test]
    fn test_password_reset_rules() {
        let input = PasswordResetInput {
            token: "tok".to_string(),
            new_password: "abcdef".to_string(),
            confirm_password: "abcdef".to_string(),
        };
        assert!(input.validate().is_ok());

        let short = PasswordResetInput {
            new_password: "abc".to_string(),
            confirm_password: "abc".to_string(),
            ..input
        };
        assert!(short.validate().unwrap_err().get("new_password").is_some());
    }
}
