use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const FIRST_NAME_REQUIRED: &str = "Please provide a first name.";
pub const LAST_NAME_REQUIRED: &str = "Please provide a last name.";
pub const EMAIL_INVALID: &str = "Please provide a valid email address.";
pub const PASSWORD_REQUIRED: &str = "Password can't be empty.";
pub const EMAIL_IN_USE: &str = "Email already in use";

/// Stored user record. `password_hash` never leaves the process.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    #[serde(skip)]
    pub password_hash: String,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email_address", &self.email_address)
            .field("password_hash", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Public projection of a user, as embedded in course responses and
/// returned by `GET /users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email_address: user.email_address.clone(),
        }
    }
}

/// Registration payload. Every field is optional on the wire so that a
/// missing field is reported the same way as an empty one.
/// No `Debug`: the plaintext password lives here.
#[derive(Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_address: Option<String>,
    pub password: Option<String>,
}

/// Validated registration data, ready to be stored.
#[derive(Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    pub password_hash: String,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

impl CreateUser {
    /// Collects every field error in declaration order.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if present(&self.first_name).is_none() {
            errors.push(FIRST_NAME_REQUIRED.to_string());
        }
        if present(&self.last_name).is_none() {
            errors.push(LAST_NAME_REQUIRED.to_string());
        }
        if !present(&self.email_address).is_some_and(is_valid_email) {
            errors.push(EMAIL_INVALID.to_string());
        }
        // Passwords are taken verbatim, whitespace included.
        if self.password.as_deref().is_none_or(str::is_empty) {
            errors.push(PASSWORD_REQUIRED.to_string());
        }
        errors
    }

    pub fn email(&self) -> &str {
        present(&self.email_address).unwrap_or_default()
    }

    /// Builds the storable record. Call only after `validate` came back empty.
    pub fn into_new_user(self, password_hash: String) -> NewUser {
        let trimmed = |v: Option<String>| v.map(|s| s.trim().to_string()).unwrap_or_default();
        NewUser {
            first_name: trimmed(self.first_name),
            last_name: trimmed(self.last_name),
            email_address: trimmed(self.email_address),
            password_hash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> CreateUser {
        CreateUser {
            first_name: Some("Joe".to_string()),
            last_name: Some("Smith".to_string()),
            email_address: Some("joe@smith.com".to_string()),
            password: Some("joepassword".to_string()),
        }
    }

    #[test]
    fn test_complete_user_has_no_errors() {
        assert!(complete().validate().is_empty());
    }

    #[test]
    fn test_empty_payload_reports_all_fields_in_order() {
        let errors = CreateUser::default().validate();
        assert_eq!(
            errors,
            vec![
                FIRST_NAME_REQUIRED,
                LAST_NAME_REQUIRED,
                EMAIL_INVALID,
                PASSWORD_REQUIRED
            ]
        );
    }

    #[test]
    fn test_blank_names_are_rejected() {
        let mut user = complete();
        user.first_name = Some("   ".to_string());
        user.last_name = Some(String::new());
        assert_eq!(user.validate(), vec![FIRST_NAME_REQUIRED, LAST_NAME_REQUIRED]);
    }

    #[test]
    fn test_malformed_email_is_rejected() {
        for bad in ["joe", "joe@", "@smith.com", "joe smith@smith.com", "joe@smith"] {
            let mut user = complete();
            user.email_address = Some(bad.to_string());
            assert_eq!(user.validate(), vec![EMAIL_INVALID], "accepted {bad}");
        }
    }

    #[test]
    fn test_into_new_user_trims_fields_but_not_hash() {
        let mut user = complete();
        user.email_address = Some("  joe@smith.com ".to_string());
        let new_user = user.into_new_user("$argon2id$hash".to_string());
        assert_eq!(new_user.email_address, "joe@smith.com");
        assert_eq!(new_user.password_hash, "$argon2id$hash");
    }

    #[test]
    fn test_user_serialization_hides_password_hash() {
        let user = User {
            id: 1,
            first_name: "Joe".to_string(),
            last_name: "Smith".to_string(),
            email_address: "joe@smith.com".to_string(),
            password_hash: "secret-hash".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["emailAddress"], "joe@smith.com");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("createdAt").is_none());
        assert!(!json.to_string().contains("secret-hash"));
        assert!(!format!("{:?}", user).contains("secret-hash"));
    }
}
