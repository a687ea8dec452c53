use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::User;
use crate::db::types::UserRole;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UserRegister {
    #[serde(alias = "fullName")]
    #[validate(length(min = 3, max = 120, message = "full_name must be 3..120 characters"))]
    pub(crate) full_name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub(crate) password: String,
    #[serde(default = "default_role")]
    pub(crate) role: UserRole,
    #[serde(default, alias = "className")]
    pub(crate) class_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserLogin {
    pub(crate) email: String,
    pub(crate) password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UserUpdate {
    #[serde(default, alias = "fullName")]
    #[validate(length(min = 3, max = 120, message = "full_name must be 3..120 characters"))]
    pub(crate) full_name: Option<String>,
    #[serde(default, alias = "className", deserialize_with = "crate::schemas::nullable")]
    pub(crate) class_name: Option<Option<String>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) full_name: String,
    pub(crate) role: UserRole,
    pub(crate) class_name: Option<String>,
    pub(crate) created_at: String,
}

impl UserResponse {
    pub(crate) fn from_db(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            class_name: user.class_name,
            created_at: format_primitive(user.created_at),
        }
    }
}

fn default_role() -> UserRole {
    UserRole::Student
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_defaults_to_student() {
        let payload: UserRegister = serde_json::from_value(serde_json::json!({
            "full_name": "Ada Obi",
            "email": "ada@example.com",
            "password": "secret1"
        }))
        .unwrap();

        assert_eq!(payload.role, UserRole::Student);
        assert!(payload.class_name.is_none());
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn register_rejects_short_password_and_bad_email() {
        let payload: UserRegister = serde_json::from_value(serde_json::json!({
            "full_name": "Ada Obi",
            "email": "not-an-email",
            "password": "12345",
            "role": "teacher"
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(!fields.contains_key("full_name"));
    }

    #[test]
    fn unknown_role_fails_to_deserialize() {
        let result: Result<UserRegister, _> = serde_json::from_value(serde_json::json!({
            "full_name": "Ada Obi",
            "email": "ada@example.com",
            "password": "secret1",
            "role": "admin"
        }));
        assert!(result.is_err());
    }
}
