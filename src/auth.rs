//! Registration and log in forms, and the account types the backend returns.

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// A registered user as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The ID of the user.
    pub id: String,
    /// The user's display name.
    pub name: String,
    /// The email address used to log in.
    pub email: String,
    /// A reference to the user's profile image, if one has been set.
    #[serde(default)]
    pub profile_image: Option<String>,
    /// Whether the account is active.
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// The body returned by the register and log in endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthResponse {
    /// A human-readable status message.
    #[serde(default)]
    pub message: String,
    /// The user the request concerned.
    #[serde(default)]
    pub user: Option<User>,
    /// The bearer token, present after a successful log in.
    #[serde(default)]
    pub token: Option<String>,
    /// The backend's session identifier.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// The body of a log in request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogInRequest {
    /// The email address of the account.
    pub email: String,
    /// The account password.
    pub password: String,
}

/// The body of a registration request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterRequest {
    /// The user's display name.
    pub name: String,
    /// The email address to log in with.
    pub email: String,
    /// The account password.
    pub password: String,
}

/// The log in form as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct LogInForm {
    /// The email address.
    pub email: String,
    /// The password.
    pub password: String,
}

impl LogInForm {
    /// Check the form and build the request body.
    ///
    /// # Errors
    /// Returns [ValidationError::MissingCredentials] if either field is empty.
    pub fn validate(&self) -> Result<LogInRequest, ValidationError> {
        let email = self.email.trim();

        if email.is_empty() || self.password.is_empty() {
            return Err(ValidationError::MissingCredentials);
        }

        Ok(LogInRequest {
            email: email.to_owned(),
            password: self.password.clone(),
        })
    }
}

/// The registration form as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    /// The user's display name.
    pub name: String,
    /// The email address.
    pub email: String,
    /// The password.
    pub password: String,
    /// The password typed a second time.
    pub confirm_password: String,
}

impl RegisterForm {
    /// Check the form and build the request body.
    ///
    /// # Errors
    /// Returns:
    /// - [ValidationError::MissingRegistrationFields] if the name, email or password is empty,
    /// - [ValidationError::PasswordMismatch] if the two passwords differ.
    pub fn validate(&self) -> Result<RegisterRequest, ValidationError> {
        let name = self.name.trim();
        let email = self.email.trim();

        if name.is_empty() || email.is_empty() || self.password.is_empty() {
            return Err(ValidationError::MissingRegistrationFields);
        }

        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }

        Ok(RegisterRequest {
            name: name.to_owned(),
            email: email.to_owned(),
            password: self.password.clone(),
        })
    }
}
