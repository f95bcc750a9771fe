//! The user's profile and the forms for editing it and changing the password.

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// The minimum number of characters in a new password.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// The logged in user's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
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
    /// When the account was created.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// The body of a profile update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfilePayload {
    /// The new display name.
    pub name: String,
    /// The profile image reference, `None` to remove it.
    pub profile_image: Option<String>,
}

/// The body of a password change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangePasswordPayload {
    /// The password the user logs in with now.
    pub current_password: String,
    /// The password to log in with from now on.
    pub new_password: String,
}

/// The profile form as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    /// The display name.
    pub name: String,
    /// The profile image reference.
    pub profile_image: Option<String>,
}

impl ProfileForm {
    /// A form holding the current values of `profile`.
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            profile_image: profile.profile_image.clone(),
        }
    }

    /// Check the form and build the request body.
    ///
    /// # Errors
    /// Returns [ValidationError::MissingName] if the name is blank.
    pub fn validate(&self) -> Result<ProfilePayload, ValidationError> {
        let name = self.name.trim();

        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }

        Ok(ProfilePayload {
            name: name.to_owned(),
            profile_image: self.profile_image.clone(),
        })
    }
}

/// The change password form as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct ChangePasswordForm {
    /// The current password.
    pub current_password: String,
    /// The new password.
    pub new_password: String,
    /// The new password typed a second time.
    pub confirm_password: String,
}

impl ChangePasswordForm {
    /// Check the form and build the request body.
    ///
    /// # Errors
    /// Returns:
    /// - [ValidationError::MissingPasswordFields] if any field is empty,
    /// - [ValidationError::NewPasswordMismatch] if the new passwords differ,
    /// - [ValidationError::PasswordTooShort] if the new password is shorter
    ///   than [MIN_PASSWORD_LENGTH] characters.
    pub fn validate(&self) -> Result<ChangePasswordPayload, ValidationError> {
        if self.current_password.is_empty()
            || self.new_password.is_empty()
            || self.confirm_password.is_empty()
        {
            return Err(ValidationError::MissingPasswordFields);
        }

        if self.new_password != self.confirm_password {
            return Err(ValidationError::NewPasswordMismatch);
        }

        if self.new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ValidationError::PasswordTooShort);
        }

        Ok(ChangePasswordPayload {
            current_password: self.current_password.clone(),
            new_password: self.new_password.clone(),
        })
    }
}
