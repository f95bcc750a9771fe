//! Defines the crate level error type and the messages shown for invalid forms.

use crate::{alert::Alert, api::ApiError};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A form failed local validation and was not submitted.
    #[error("{0}")]
    Validation(ValidationError),

    /// A call to the backend failed.
    #[error(transparent)]
    Api(ApiError),

    /// An authenticated request was attempted without a session token.
    ///
    /// Callers should ask the user to log in.
    #[error("you are not logged in")]
    NotLoggedIn,

    /// An empty string was used to create a category name.
    #[error("Category name required")]
    EmptyCategoryName,

    /// A filter field holds text that is not a valid value for that field.
    ///
    /// Holds the field name and the offending text.
    #[error("invalid value for {0}: \"{1}\"")]
    InvalidFilter(&'static str, String),

    /// An operation on the expense form was attempted in the wrong state,
    /// e.g. submitting a form that is closed or already being submitted.
    #[error("the expense form is not open for editing")]
    FormNotOpen,

    /// The session token could not be read from or written to storage.
    #[error("could not access the stored session: {0}")]
    TokenStore(String),

    /// Could not acquire the session lock
    #[error("could not acquire the session lock")]
    SessionLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// A request body or query string could not be serialized.
    #[error("could not serialize the request: {0}")]
    Serialization(String),

    /// The HTTP client could not be created or the base URL is unusable.
    #[error("invalid client configuration: {0}")]
    Configuration(String),
}

impl From<ValidationError> for Error {
    fn from(value: ValidationError) -> Self {
        Error::Validation(value)
    }
}

impl From<ApiError> for Error {
    fn from(value: ApiError) -> Self {
        Error::Api(value)
    }
}

impl Error {
    /// Turn the error into an alert for the user, headed by `action`, e.g.
    /// "Failed to delete expense".
    pub fn into_alert(self, action: &str) -> Alert {
        match self {
            Error::Validation(error) => Alert::error_simple(&error.to_string()),
            Error::NotLoggedIn => Alert::error(action, "Please log in first."),
            error => Alert::error(action, &error.to_string()),
        }
    }
}

/// The reasons a form can be rejected before it is sent to the backend.
///
/// Each variant displays as the message shown to the user.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The expense title is empty.
    #[error("Title is required.")]
    MissingTitle,
    /// The expense amount is empty.
    #[error("Amount is required.")]
    MissingAmount,
    /// The expense amount is not a number greater than zero.
    #[error("Amount must be a positive number.")]
    InvalidAmount,
    /// No category was selected for the expense.
    #[error("Select at least one category.")]
    MissingCategory,
    /// The expense date is empty.
    #[error("Date is required.")]
    MissingDate,
    /// The expense time is empty.
    #[error("Time is required.")]
    MissingTime,
    /// The log in form is missing the email or password.
    #[error("Please enter both email and password.")]
    MissingCredentials,
    /// The registration form has an empty field.
    #[error("Please fill in all fields.")]
    MissingRegistrationFields,
    /// The password and its confirmation differ.
    #[error("Passwords do not match.")]
    PasswordMismatch,
    /// The change password form has an empty field.
    #[error("All password fields are required")]
    MissingPasswordFields,
    /// The new password and its confirmation differ.
    #[error("New passwords do not match")]
    NewPasswordMismatch,
    /// The new password is shorter than [crate::profile::MIN_PASSWORD_LENGTH].
    #[error("New password must be at least 6 characters")]
    PasswordTooShort,
    /// The profile name is empty.
    #[error("Name is required")]
    MissingName,
}
