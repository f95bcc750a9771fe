//! Spendlog is a client for a personal expense tracker.
//!
//! This library talks to the tracker's REST backend and holds the logic of
//! its screens: converting dates and times between the form and wire
//! formats, filtering the expense list, the add/edit expense form, and
//! reacting to expired sessions.

#![warn(missing_docs)]

pub mod alert;
pub mod api;
pub mod auth;
pub mod category;
pub mod codec;
pub mod config;
pub mod dashboard;
mod endpoints;
mod error;
pub mod expense;
pub mod format;
mod logging;
pub mod profile;
pub mod session;
pub mod timezone;

#[cfg(test)]
mod test_utils;

pub use alert::{Alert, AlertSink, AlertType};
pub use api::{ApiClient, ApiError, ApiErrorKind};
pub use config::ClientConfig;
pub use error::{Error, ValidationError};
pub use logging::LOG_BODY_LENGTH_LIMIT;
pub use session::{Session, SessionEvent, SessionGate, View};
