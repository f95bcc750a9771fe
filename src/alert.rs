//! Alert system for displaying success and error messages to users.
//!
//! Components report what happened through an [AlertSink] and leave the
//! presentation to the caller, e.g. the CLI prints alerts to the terminal.

use std::fmt::Display;

/// Alert message types for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertType {
    /// The operation succeeded.
    Success,
    /// The operation failed.
    Error,
}

/// A short, user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Whether this alert reports a success or an error.
    pub alert_type: AlertType,
    /// The headline of the alert.
    pub message: String,
    /// Optional extra details, empty if there are none.
    pub details: String,
}

impl Alert {
    /// Create a new success alert
    pub fn success(message: &str) -> Self {
        Self {
            alert_type: AlertType::Success,
            message: message.to_owned(),
            details: String::new(),
        }
    }

    /// Create a new error alert
    pub fn error(message: &str, details: &str) -> Self {
        Self {
            alert_type: AlertType::Error,
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    /// Create a new error alert without details
    pub fn error_simple(message: &str) -> Self {
        Self::error(message, "")
    }
}

impl Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.details.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.message, self.details)
        }
    }
}

/// Somewhere to send alerts.
pub trait AlertSink {
    /// Show `alert` to the user.
    fn push(&mut self, alert: Alert);
}

impl AlertSink for Vec<Alert> {
    fn push(&mut self, alert: Alert) {
        Vec::push(self, alert);
    }
}

/// Prints success alerts to stdout and error alerts to stderr.
#[derive(Debug, Default)]
pub struct ConsoleAlerts;

impl AlertSink for ConsoleAlerts {
    fn push(&mut self, alert: Alert) {
        match alert.alert_type {
            AlertType::Success => println!("{alert}"),
            AlertType::Error => eprintln!("error: {alert}"),
        }
    }
}
