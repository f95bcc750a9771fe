//! The single error shape for failed backend calls.
//!
//! Backends report failures with a JSON body holding an `error` code, a
//! `message`, or both. The body is inspected once here and every caller gets
//! an [ApiError] instead of guessing at the shape.

use serde_json::Value;

/// What kind of failure a backend call ended in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The request never got a response, e.g. the server is unreachable.
    Network,
    /// The backend rejected the credentials or token (HTTP 401).
    Unauthorized,
    /// The backend reported that the session token has expired.
    SessionExpired,
    /// The requested resource does not exist (HTTP 404).
    NotFound,
    /// Any other unsuccessful status.
    Status,
    /// The response body could not be understood.
    Decode,
}

/// A failed backend call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    /// The kind of failure.
    pub kind: ApiErrorKind,
    /// The HTTP status, if a response was received.
    pub status: Option<u16>,
    /// A human-readable description suitable for showing to the user.
    pub message: String,
}

impl ApiError {
    /// Build the error for an unsuccessful response.
    ///
    /// `session_expired` should be the verdict of
    /// [crate::session::SessionGate::inspect] for the same response.
    pub fn from_response(status: u16, body: &ErrorBody, session_expired: bool) -> Self {
        let kind = match status {
            _ if session_expired => ApiErrorKind::SessionExpired,
            401 => ApiErrorKind::Unauthorized,
            404 => ApiErrorKind::NotFound,
            _ => ApiErrorKind::Status,
        };

        let message = body
            .text()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("request failed with status {status}"));

        Self {
            kind,
            status: Some(status),
            message,
        }
    }

    /// The request could not be sent or the response could not be read.
    pub fn network(error: &reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            status: error.status().map(|status| status.as_u16()),
            message: format!("could not reach the server: {error}"),
        }
    }

    /// The response body did not have the expected shape.
    pub fn decode(status: u16, error: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Decode,
            status: Some(status),
            message: format!("unexpected response from the server: {error}"),
        }
    }
}

/// The fields of an error body the client understands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorBody {
    /// A machine-readable error code or text, e.g. "session_expired".
    pub error: Option<String>,
    /// A human-readable message.
    pub message: Option<String>,
}

impl ErrorBody {
    /// Extract the known fields from a response body.
    ///
    /// Bodies that are not JSON objects, and fields that are not strings,
    /// are treated as absent.
    pub fn parse(text: &str) -> Self {
        let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(text) else {
            return Self::default();
        };

        let field = |name: &str| {
            fields
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_owned)
        };

        Self {
            error: field("error"),
            message: field("message"),
        }
    }

    /// The text to show the user: the error, or else the message.
    pub fn text(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiError, ApiErrorKind, ErrorBody};

    #[test]
    fn parses_error_and_message() {
        let body = ErrorBody::parse(r#"{"error": "session_expired", "message": "Session expired"}"#);

        assert_eq!(body.error.as_deref(), Some("session_expired"));
        assert_eq!(body.message.as_deref(), Some("Session expired"));
        assert_eq!(body.text(), Some("session_expired"));
    }

    #[test]
    fn ignores_unexpected_shapes() {
        for text in ["", "not json", "[1, 2]", r#"{"error": {"code": 1}}"#] {
            assert_eq!(ErrorBody::parse(text), ErrorBody::default(), "body {text:?}");
        }
    }

    #[test]
    fn classifies_statuses() {
        let body = ErrorBody::default();
        let cases = [
            (401, true, ApiErrorKind::SessionExpired),
            (401, false, ApiErrorKind::Unauthorized),
            (404, false, ApiErrorKind::NotFound),
            (500, false, ApiErrorKind::Status),
        ];

        for (status, expired, want) in cases {
            let error = ApiError::from_response(status, &body, expired);

            assert_eq!(error.kind, want, "status {status}");
            assert_eq!(error.status, Some(status));
        }
    }

    #[test]
    fn prefers_message_from_body() {
        let body = ErrorBody::parse(r#"{"message": "Category already exists"}"#);

        let error = ApiError::from_response(409, &body, false);

        assert_eq!(error.to_string(), "Category already exists");
    }

    #[test]
    fn falls_back_to_generic_message() {
        let error = ApiError::from_response(502, &ErrorBody::default(), false);

        assert_eq!(error.message, "request failed with status 502");
    }
}
