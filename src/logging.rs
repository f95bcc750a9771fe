//! Logging for requests sent to and responses received from the backend.

use serde_json::Value;

/// Bodies longer than this many bytes are truncated in `info` logs.
///
/// The full body is logged at the `debug` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

const REDACTED_FIELDS: [&str; 5] = [
    "password",
    "confirm_password",
    "current_password",
    "new_password",
    "token",
];

/// Log a request that is about to be sent.
pub fn log_request(method: &str, url: &str, body: &str) {
    let body = redact_secrets(body);

    match truncate(&body) {
        Some(short) => {
            tracing::info!("Sending request: {method} {url}\nbody: {short}...");
            tracing::debug!("Full request body: {body:?}");
        }
        None => tracing::info!("Sending request: {method} {url}\nbody: {body:?}"),
    }
}

/// Log a response received for a request to `url`.
pub fn log_response(status: u16, url: &str, body: &str) {
    let body = redact_secrets(body);

    match truncate(&body) {
        Some(short) => {
            tracing::info!("Received response: {status} from {url}\nbody: {short}...");
            tracing::debug!("Full response body: {body:?}");
        }
        None => tracing::info!("Received response: {status} from {url}\nbody: {body:?}"),
    }
}

/// Replace the values of password and token fields in a JSON body.
///
/// Bodies that are not JSON objects are returned unchanged.
fn redact_secrets(body: &str) -> String {
    let Ok(Value::Object(mut fields)) = serde_json::from_str::<Value>(body) else {
        return body.to_owned();
    };

    let mut redacted = false;

    for field in REDACTED_FIELDS {
        if let Some(value) = fields.get_mut(field) {
            *value = Value::String("********".to_owned());
            redacted = true;
        }
    }

    if !redacted {
        return body.to_owned();
    }

    Value::Object(fields).to_string()
}

/// The first [LOG_BODY_LENGTH_LIMIT] bytes of `body`, or `None` if it is
/// short enough to log in full.
///
/// The cut is moved back to the nearest character boundary.
fn truncate(body: &str) -> Option<&str> {
    if body.len() <= LOG_BODY_LENGTH_LIMIT {
        return None;
    }

    let mut end = LOG_BODY_LENGTH_LIMIT;

    while !body.is_char_boundary(end) {
        end -= 1;
    }

    Some(&body[..end])
}
