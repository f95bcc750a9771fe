//! Settings for talking to the backend.

use std::{path::PathBuf, time::Duration};

use crate::{expense::FilterMode, session::DEFAULT_REDIRECT_DELAY};

/// The backend used when no URL is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

/// The timezone used when none is configured.
pub const DEFAULT_TIMEZONE: &str = "Etc/UTC";

/// Settings for the API client and the screens built on it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// The base URL every endpoint path is appended to.
    pub api_url: String,
    /// Whether expenses are filtered locally or by the backend.
    pub filter_mode: FilterMode,
    /// The canonical timezone new expenses default to, e.g. "Asia/Kolkata".
    pub local_timezone: String,
    /// Where the session token is persisted, `None` to keep it in memory.
    pub token_path: Option<PathBuf>,
    /// The pause between an expired session alert and the log in redirect.
    pub redirect_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            filter_mode: FilterMode::default(),
            local_timezone: DEFAULT_TIMEZONE.to_owned(),
            token_path: default_token_path(),
            redirect_delay: DEFAULT_REDIRECT_DELAY,
        }
    }
}

impl ClientConfig {
    /// The base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}

/// The token file in the user's configuration directory, e.g.
/// `~/.config/spendlog/session.json`.
///
/// Returns `None` on platforms without a configuration directory.
pub fn default_token_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("spendlog").join("session.json"))
}
