//! Ownership of the bearer token and detection of expired sessions.
//!
//! [Session] is the only place the token is read or changed. The API client
//! is given a [Session] when it is built and reads the token before every
//! authenticated request. [SessionGate] watches failed responses for the
//! backend's session-expiry signal and reports it over a channel.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::{Error, alert::Alert, api::ErrorBody};

/// The key the session token is stored under.
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// How long to wait after telling the user their session expired before
/// sending them to the log in screen.
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_secs(1);

/// The message shown when the backend reports an expired session.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Persistent storage for the session token.
pub trait TokenStore: Send {
    /// Read the stored token, if there is one.
    ///
    /// # Errors
    /// Returns [Error::TokenStore] if the storage cannot be read.
    fn load(&self) -> Result<Option<String>, Error>;

    /// Store `token`, replacing any previous token.
    ///
    /// # Errors
    /// Returns [Error::TokenStore] if the storage cannot be written.
    fn save(&mut self, token: &str) -> Result<(), Error>;

    /// Delete the stored token.
    ///
    /// # Errors
    /// Returns [Error::TokenStore] if the storage cannot be written.
    fn remove(&mut self) -> Result<(), Error>;
}

/// Keeps the token in memory only.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Option<String>,
}

impl MemoryTokenStore {
    /// A store that starts out holding `token`.
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Some(token.to_owned()),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, Error> {
        Ok(self.token.clone())
    }

    fn save(&mut self, token: &str) -> Result<(), Error> {
        self.token = Some(token.to_owned());
        Ok(())
    }

    fn remove(&mut self) -> Result<(), Error> {
        self.token = None;
        Ok(())
    }
}

/// Keeps the token in a JSON file as `{"authToken": "..."}`.
///
/// Other keys in the file are left alone.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Use the JSON file at `path`, which does not need to exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file the token is stored in.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Map<String, Value>, Error> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(error) => return Err(self.error(error)),
        };

        if text.trim().is_empty() {
            return Ok(Map::new());
        }

        serde_json::from_str(&text).map_err(|error| self.error(error))
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| self.error(error))?;
        }

        let text = serde_json::to_string_pretty(entries).map_err(|error| self.error(error))?;

        fs::write(&self.path, text).map_err(|error| self.error(error))
    }

    fn error(&self, error: impl std::fmt::Display) -> Error {
        Error::TokenStore(format!("{}: {error}", self.path.display()))
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, Error> {
        let entries = self.read_entries()?;

        Ok(entries
            .get(AUTH_TOKEN_KEY)
            .and_then(Value::as_str)
            .map(str::to_owned))
    }

    fn save(&mut self, token: &str) -> Result<(), Error> {
        let mut entries = self.read_entries()?;
        entries.insert(AUTH_TOKEN_KEY.to_owned(), Value::String(token.to_owned()));

        self.write_entries(&entries)
    }

    fn remove(&mut self) -> Result<(), Error> {
        let mut entries = self.read_entries()?;

        if entries.remove(AUTH_TOKEN_KEY).is_none() {
            return Ok(());
        }

        self.write_entries(&entries)
    }
}

struct SessionState {
    token: Option<String>,
    store: Box<dyn TokenStore>,
}

/// The logged in user's bearer token and where it is persisted.
///
/// Clones share the same token.
#[derive(Clone)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    /// Create a session, reading any token left in `store` by a previous run.
    ///
    /// # Errors
    /// Returns [Error::TokenStore] if `store` cannot be read.
    pub fn load(store: impl TokenStore + 'static) -> Result<Self, Error> {
        let token = store.load()?;

        if token.is_some() {
            tracing::debug!("Restored session token from storage");
        }

        Ok(Self {
            state: Arc::new(Mutex::new(SessionState {
                token,
                store: Box::new(store),
            })),
        })
    }

    /// A session that is not persisted and has no token.
    pub fn in_memory() -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                token: None,
                store: Box::new(MemoryTokenStore::default()),
            })),
        }
    }

    /// The current bearer token.
    ///
    /// # Errors
    /// Returns [Error::SessionLockError] if the session lock is poisoned.
    pub fn token(&self) -> Result<Option<String>, Error> {
        let state = self.state.lock().map_err(|_| Error::SessionLockError)?;

        Ok(state.token.clone())
    }

    /// Whether there is a token.
    pub fn is_logged_in(&self) -> bool {
        matches!(self.token(), Ok(Some(_)))
    }

    /// Replace the token and persist it.
    ///
    /// # Errors
    /// Returns [Error::SessionLockError] if the session lock is poisoned, or
    /// [Error::TokenStore] if the token could not be persisted. The token is
    /// kept in memory in the latter case.
    pub fn set_token(&self, token: &str) -> Result<(), Error> {
        let mut state = self.state.lock().map_err(|_| Error::SessionLockError)?;
        state.token = Some(token.to_owned());

        state.store.save(token)
    }

    /// Forget the token and remove it from storage.
    ///
    /// Returns whether there was a token to clear, so that only the first of
    /// several concurrent callers acts on an expiry.
    ///
    /// # Errors
    /// Returns [Error::SessionLockError] if the session lock is poisoned, or
    /// [Error::TokenStore] if the stored token could not be removed. The
    /// in-memory token is cleared either way.
    pub fn clear(&self) -> Result<bool, Error> {
        let (cleared, removed) = self.take_token()?;
        removed?;

        Ok(cleared)
    }

    /// Forget the in-memory token and remove it from storage, returning
    /// whether there was a token and the outcome of the removal.
    fn take_token(&self) -> Result<(bool, Result<(), Error>), Error> {
        let mut state = self.state.lock().map_err(|_| Error::SessionLockError)?;

        if state.token.take().is_none() {
            return Ok((false, Ok(())));
        }

        let removed = state.store.remove();

        Ok((true, removed))
    }
}

/// The screen the user is looking at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    /// The log in screen.
    LogIn,
    /// The registration screen.
    Register,
    /// The dashboard.
    #[default]
    Dashboard,
    /// The expense list.
    Expenses,
    /// The profile screen.
    Profile,
}

/// Something the user interface must react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session expired and the token has been cleared.
    Expired(Alert),
    /// The user should be sent to the log in screen.
    RedirectToLogIn,
}

/// Watches failed responses for the backend's session-expiry signal.
#[derive(Clone)]
pub struct SessionGate {
    session: Session,
    view: Arc<Mutex<View>>,
    events: mpsc::UnboundedSender<SessionEvent>,
    redirect_delay: Duration,
}

impl SessionGate {
    /// Create a gate for `session` and the receiver its events are sent to.
    pub fn new(
        session: Session,
        redirect_delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();

        let gate = Self {
            session,
            view: Arc::new(Mutex::new(View::default())),
            events,
            redirect_delay,
        };

        (gate, receiver)
    }

    /// Record the screen the user is on.
    pub fn set_view(&self, view: View) {
        *self.view.lock().unwrap_or_else(PoisonError::into_inner) = view;
    }

    /// The screen the user is on.
    pub fn view(&self) -> View {
        *self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a response with `status` and `body` means the session expired.
    pub fn is_expiry_signal(status: u16, body: &ErrorBody) -> bool {
        if status != 401 {
            return false;
        }

        let has_code = body.error.as_deref() == Some("session_expired");
        let has_message = body.message.as_deref().is_some_and(|message| {
            message.contains("Session expired") || message.contains("session expired")
        });

        has_code || has_message
    }

    /// Check a failed response and handle an expired session.
    ///
    /// On expiry the token is cleared, [SessionEvent::Expired] is sent, and
    /// unless the user is already on the log in screen
    /// [SessionEvent::RedirectToLogIn] follows after the redirect delay.
    /// Only the caller that actually clears the token sends events.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// Returns whether the response signalled an expired session.
    ///
    /// # Errors
    /// Returns an error if the session lock is poisoned, or if the stored
    /// token could not be removed. In the latter case the in-memory token is
    /// cleared and the events are sent before the error is returned.
    pub fn inspect(&self, status: u16, body: &ErrorBody) -> Result<bool, Error> {
        if !Self::is_expiry_signal(status, body) {
            return Ok(false);
        }

        let (cleared, removed) = self.session.take_token()?;

        if !cleared {
            tracing::debug!("Session expiry already handled");
            return Ok(true);
        }

        tracing::info!("Session expired, cleared the session token");
        self.send(SessionEvent::Expired(Alert::error_simple(
            SESSION_EXPIRED_MESSAGE,
        )));

        if self.view() != View::LogIn {
            let events = self.events.clone();
            let delay = self.redirect_delay;

            tokio::spawn(async move {
                tokio::time::sleep(delay).await;

                if events.send(SessionEvent::RedirectToLogIn).is_err() {
                    tracing::debug!("Nobody is listening for the log in redirect");
                }
            });
        }

        if let Err(error) = removed {
            tracing::error!("Could not remove the expired token from storage: {error}");
            return Err(error);
        }

        Ok(true)
    }

    fn send(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("Nobody is listening for session events");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::{Instant, timeout};

    use crate::{Error, api::ErrorBody};

    use super::{
        AUTH_TOKEN_KEY, DEFAULT_REDIRECT_DELAY, FileTokenStore, MemoryTokenStore, Session,
        SessionEvent, SessionGate, TokenStore, View,
    };

    fn body(error: Option<&str>, message: Option<&str>) -> ErrorBody {
        ErrorBody {
            error: error.map(str::to_owned),
            message: message.map(str::to_owned),
        }
    }

    fn logged_in_session() -> Session {
        Session::load(MemoryTokenStore::with_token("token")).unwrap()
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let mut store = FileTokenStore::new(&path);

        assert_eq!(store.load().unwrap(), None);

        store.save("abc").unwrap();
        assert_eq!(store.load().unwrap(), Some("abc".to_owned()));

        let contents: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(contents[AUTH_TOKEN_KEY], "abc");

        store.remove().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn file_store_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{"theme": "dark"}"#).unwrap();
        let mut store = FileTokenStore::new(&path);

        store.save("abc").unwrap();
        store.remove().unwrap();

        let contents: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(contents, serde_json::json!({"theme": "dark"}));
    }

    #[test]
    fn session_restores_token_from_store() {
        let session = logged_in_session();

        assert_eq!(session.token().unwrap(), Some("token".to_owned()));
        assert!(session.is_logged_in());
    }

    #[test]
    fn clear_reports_only_the_first_clear() {
        let session = logged_in_session();
        let clone = session.clone();

        assert!(session.clear().unwrap());
        assert!(!clone.clear().unwrap());
        assert_eq!(clone.token().unwrap(), None);
    }

    #[test]
    fn detects_expiry_signals() {
        let cases = [
            (401, body(Some("session_expired"), None), true),
            (401, body(None, Some("Session expired, log in again")), true),
            (401, body(None, Some("Your session expired")), true),
            (401, body(Some("invalid_token"), Some("Unauthorized")), false),
            (403, body(Some("session_expired"), None), false),
            (500, body(None, Some("Session expired")), false),
        ];

        for (status, body, want) in cases {
            assert_eq!(
                SessionGate::is_expiry_signal(status, &body),
                want,
                "status {status}, body {body:?}"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_clears_token_and_redirects_after_delay() {
        let session = logged_in_session();
        let (gate, mut events) = SessionGate::new(session.clone(), DEFAULT_REDIRECT_DELAY);
        gate.set_view(View::Expenses);
        let start = Instant::now();

        let expired = gate
            .inspect(401, &body(Some("session_expired"), None))
            .unwrap();

        assert!(expired);
        assert_eq!(session.token().unwrap(), None);
        assert!(matches!(events.recv().await, Some(SessionEvent::Expired(_))));

        let early = timeout(Duration::from_millis(999), events.recv()).await;
        assert!(early.is_err(), "redirect arrived before the delay");

        assert_eq!(events.recv().await, Some(SessionEvent::RedirectToLogIn));
        assert!(start.elapsed() >= DEFAULT_REDIRECT_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn no_redirect_from_log_in_screen() {
        let (gate, mut events) = SessionGate::new(logged_in_session(), DEFAULT_REDIRECT_DELAY);
        gate.set_view(View::LogIn);

        gate.inspect(401, &body(Some("session_expired"), None))
            .unwrap();

        assert!(matches!(events.recv().await, Some(SessionEvent::Expired(_))));
        let redirect = timeout(Duration::from_secs(5), events.recv()).await;
        assert!(redirect.is_err(), "got unexpected redirect {redirect:?}");
    }

    #[tokio::test]
    async fn expiry_is_handled_once() {
        let (gate, mut events) = SessionGate::new(logged_in_session(), Duration::ZERO);
        gate.set_view(View::LogIn);
        let signal = body(Some("session_expired"), None);

        assert!(gate.inspect(401, &signal).unwrap());
        assert!(gate.inspect(401, &signal).unwrap());

        assert!(matches!(events.recv().await, Some(SessionEvent::Expired(_))));
        assert!(events.try_recv().is_err());
    }

    /// A store that holds a token but cannot delete it.
    struct ReadOnlyStore;

    impl TokenStore for ReadOnlyStore {
        fn load(&self) -> Result<Option<String>, Error> {
            Ok(Some("token".to_owned()))
        }

        fn save(&mut self, _token: &str) -> Result<(), Error> {
            Err(Error::TokenStore("read-only".to_owned()))
        }

        fn remove(&mut self) -> Result<(), Error> {
            Err(Error::TokenStore("read-only".to_owned()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_is_reported_when_stored_token_cannot_be_removed() {
        let session = Session::load(ReadOnlyStore).unwrap();
        let (gate, mut events) = SessionGate::new(session.clone(), DEFAULT_REDIRECT_DELAY);
        gate.set_view(View::Expenses);
        let signal = body(Some("session_expired"), None);

        let first = gate.inspect(401, &signal);
        let second = gate.inspect(401, &signal);

        assert_eq!(first, Err(Error::TokenStore("read-only".to_owned())));
        assert_eq!(second, Ok(true));
        assert_eq!(session.token().unwrap(), None);
        assert!(matches!(events.recv().await, Some(SessionEvent::Expired(_))));
        assert_eq!(events.recv().await, Some(SessionEvent::RedirectToLogIn));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn clear_reports_store_failure() {
        let session = Session::load(ReadOnlyStore).unwrap();

        assert_eq!(session.clear(), Err(Error::TokenStore("read-only".to_owned())));
        assert_eq!(session.token().unwrap(), None);
        assert_eq!(session.clear(), Ok(false));
    }

    #[tokio::test]
    async fn other_errors_are_ignored() {
        let session = logged_in_session();
        let (gate, mut events) = SessionGate::new(session.clone(), Duration::ZERO);

        let expired = gate.inspect(404, &body(Some("not_found"), None)).unwrap();

        assert!(!expired);
        assert!(session.is_logged_in());
        assert!(events.try_recv().is_err());
    }
}
