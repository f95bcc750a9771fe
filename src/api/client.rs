//! The HTTP client for every backend endpoint.

use reqwest::{Method, header::CONTENT_TYPE};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    Error,
    auth::{AuthResponse, LogInRequest, RegisterRequest},
    category::{Category, CategoryPayload},
    config::ClientConfig,
    dashboard::Dashboard,
    endpoints::{self, format_endpoint},
    expense::{Expense, ExpenseApi, ExpensePayload, ExpenseQuery},
    logging::{log_request, log_response},
    profile::{ChangePasswordPayload, Profile, ProfilePayload},
    session::{Session, SessionGate},
};

use super::{
    ApiError, CategoriesResponse, DashboardResponse, ErrorBody, ExpensesResponse, MessageResponse,
    ProfileResponse,
};

/// Whether a request carries the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    None,
    Bearer,
}

/// A client for the expense tracker backend.
///
/// Authenticated calls read the token from the [Session] given at
/// construction, and every failed response is shown to the [SessionGate].
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Session,
    gate: SessionGate,
}

impl ApiClient {
    /// Create a client for the backend at `config.api_url`.
    ///
    /// # Errors
    /// Returns [Error::Configuration] if the URL is not valid or the HTTP
    /// client cannot be created.
    pub fn new(config: &ClientConfig, session: Session, gate: SessionGate) -> Result<Self, Error> {
        let base_url = config.base_url().to_owned();

        reqwest::Url::parse(&base_url)
            .map_err(|error| Error::Configuration(format!("invalid API URL {base_url}: {error}")))?;

        let http = reqwest::Client::builder()
            .build()
            .map_err(|error| Error::Configuration(error.to_string()))?;

        Ok(Self {
            http,
            base_url,
            session,
            gate,
        })
    }

    /// The session the client reads its token from.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The gate failed responses are shown to.
    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    /// Create an account.
    ///
    /// # Errors
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, Error> {
        self.send(Method::POST, endpoints::REGISTER, Some(request), None, Auth::None)
            .await
    }

    /// Log in and store the returned token in the session.
    ///
    /// # Errors
    /// Returns an error if the request fails, the backend rejects the
    /// credentials, or the response carries no token.
    pub async fn log_in(&self, request: &LogInRequest) -> Result<AuthResponse, Error> {
        let response: AuthResponse = self
            .send(Method::POST, endpoints::LOG_IN, Some(request), None, Auth::None)
            .await?;

        let Some(token) = response.token.as_deref() else {
            return Err(ApiError::decode(200, "the log in response has no token").into());
        };

        self.session.set_token(token)?;
        tracing::info!("Logged in");

        Ok(response)
    }

    /// Log out and forget the token.
    ///
    /// The token is cleared even if the backend call fails.
    ///
    /// # Errors
    /// Returns the backend error after clearing the token, or an error if
    /// the token could not be cleared.
    pub async fn log_out(&self) -> Result<(), Error> {
        let result = self
            .send_for_message(Method::POST, endpoints::LOG_OUT, Some(&serde_json::json!({})))
            .await;

        self.session.clear()?;
        tracing::info!("Logged out");

        match result {
            Err(Error::NotLoggedIn) => Ok(()),
            result => result,
        }
    }

    /// Fetch the logged in user's profile.
    ///
    /// # Errors
    /// Returns an error if not logged in or the request fails.
    pub async fn get_profile(&self) -> Result<Profile, Error> {
        let response: ProfileResponse = self
            .send(Method::GET, endpoints::PROFILE, None::<&()>, None, Auth::Bearer)
            .await?;

        Ok(response.profile)
    }

    /// Change the name or profile image.
    ///
    /// # Errors
    /// Returns an error if not logged in or the request fails.
    pub async fn update_profile(&self, payload: &ProfilePayload) -> Result<(), Error> {
        self.send_for_message(Method::PUT, endpoints::PROFILE, Some(payload))
            .await
    }

    /// Change the password.
    ///
    /// # Errors
    /// Returns an error if not logged in, the current password is wrong, or
    /// the request fails.
    pub async fn change_password(&self, payload: &ChangePasswordPayload) -> Result<(), Error> {
        self.send_for_message(Method::PUT, endpoints::PROFILE_PASSWORD, Some(payload))
            .await
    }

    /// Create a category.
    ///
    /// # Errors
    /// Returns an error if not logged in or the request fails.
    pub async fn create_category(&self, payload: &CategoryPayload) -> Result<(), Error> {
        self.send_for_message(Method::POST, endpoints::CATEGORIES, Some(payload))
            .await
    }

    /// Rename a category or change its default flag.
    ///
    /// # Errors
    /// Returns an error if not logged in or the request fails.
    pub async fn update_category(&self, id: &str, payload: &CategoryPayload) -> Result<(), Error> {
        let path = format_endpoint(endpoints::CATEGORY, id);

        self.send_for_message(Method::PUT, &path, Some(payload))
            .await
    }

    /// Delete a category.
    ///
    /// # Errors
    /// Returns an error if not logged in or the request fails.
    pub async fn delete_category(&self, id: &str) -> Result<(), Error> {
        let path = format_endpoint(endpoints::CATEGORY, id);

        self.send_for_message(Method::DELETE, &path, None::<&()>)
            .await
    }

    /// Fetch the spending overview.
    ///
    /// # Errors
    /// Returns an error if not logged in or the request fails.
    pub async fn get_dashboard(&self) -> Result<Dashboard, Error> {
        let response: DashboardResponse = self
            .send(Method::GET, endpoints::DASHBOARD, None::<&()>, None, Auth::Bearer)
            .await?;

        Ok(response.dashboard)
    }

    async fn send_for_message<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), Error> {
        let response: MessageResponse = self.send(method, path, body, None, Auth::Bearer).await?;

        if !response.message.is_empty() {
            tracing::debug!("Backend replied: {}", response.message);
        }

        Ok(())
    }

    async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        query: Option<&ExpenseQuery>,
        auth: Auth,
    ) -> Result<T, Error>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = self.url(path, query)?;
        let mut request = self.http.request(method.clone(), &url);

        if auth == Auth::Bearer {
            let token = self.session.token()?.ok_or(Error::NotLoggedIn)?;
            request = request.bearer_auth(token);
        }

        let body_text = match body {
            Some(body) => serde_json::to_string(body)
                .map_err(|error| Error::Serialization(error.to_string()))?,
            None => String::new(),
        };

        if body.is_some() {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body_text.clone());
        }

        log_request(method.as_str(), &url, &body_text);

        let response = request.send().await.map_err(|error| {
            tracing::error!("{method} {url} failed: {error}");
            ApiError::network(&error)
        })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|error| ApiError::network(&error))?;

        log_response(status, &url, &text);

        if !(200..300).contains(&status) {
            let error_body = ErrorBody::parse(&text);
            let session_expired = self.gate.inspect(status, &error_body)?;
            let error = ApiError::from_response(status, &error_body, session_expired);
            tracing::error!("{method} {url} returned {status}: {error}");

            return Err(error.into());
        }

        // Some endpoints reply with an empty body on success.
        let text = if text.trim().is_empty() { "{}" } else { &text };

        serde_json::from_str(text).map_err(|error| ApiError::decode(status, error).into())
    }

    fn url(&self, path: &str, query: Option<&ExpenseQuery>) -> Result<String, Error> {
        let url = format!("{}{path}", self.base_url);

        let Some(query) = query else {
            return Ok(url);
        };

        let query = serde_urlencoded::to_string(query)
            .map_err(|error| Error::Serialization(error.to_string()))?;

        if query.is_empty() {
            Ok(url)
        } else {
            Ok(format!("{url}?{query}"))
        }
    }
}

impl ExpenseApi for ApiClient {
    async fn list_expenses(&self, query: Option<&ExpenseQuery>) -> Result<Vec<Expense>, Error> {
        let response: ExpensesResponse = self
            .send(Method::GET, endpoints::EXPENSES, None::<&()>, query, Auth::Bearer)
            .await?;

        Ok(response.expenses)
    }

    async fn create_expense(&self, payload: &ExpensePayload) -> Result<(), Error> {
        self.send_for_message(Method::POST, endpoints::EXPENSES, Some(payload))
            .await
    }

    async fn update_expense(&self, id: &str, payload: &ExpensePayload) -> Result<(), Error> {
        let path = format_endpoint(endpoints::EXPENSE, id);

        self.send_for_message(Method::PUT, &path, Some(payload))
            .await
    }

    async fn delete_expense(&self, id: &str) -> Result<(), Error> {
        let path = format_endpoint(endpoints::EXPENSE, id);

        self.send_for_message(Method::DELETE, &path, None::<&()>)
            .await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, Error> {
        let response: CategoriesResponse = self
            .send(Method::GET, endpoints::CATEGORIES, None::<&()>, None, Auth::Bearer)
            .await?;

        Ok(response.categories)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use axum::{
        Json, Router,
        extract::State,
        http::{HeaderMap, StatusCode, Uri, header::AUTHORIZATION},
        routing::{delete, get, post},
    };
    use serde_json::{Value, json};
    use tokio::sync::mpsc::UnboundedReceiver;

    use crate::{
        Error,
        api::{ApiError, ApiErrorKind},
        auth::LogInRequest,
        config::ClientConfig,
        expense::{ExpenseApi, ExpenseQuery},
        session::{MemoryTokenStore, Session, SessionEvent, SessionGate},
    };

    use super::ApiClient;

    #[derive(Clone, Default)]
    struct Recorded(Arc<Mutex<Vec<String>>>);

    impl Recorded {
        fn push(&self, uri: &Uri, headers: &HeaderMap) {
            let auth = headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("no auth");

            self.0.lock().unwrap().push(format!("{uri} {auth}"));
        }

        fn requests(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        format!("http://{address}/api")
    }

    fn test_client(
        api_url: &str,
        token: Option<&str>,
    ) -> (ApiClient, UnboundedReceiver<SessionEvent>) {
        let session = match token {
            Some(token) => Session::load(MemoryTokenStore::with_token(token)).unwrap(),
            None => Session::in_memory(),
        };
        let config = ClientConfig {
            api_url: api_url.to_owned(),
            token_path: None,
            ..Default::default()
        };
        let (gate, events) = SessionGate::new(session.clone(), config.redirect_delay);

        (ApiClient::new(&config, session, gate).unwrap(), events)
    }

    #[test]
    fn rejects_invalid_url() {
        let session = Session::in_memory();
        let (gate, _events) = SessionGate::new(session.clone(), Default::default());
        let config = ClientConfig {
            api_url: "not a url".to_owned(),
            ..Default::default()
        };

        let result = ApiClient::new(&config, session, gate);

        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[tokio::test]
    async fn list_expenses_sends_token_and_query() {
        let recorded = Recorded::default();
        let router = Router::new()
            .route(
                "/api/expenses",
                get(
                    |State(recorded): State<Recorded>, uri: Uri, headers: HeaderMap| async move {
                        recorded.push(&uri, &headers);
                        Json(json!({"expenses": [{
                            "id": "e1",
                            "title": "Lunch",
                            "amount": 12.5,
                            "expense_date": "07-03-2025",
                            "expense_time": "01:30 PM"
                        }]}))
                    },
                ),
            )
            .with_state(recorded.clone());
        let (client, _events) = test_client(&serve(router).await, Some("token"));
        let query = ExpenseQuery {
            category_id: Some("A".to_owned()),
            start_date: Some("07-03-2025".to_owned()),
            ..Default::default()
        };

        let expenses = client.list_expenses(Some(&query)).await.unwrap();

        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].title, "Lunch");
        assert_eq!(
            recorded.requests(),
            vec!["/api/expenses?category_id=A&start_date=07-03-2025 Bearer token"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_is_waited_for() {
        let router = Router::new().route(
            "/api/categories",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(300)).await;
                Json(json!({"categories": [{"id": "A", "name": "Food"}]}))
            }),
        );
        let (client, _events) = test_client(&serve(router).await, Some("token"));

        let categories = client.list_categories().await.unwrap();

        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Food");
    }

    #[tokio::test]
    async fn log_in_stores_token() {
        let router = Router::new().route(
            "/api/login",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["email"], "me@example.com");
                Json(json!({"message": "Login successful", "token": "new-token"}))
            }),
        );
        let (client, _events) = test_client(&serve(router).await, None);
        let request = LogInRequest {
            email: "me@example.com".to_owned(),
            password: "secret".to_owned(),
        };

        let response = client.log_in(&request).await.unwrap();

        assert_eq!(response.message, "Login successful");
        assert_eq!(client.session().token().unwrap(), Some("new-token".to_owned()));
    }

    #[tokio::test]
    async fn authenticated_call_without_token_fails_locally() {
        let recorded = Recorded::default();
        let router = Router::new()
            .route(
                "/api/categories",
                get(
                    |State(recorded): State<Recorded>, uri: Uri, headers: HeaderMap| async move {
                        recorded.push(&uri, &headers);
                        Json(json!({"categories": []}))
                    },
                ),
            )
            .with_state(recorded.clone());
        let (client, _events) = test_client(&serve(router).await, None);

        let result = client.list_categories().await;

        assert_eq!(result, Err(Error::NotLoggedIn));
        assert!(recorded.requests().is_empty());
    }

    #[tokio::test]
    async fn expired_session_clears_token() {
        let router = Router::new().route(
            "/api/dashboard",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"error": "session_expired", "message": "Session expired"})),
                )
            }),
        );
        let (client, mut events) = test_client(&serve(router).await, Some("token"));

        let result = client.get_dashboard().await;

        let Err(Error::Api(error)) = result else {
            panic!("expected an API error, got {result:?}");
        };
        assert_eq!(error.kind, ApiErrorKind::SessionExpired);
        assert_eq!(client.session().token().unwrap(), None);
        assert!(matches!(events.recv().await, Some(SessionEvent::Expired(_))));
    }

    #[tokio::test]
    async fn plain_unauthorized_keeps_token() {
        let router = Router::new().route(
            "/api/profile",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"error": "Invalid token"})),
                )
            }),
        );
        let (client, mut events) = test_client(&serve(router).await, Some("token"));

        let result = client.get_profile().await;

        assert_eq!(
            result,
            Err(Error::Api(ApiError {
                kind: ApiErrorKind::Unauthorized,
                status: Some(401),
                message: "Invalid token".to_owned(),
            }))
        );
        assert!(client.session().is_logged_in());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn missing_expense_is_not_found() {
        let router = Router::new().route(
            "/api/expenses/{id}",
            delete(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"error": "Expense not found"})),
                )
            }),
        );
        let (client, _events) = test_client(&serve(router).await, Some("token"));

        let result = client.delete_expense("missing").await;

        let Err(Error::Api(error)) = result else {
            panic!("expected an API error, got {result:?}");
        };
        assert_eq!(error.kind, ApiErrorKind::NotFound);
        assert_eq!(error.message, "Expense not found");
    }

    #[tokio::test]
    async fn unexpected_body_is_decode_error() {
        let router = Router::new().route("/api/profile", get(|| async { "not json" }));
        let (client, _events) = test_client(&serve(router).await, Some("token"));

        let result = client.get_profile().await;

        let Err(Error::Api(error)) = result else {
            panic!("expected an API error, got {result:?}");
        };
        assert_eq!(error.kind, ApiErrorKind::Decode);
        assert_eq!(error.status, Some(200));
    }

    #[tokio::test]
    async fn unreachable_server_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);
        let (client, _events) = test_client(&format!("http://{address}/api"), Some("token"));

        let result = client.list_categories().await;

        let Err(Error::Api(error)) = result else {
            panic!("expected an API error, got {result:?}");
        };
        assert_eq!(error.kind, ApiErrorKind::Network);
    }

    #[tokio::test]
    async fn log_out_clears_token_even_when_backend_fails() {
        let router = Router::new().route(
            "/api/logout",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let (client, _events) = test_client(&serve(router).await, Some("token"));

        let result = client.log_out().await;

        assert!(result.is_err());
        assert!(!client.session().is_logged_in());
    }
}
