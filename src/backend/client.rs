use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::traits::ChatTransport;
use super::types::{
    AuthSession, ChatReply, ChatRequest, ErrorBody, ExchangeOutcome, LoginRequest, Preferences,
    Profile, ProfileEnvelope, RegistrationForm,
};
use crate::app::ServerConfig;
use crate::constants::{
    CHAT_PATH, DB_HEALTH_PATH, HEALTH_PATH, LLM_HEALTH_PATH, LOAD_PREFERENCES_FAILED_MESSAGE, LOGIN_FAILED_MESSAGE, LOGIN_PATH,
    LOGOUT_FAILED_MESSAGE, LOGOUT_PATH, PREFERENCES_PATH, PROFILE_FAILED_MESSAGE, PROFILE_PATH,
    REGISTER_PATH, REGISTRATION_FAILED_MESSAGE, SAVE_PREFERENCES_FAILED_MESSAGE,
};
use crate::utils::ClientError;

/// HTTP gateway to the meal-planning backend
///
/// One `reqwest::Client` with a cookie jar serves every route, so a login
/// cookie set by the server rides along on later calls. A stored bearer
/// token is attached as well.
pub struct BackendClient {
    client: Client,
    base_url: Url,
    token: RwLock<Option<String>>,
}

impl BackendClient {
    /// Create a client for the configured server, optionally already logged in
    pub fn new(config: &ServerConfig, token: Option<String>) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ClientError::Config(format!("invalid server URL '{}': {}", config.base_url, e))
        })?;

        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: RwLock::new(token),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Token currently attached to requests
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token.read().as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Log in with email and password; the returned token is kept for later calls
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ClientError> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        self.authenticate(LOGIN_PATH, &request, LOGIN_FAILED_MESSAGE)
            .await
    }

    /// Create an account; the backend logs the new user in straight away
    pub async fn register(&self, form: &RegistrationForm) -> Result<AuthSession, ClientError> {
        let request = form.validate()?;
        self.authenticate(REGISTER_PATH, &request, REGISTRATION_FAILED_MESSAGE)
            .await
    }

    async fn authenticate(
        &self,
        path: &str,
        request: &LoginRequest,
        fallback: &str,
    ) -> Result<AuthSession, ClientError> {
        let response = self.client.post(self.url(path)).json(request).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), path, "authentication rejected");
            return Err(api_failure(status, &bytes, fallback));
        }

        let session: AuthSession = decode(&bytes)?;
        self.set_token(Some(session.token.clone()));
        info!(email = %session.user.email, "authenticated");
        Ok(session)
    }

    /// Ask the backend to end the session and forget the local token
    pub async fn logout(&self) -> Result<(), ClientError> {
        let response = self
            .authorized(self.client.post(self.url(LOGOUT_PATH)))
            .send()
            .await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        self.set_token(None);

        if !status.is_success() {
            return Err(api_failure(status, &bytes, LOGOUT_FAILED_MESSAGE));
        }
        Ok(())
    }

    /// Fetch the stored meal preferences
    pub async fn preferences(&self) -> Result<Preferences, ClientError> {
        self.protected(
            self.client.get(self.url(PREFERENCES_PATH)),
            LOAD_PREFERENCES_FAILED_MESSAGE,
        )
        .await
    }

    /// Replace the stored meal preferences
    pub async fn update_preferences(&self, preferences: &Preferences) -> Result<(), ClientError> {
        self.protected::<serde_json::Value>(
            self.client.put(self.url(PREFERENCES_PATH)).json(preferences),
            SAVE_PREFERENCES_FAILED_MESSAGE,
        )
        .await?;
        Ok(())
    }

    /// Fetch the logged-in user's profile
    pub async fn profile(&self) -> Result<Profile, ClientError> {
        let envelope: ProfileEnvelope = self
            .protected(self.client.get(self.url(PROFILE_PATH)), PROFILE_FAILED_MESSAGE)
            .await?;
        Ok(envelope.user)
    }

    /// True when the backend answers its health route with success
    pub async fn health(&self) -> bool {
        self.check_health(HEALTH_PATH).await
    }

    /// True when the backend reports its database as reachable
    pub async fn database_health(&self) -> bool {
        self.check_health(DB_HEALTH_PATH).await
    }

    /// True when the backend reports its language model as reachable
    pub async fn llm_health(&self) -> bool {
        self.check_health(LLM_HEALTH_PATH).await
    }

    async fn check_health(&self, path: &str) -> bool {
        match self.client.get(self.url(path)).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, path, "health check failed");
                false
            }
        }
    }

    /// Send an authenticated request and decode a success body
    async fn protected<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<T, ClientError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::NotAuthenticated);
        }

        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(api_failure(status, &bytes, fallback));
        }
        decode(&bytes)
    }
}

#[async_trait]
impl ChatTransport for BackendClient {
    async fn send_message(&self, message: &str) -> ExchangeOutcome {
        let body = ChatRequest {
            message: message.to_string(),
        };

        let response = match self
            .authorized(self.client.post(self.url(CHAT_PATH)))
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "chat request got no response");
                return ExchangeOutcome::TransportFailure {
                    detail: e.to_string(),
                };
            }
        };

        let status = response.status();
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "chat response body was cut off");
                return ExchangeOutcome::TransportFailure {
                    detail: e.to_string(),
                };
            }
        };

        if !status.is_success() {
            let message = ErrorBody::parse(&bytes).message;
            warn!(status = status.as_u16(), ?message, "chat request failed");
            return ExchangeOutcome::ServerFailure {
                status: Some(status.as_u16()),
                message: message.filter(|m| !m.trim().is_empty()),
            };
        }

        match serde_json::from_slice::<ChatReply>(&bytes) {
            Ok(reply) => ExchangeOutcome::Success {
                reply: reply.response,
                usage: reply.usage,
            },
            Err(e) => {
                warn!(error = %e, "chat reply was not understood");
                ExchangeOutcome::ServerFailure {
                    status: Some(status.as_u16()),
                    message: None,
                }
            }
        }
    }
}

fn api_failure(status: StatusCode, body: &[u8], fallback: &str) -> ClientError {
    ClientError::Api {
        status: status.as_u16(),
        message: ErrorBody::parse(body)
            .into_message()
            .unwrap_or_else(|| fallback.to_string()),
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ClientError> {
    serde_json::from_slice(bytes).map_err(|e| ClientError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::UsageSnapshot;
    use axum::{
        extract::State,
        http::{header::AUTHORIZATION, HeaderMap, StatusCode as HttpStatus},
        response::{IntoResponse, Response},
        routing::{get, post},
        Json, Router,
    };
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    #[derive(Clone, Default)]
    struct ServerState {
        chat_auth: Arc<Mutex<Vec<Option<String>>>>,
        chat_bodies: Arc<Mutex<Vec<ChatRequest>>>,
        preferences: Arc<Mutex<Preferences>>,
    }

    fn bearer(headers: &HeaderMap) -> Option<String> {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    async fn chat(
        State(state): State<ServerState>,
        headers: HeaderMap,
        Json(request): Json<ChatRequest>,
    ) -> Response {
        state.chat_auth.lock().push(bearer(&headers));
        state.chat_bodies.lock().push(request.clone());

        match request.message.as_str() {
            "over quota" => (
                HttpStatus::TOO_MANY_REQUESTS,
                Json(json!({"status": "error", "message": "quota exceeded"})),
            )
                .into_response(),
            "crash" => (HttpStatus::BAD_GATEWAY, "<html>upstream down</html>").into_response(),
            "garbled" => (HttpStatus::OK, "not json").into_response(),
            "no usage" => Json(json!({"status": "ok", "response": "plain reply"})).into_response(),
            "partial usage" => Json(json!({
                "status": "ok",
                "response": "Try fried rice",
                "usage": {"used": 1}
            }))
            .into_response(),
            other => Json(json!({
                "status": "ok",
                "response": format!("echo: {}", other),
                "usage": {"used": 3, "remaining": 7, "limit": 10}
            }))
            .into_response(),
        }
    }

    async fn login(Json(request): Json<serde_json::Value>) -> Response {
        if request["password"] == "secret1" {
            Json(json!({
                "status": "ok",
                "message": "Login successful",
                "token": "jwt-1",
                "user": {"id": 7, "email": request["email"]}
            }))
            .into_response()
        } else {
            (
                HttpStatus::UNAUTHORIZED,
                Json(json!({"status": "error", "message": "Invalid credentials"})),
            )
                .into_response()
        }
    }

    fn is_authorized(headers: &HeaderMap) -> bool {
        bearer(headers).as_deref() == Some("Bearer jwt-1")
    }

    async fn get_preferences(State(state): State<ServerState>, headers: HeaderMap) -> Response {
        if !is_authorized(&headers) {
            return (
                HttpStatus::UNAUTHORIZED,
                Json(json!({"status": "error", "message": "Authorization header required"})),
            )
                .into_response();
        }
        let prefs = state.preferences.lock().clone();
        Json(json!({
            "status": "ok",
            "dietary_restrictions": prefs.dietary_restrictions,
            "max_cooking_time": prefs.max_cooking_time
        }))
        .into_response()
    }

    async fn put_preferences(
        State(state): State<ServerState>,
        headers: HeaderMap,
        Json(prefs): Json<Preferences>,
    ) -> Response {
        if !is_authorized(&headers) {
            return HttpStatus::UNAUTHORIZED.into_response();
        }
        *state.preferences.lock() = prefs;
        Json(json!({"status": "ok", "message": "Preferences updated"})).into_response()
    }

    async fn profile(headers: HeaderMap) -> Response {
        if !is_authorized(&headers) {
            return HttpStatus::UNAUTHORIZED.into_response();
        }
        Json(json!({"status": "ok", "user": {"id": 7, "email": "cook@example.com"}}))
            .into_response()
    }

    async fn spawn_backend() -> (String, ServerState) {
        let state = ServerState::default();
        let app = Router::new()
            .route("/llm", post(chat))
            .route("/auth/login", post(login))
            .route("/auth/register", post(login))
            .route(
                "/auth/logout",
                post(|| async { Json(json!({"status": "ok"})) }),
            )
            .route("/api/preferences", get(get_preferences).put(put_preferences))
            .route("/api/profile", get(profile))
            .route("/health", get(|| async { Json(json!({"status": "ok"})) }))
            .route("/health/db", get(|| async { Json(json!({"status": "ok"})) }))
            .route(
                "/health/llm",
                get(|| async {
                    (
                        HttpStatus::SERVICE_UNAVAILABLE,
                        Json(json!({"status": "error", "message": "LLM unreachable"})),
                    )
                }),
            )
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{}", addr), state)
    }

    fn client_for(base_url: &str, token: Option<&str>) -> BackendClient {
        let config = ServerConfig {
            base_url: base_url.to_string(),
            request_timeout_secs: 5,
            connect_timeout_secs: 2,
        };
        BackendClient::new(&config, token.map(str::to_string)).unwrap()
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let config = ServerConfig {
            base_url: "not a url".to_string(),
            ..ServerConfig::default()
        };
        assert!(matches!(
            BackendClient::new(&config, None),
            Err(ClientError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_chat_success_carries_reply_and_usage() {
        let (url, state) = spawn_backend().await;
        let client = client_for(&url, Some("jwt-1"));

        let outcome = client.send_message("I have chicken and rice").await;
        assert_eq!(
            outcome,
            ExchangeOutcome::Success {
                reply: "echo: I have chicken and rice".to_string(),
                usage: Some(UsageSnapshot { used: 3, remaining: 7, limit: 10 }),
            }
        );
        assert_eq!(
            state.chat_bodies.lock().clone(),
            vec![ChatRequest { message: "I have chicken and rice".to_string() }]
        );
        assert_eq!(
            state.chat_auth.lock().clone(),
            vec![Some("Bearer jwt-1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_chat_success_without_usage() {
        let (url, _state) = spawn_backend().await;
        let outcome = client_for(&url, None).send_message("no usage").await;
        assert_eq!(
            outcome,
            ExchangeOutcome::Success {
                reply: "plain reply".to_string(),
                usage: None,
            }
        );
    }

    #[tokio::test]
    async fn test_chat_reply_survives_partial_usage() {
        let (url, _state) = spawn_backend().await;
        let outcome = client_for(&url, None).send_message("partial usage").await;
        assert_eq!(
            outcome,
            ExchangeOutcome::Success {
                reply: "Try fried rice".to_string(),
                usage: None,
            }
        );
    }

    #[tokio::test]
    async fn test_chat_server_failure_message() {
        let (url, _state) = spawn_backend().await;
        let outcome = client_for(&url, None).send_message("over quota").await;
        assert_eq!(
            outcome,
            ExchangeOutcome::ServerFailure {
                status: Some(429),
                message: Some("quota exceeded".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_chat_server_failure_without_json() {
        let (url, _state) = spawn_backend().await;
        let client = client_for(&url, None);

        assert_eq!(
            client.send_message("crash").await,
            ExchangeOutcome::ServerFailure {
                status: Some(502),
                message: None,
            }
        );
        assert_eq!(
            client.send_message("garbled").await,
            ExchangeOutcome::ServerFailure {
                status: Some(200),
                message: None,
            }
        );
    }

    #[tokio::test]
    async fn test_chat_transport_failure_when_nothing_listens() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let outcome = client_for(&format!("http://{}", addr), None)
            .send_message("hello")
            .await;
        match outcome {
            ExchangeOutcome::TransportFailure { detail } => assert!(!detail.is_empty()),
            other => panic!("Expected transport failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_login_keeps_token_for_protected_routes() {
        let (url, state) = spawn_backend().await;
        let client = client_for(&url, None);

        assert!(matches!(
            client.preferences().await,
            Err(ClientError::NotAuthenticated)
        ));

        let session = client.login("cook@example.com", "secret1").await.unwrap();
        assert_eq!(session.token, "jwt-1");
        assert_eq!(session.user.email, "cook@example.com");
        assert_eq!(client.token().as_deref(), Some("jwt-1"));

        let prefs = Preferences {
            dietary_restrictions: "vegetarian".to_string(),
            max_cooking_time: 30,
        };
        client.update_preferences(&prefs).await.unwrap();
        assert_eq!(state.preferences.lock().clone(), prefs);
        assert_eq!(client.preferences().await.unwrap(), prefs);

        assert_eq!(client.profile().await.unwrap().id, 7);
    }

    #[tokio::test]
    async fn test_login_failure_uses_server_message() {
        let (url, _state) = spawn_backend().await;
        let client = client_for(&url, None);

        let err = client.login("cook@example.com", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
        assert_eq!(err.status(), Some(401));
        assert!(client.token().is_none());
    }

    #[tokio::test]
    async fn test_register_validates_before_sending() {
        let (url, _state) = spawn_backend().await;
        let client = client_for(&url, None);

        let form = RegistrationForm {
            email: "cook@example.com".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret2".to_string(),
        };
        assert!(matches!(
            client.register(&form).await,
            Err(ClientError::Validation(_))
        ));

        let form = RegistrationForm {
            confirm_password: "secret1".to_string(),
            ..form
        };
        let session = client.register(&form).await.unwrap();
        assert_eq!(session.token, "jwt-1");
    }

    #[tokio::test]
    async fn test_logout_and_health() {
        let (url, _state) = spawn_backend().await;
        let client = client_for(&url, Some("jwt-1"));

        assert!(client.health().await);
        assert!(client.database_health().await);
        assert!(!client.llm_health().await);
        client.logout().await.unwrap();
        assert!(client.token().is_none());
    }
}
