//! Common Test Utilities
//!
//! An in-process finance-assistant backend built on axum.  Every handler
//! records that it was hit so tests can count attempts.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use finchat::FinChat;

/// The only token the mock backend accepts.
pub const TOKEN: &str = "abc";

/// The only password the mock backend accepts.
pub const PASSWORD: &str = "secret";

/// A password the mock backend rejects with an empty JSON body.
pub const SILENT_PASSWORD: &str = "hush";

/// What the mock backend has seen.
#[derive(Debug, Default)]
pub struct MockState {
    hits: Mutex<Vec<String>>,
    authorization: Mutex<Option<String>>,
    content_type: Mutex<Option<String>>,
    settings_body: Mutex<Option<Value>>,
    upload: Mutex<Option<(String, String, String)>>,
}

impl MockState {
    fn hit(&self, path: &str, headers: &HeaderMap) {
        self.hits.lock().unwrap().push(path.to_string());
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(String::from);
        *self.authorization.lock().unwrap() = authorization;
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(String::from);
        *self.content_type.lock().unwrap() = content_type;
    }

    /// Number of requests that reached `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().iter().filter(|hit| *hit == path).count()
    }

    /// Number of requests that reached any route.
    pub fn total_hits(&self) -> usize {
        self.hits.lock().unwrap().len()
    }

    /// The `Authorization` header of the most recent request.
    pub fn last_authorization(&self) -> Option<String> {
        self.authorization.lock().unwrap().clone()
    }

    /// The `Content-Type` header of the most recent request.
    pub fn last_content_type(&self) -> Option<String> {
        self.content_type.lock().unwrap().clone()
    }

    /// The last body stored with `PUT /settings`.
    pub fn settings_body(&self) -> Option<Value> {
        self.settings_body.lock().unwrap().clone()
    }

    /// Field name, file name and contents of the last upload.
    pub fn upload(&self) -> Option<(String, String, String)> {
        self.upload.lock().unwrap().clone()
    }
}

/// A running mock backend.
pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockBackend {
    /// Bind an ephemeral port and serve the mock routes on it.
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let router = Router::new()
            .route("/health", post(health))
            .route("/plain/health", post(plain_health))
            .route("/auth/login", post(login))
            .route("/auth/signup", post(signup))
            .route("/auth/me", get(me))
            .route("/settings", get(get_settings).put(put_settings))
            .route("/settings/send-test-email", post(send_test_email))
            .route("/chat", post(chat))
            .route("/categorize", post(categorize))
            .route("/flaky/500", get(flaky_500))
            .route("/flaky/404", get(flaky_404))
            .route("/flaky/503", get(flaky_503))
            .route("/slow", get(slow))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// A client for this backend with a fast backoff.
    pub fn client(&self) -> FinChat {
        FinChat::new(Some(self.base_url.clone()))
            .unwrap()
            .with_base_delay(Duration::from_millis(5))
    }
}

fn user(id: i64, name: &str, email: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "email": email,
        "created_at": "2025-06-01T09:30:00",
    })
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some(format!("Bearer {TOKEN}").as_str())
}

async fn health(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.hit("/health", &headers);
    Json(json!({ "status": "healthy", "version": "1.0.0" })).into_response()
}

async fn plain_health(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.hit("/plain/health", &headers);
    (StatusCode::OK, "OK").into_response()
}

async fn login(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.hit("/auth/login", &headers);
    if body["password"] == SILENT_PASSWORD {
        return (StatusCode::UNAUTHORIZED, Json(json!({}))).into_response();
    }
    if body["password"] != PASSWORD {
        return detail(StatusCode::UNAUTHORIZED, "Incorrect email or password");
    }
    let email = body["email"].as_str().unwrap_or_default();
    Json(json!({
        "access_token": TOKEN,
        "token_type": "bearer",
        "user": user(1, "Ada", email),
    }))
    .into_response()
}

async fn signup(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.hit("/auth/signup", &headers);
    let email = body["email"].as_str().unwrap_or_default();
    if email == "taken@example.com" {
        return detail(StatusCode::BAD_REQUEST, "Email already registered");
    }
    let name = body["name"].as_str().unwrap_or_default();
    Json(json!({
        "access_token": TOKEN,
        "token_type": "bearer",
        "user": user(2, name, email),
        "message": "Welcome aboard",
    }))
    .into_response()
}

async fn me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.hit("/auth/me", &headers);
    if !authorized(&headers) {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    }
    Json(user(1, "Ada", "ada@example.com")).into_response()
}

async fn get_settings(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.hit("/settings", &headers);
    if !authorized(&headers) {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    }
    Json(json!({
        "name": "Ada",
        "email": "ada@example.com",
        "email_notifications": true,
        "weekly_reports": true,
        "monthly_reports": false,
    }))
    .into_response()
}

async fn put_settings(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.hit("/settings", &headers);
    if !authorized(&headers) {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    }
    *state.settings_body.lock().unwrap() = Some(body);
    Json(json!({ "message": "Settings updated" })).into_response()
}

async fn send_test_email(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.hit("/settings/send-test-email", &headers);
    if !authorized(&headers) {
        return detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    }
    Json(json!({ "message": "Test email sent" })).into_response()
}

async fn chat(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.hit("/chat", &headers);
    let message = body["message"].as_str().unwrap_or_default();
    Json(json!({ "reply": format!("echo: {message}") })).into_response()
}

async fn categorize(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    state.hit("/categorize", &headers);
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let contents = field.text().await.unwrap();
        *state.upload.lock().unwrap() = Some((name, file_name, contents));
    }
    Json(json!({ "status": "successed" })).into_response()
}

async fn flaky_500(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.hit("/flaky/500", &headers);
    detail(StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn flaky_404(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.hit("/flaky/404", &headers);
    detail(StatusCode::NOT_FOUND, "no such thing")
}

async fn flaky_503(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.hit("/flaky/503", &headers);
    detail(StatusCode::SERVICE_UNAVAILABLE, "upstream returned 404")
}

async fn slow(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.hit("/slow", &headers);
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({})).into_response()
}
