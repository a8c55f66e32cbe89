use std::env;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_REQUEST_ABORTS, CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS,
};
use crate::retry::RetryPolicy;
use crate::types::{
    ApiResult, AuthResponse, CategorizeStatus, ChatReply, ChatRequest, HealthReport, HealthStatus,
    LoginRequest, SettingChange, Settings, SignupRequest, User,
};
use crate::utils::time::now;

/// Base URL used when neither an explicit URL nor `FINCHAT_API_URL` is given.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Environment variable consulted for the base URL.
pub const API_URL_ENV: &str = "FINCHAT_API_URL";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the finance-assistant API.
///
/// Every endpoint method returns an [`ApiResult`]; nothing is thrown past
/// this boundary.  Idempotent reads go through the retry policy, writes are
/// sent exactly once.
#[derive(Clone)]
pub struct FinChat {
    client: ReqwestClient,
    base_url: String,
    timeout: Duration,
    retry: RetryPolicy,
    cancel: CancellationToken,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl fmt::Debug for FinChat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinChat")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl FinChat {
    /// Create a new client.
    ///
    /// The base URL can be provided directly or read from the
    /// `FINCHAT_API_URL` environment variable; it falls back to
    /// `http://localhost:8000`.
    pub fn new(base_url: Option<String>) -> Result<Self> {
        Self::with_options(base_url, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = match base_url {
            Some(url) => url,
            None => env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        };
        let base_url = normalize_base_url(&base_url)?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = build_http_client(timeout)?;

        Ok(Self {
            client,
            base_url,
            timeout,
            retry: RetryPolicy::default(),
            cancel: CancellationToken::new(),
            logger: None,
        })
    }

    /// Set the total number of attempts for retried calls.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.retry.max_attempts = max_attempts;
        self
    }

    /// Set the base unit of the exponential backoff.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.retry.base_delay = base_delay;
        self
    }

    /// Replace the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_http_client(timeout)?;
        self.timeout = timeout;
        Ok(self)
    }

    /// Attach a logger that observes every request.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Use `cancel` for all subsequent calls.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replace the cancellation token in place.
    ///
    /// A cancelled token stays cancelled, so callers install a fresh one
    /// before each interruptible operation.
    pub fn set_cancellation(&mut self, cancel: CancellationToken) {
        self.cancel = cancel;
    }

    /// The normalized base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The policy used by retried calls.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// The token that aborts in-flight calls.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Perform one JSON call against `endpoint`.
    pub async fn request<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        token: Option<&str>,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        ApiResult::from_exchange(self.call(method, endpoint, body, token).await)
    }

    /// Perform a JSON call, repeating it with exponential backoff on failure.
    ///
    /// The call is attempted at most `max_attempts` times.  Client errors are
    /// returned after the first attempt; otherwise the last error is returned
    /// once the attempts are exhausted.
    pub async fn request_with_retry<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        token: Option<&str>,
        max_attempts: u32,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let policy = RetryPolicy {
            max_attempts,
            ..self.retry
        };
        let exchange = policy
            .run(&self.cancel, |_| self.call(method.clone(), endpoint, body, token))
            .await;
        ApiResult::from_exchange(exchange)
    }

    /// Probe backend liveness with `POST /health`.
    ///
    /// Any 2xx answer is healthy.  A body that is not a health report
    /// yields an empty report rather than a failure.
    pub async fn health(&self) -> ApiResult<HealthReport> {
        let exchange = self
            .call_with::<_, ()>(Method::POST, "/health", None, None, |bytes| {
                Ok(serde_json::from_slice::<HealthReport>(bytes).unwrap_or_default())
            })
            .await;
        ApiResult::from_exchange(exchange)
    }

    /// Probe liveness and summarize it for display.
    pub async fn check_health(&self) -> HealthStatus {
        let result = self.health().await;
        if result.success {
            HealthStatus::healthy(now())
        } else {
            let message = match result.status {
                Some(status) => format!("Server responded with status: {status}"),
                None => result.error_or("Unknown error").to_string(),
            };
            HealthStatus::unhealthy(now(), message)
        }
    }

    /// Exchange credentials for a bearer token.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.request(Method::POST, "/auth/login", Some(&body), None)
            .await
    }

    /// Create an account and receive a bearer token.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let body = SignupRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.request(Method::POST, "/auth/signup", Some(&body), None)
            .await
    }

    /// Fetch the identity behind `token`.
    pub async fn me(&self, token: &str) -> ApiResult<User> {
        self.request_with_retry::<User, ()>(
            Method::GET,
            "/auth/me",
            None,
            Some(token),
            self.retry.max_attempts,
        )
        .await
    }

    /// Fetch notification preferences.
    pub async fn get_settings(&self, token: &str) -> ApiResult<Settings> {
        self.request_with_retry::<Settings, ()>(
            Method::GET,
            "/settings",
            None,
            Some(token),
            self.retry.max_attempts,
        )
        .await
    }

    /// Store notification preferences.
    pub async fn update_settings(
        &self,
        token: &str,
        settings: &Settings,
    ) -> ApiResult<serde_json::Value> {
        self.request(Method::PUT, "/settings", Some(settings), Some(token))
            .await
    }

    /// Apply one change to the stored preferences.
    ///
    /// `cached` is used as the base when present; otherwise the current
    /// preferences are fetched first.  When they cannot be fetched nothing
    /// is written and the fetch failure is returned.
    pub async fn change_setting(
        &self,
        token: &str,
        cached: Option<Settings>,
        change: SettingChange,
    ) -> ApiResult<Settings> {
        let mut settings = match cached {
            Some(settings) => settings,
            None => match self.get_settings(token).await.into_result() {
                Ok(settings) => settings,
                Err(err) => return ApiResult::err(err),
            },
        };
        settings.apply(change);
        self.update_settings(token, &settings)
            .await
            .map(|_| settings)
    }

    /// Ask the backend to send a test notification email.
    pub async fn send_test_email(&self, token: &str) -> ApiResult<serde_json::Value> {
        self.request::<_, ()>(Method::POST, "/settings/send-test-email", None, Some(token))
            .await
    }

    /// Send one chat message and wait for the assistant's reply.
    pub async fn chat(&self, message: &str, token: Option<&str>) -> ApiResult<ChatReply> {
        let body = ChatRequest {
            message: message.to_string(),
        };
        self.request(Method::POST, "/chat", Some(&body), token)
            .await
    }

    /// Upload a transaction CSV for categorization.
    ///
    /// Anything without a `.csv` extension is rejected before the file is
    /// read or any connection is opened.
    pub async fn categorize(&self, path: &Path, token: Option<&str>) -> ApiResult<CategorizeStatus> {
        ApiResult::from_exchange(self.upload_csv(path, token).await)
    }

    async fn upload_csv(
        &self,
        path: &Path,
        token: Option<&str>,
    ) -> Result<(u16, CategorizeStatus)> {
        let file_name = csv_file_name(path)?;
        let contents = tokio::fs::read(path)
            .await
            .map_err(|err| Error::io(format!("failed to read {}", path.display()), err))?;
        let part = Part::bytes(contents)
            .file_name(file_name)
            .mime_str("text/csv")
            .map_err(|e| Error::http_client(format!("invalid mime type: {e}"), Some(Box::new(e))))?;
        let form = Form::new().part("file", part);

        let url = self.url_for("/categorize");
        let builder = self
            .authorized(Method::POST, &url, token)?
            .multipart(form);
        self.execute(Method::POST, &url, builder, decode_json).await
    }

    async fn call<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        token: Option<&str>,
    ) -> Result<(u16, T)>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.call_with(method, endpoint, body, token, decode_json)
            .await
    }

    /// Send a JSON call and hand a 2xx body to `decode`.
    async fn call_with<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        token: Option<&str>,
        decode: impl FnOnce(&[u8]) -> Result<T>,
    ) -> Result<(u16, T)>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url_for(endpoint);
        let mut builder = self.authorized(method.clone(), &url, token)?;
        builder = match body {
            Some(body) => builder.json(body),
            None => builder.header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            ),
        };
        self.execute(method, &url, builder, decode).await
    }

    /// Send `builder`, classify the outcome, and decode a 2xx body.
    ///
    /// Returns the success status alongside the decoded value.
    async fn execute<T>(
        &self,
        method: Method,
        url: &str,
        builder: RequestBuilder,
        decode: impl FnOnce(&[u8]) -> Result<T>,
    ) -> Result<(u16, T)> {
        CLIENT_REQUESTS.click();
        if let Some(logger) = &self.logger {
            logger.log_request(&method, url);
        }
        tracing::debug!(%method, url, "sending request");
        let start = Instant::now();

        let exchange = async {
            let response = builder.send().await.map_err(|e| self.transport_error(e))?;
            let status = response.status();
            if !status.is_success() {
                return Err(Self::process_error_response(response).await);
            }
            let bytes = response.bytes().await.map_err(|e| {
                Error::http_client(format!("Failed to read response: {}", e), Some(Box::new(e)))
            })?;
            Ok::<_, Error>((status.as_u16(), decode(&bytes)?))
        };

        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::abort("request cancelled")),
            outcome = exchange => outcome,
        };

        let elapsed = start.elapsed();
        CLIENT_REQUEST_DURATION.add(elapsed.as_secs_f64());
        match outcome {
            Ok((status, value)) => {
                tracing::debug!(%method, url, status, ?elapsed, "request succeeded");
                if let Some(logger) = &self.logger {
                    logger.log_response(&method, url, status, elapsed);
                }
                Ok((status, value))
            }
            Err(err) => {
                if err.is_abort() {
                    CLIENT_REQUEST_ABORTS.click();
                } else {
                    CLIENT_REQUEST_ERRORS.click();
                }
                tracing::info!(%method, url, status = err.status_code(), error = %err, "request failed");
                if let Some(logger) = &self.logger {
                    logger.log_failure(&method, url, &err);
                }
                Err(err)
            }
        }
    }

    fn url_for(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    /// Start a request with the default headers and an optional bearer token.
    fn authorized(&self, method: Method, url: &str, token: Option<&str>) -> Result<RequestBuilder> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                Error::validation("bearer token contains invalid characters", None)
            })?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(self.client.request(method, url).headers(headers))
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        // An empty message lets callers pick their own wording.
        let message = error_message_from_body(&error_body).unwrap_or_default();
        Error::from_status(status_code, message, retry_after)
    }
}

fn build_http_client(timeout: Duration) -> Result<ReqwestClient> {
    ReqwestClient::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {}", e),
                Some(Box::new(e)),
            )
        })
}

/// Validate a base URL and strip its trailing slash.
fn normalize_base_url(base_url: &str) -> Result<String> {
    let trimmed = base_url.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::url(
            format!("unsupported scheme '{}' in base URL", parsed.scheme()),
            None,
        ));
    }
    Ok(trimmed.to_string())
}

/// Decode a success body; an empty body decodes as JSON `null`.
fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        bytes
    };
    serde_json::from_slice(body).map_err(|e| {
        Error::serialization(
            format!("Failed to parse response: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Pull a human-readable message out of an error body.
///
/// The backend answers with either `{"message": ...}` or the web framework's
/// default `{"detail": ...}`.
fn error_message_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "detail", "error"]
        .iter()
        .filter_map(|key| value.get(*key))
        .find_map(|field| field.as_str())
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(String::from)
}

/// True when `path` has a `.csv` extension, in any case.
pub(crate) fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// The file name to upload, or a validation error for non-CSV paths.
fn csv_file_name(path: &Path) -> Result<String> {
    if !is_csv(path) {
        return Err(Error::validation(
            format!("only .csv files can be categorized: {}", path.display()),
            Some("file".to_string()),
        ));
    }
    path.file_name()
        .and_then(|name| name.to_str())
        .map(String::from)
        .ok_or_else(|| Error::validation("file name is not valid UTF-8", Some("file".to_string())))
}
