//! Error types for the finchat SDK.
//!
//! Every failure that can happen while talking to the finance-assistant
//! backend is classified into one [`Error`] variant.  Variants that originate
//! from an HTTP response remember the real status code, so callers can decide
//! what to do (retry, log out, show a message) without inspecting text.

use std::error;
use std::fmt;
use std::io;
use std::str::Utf8Error;
use std::sync::Arc;

/// The main error type for the finchat SDK.
#[derive(Clone, Debug)]
pub enum Error {
    /// An HTTP error status without a more specific variant.
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Human-readable error message.
        message: String,
    },

    /// The server rejected the credentials or bearer token (401).
    Authentication {
        /// Human-readable error message.
        message: String,
    },

    /// The authenticated user may not perform the operation (403).
    Permission {
        /// Human-readable error message.
        message: String,
    },

    /// Resource not found (404).
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// The request was malformed or failed server-side validation (400/422).
    BadRequest {
        /// HTTP status code.
        status_code: u16,
        /// Human-readable error message.
        message: String,
    },

    /// Rate limit exceeded (429).
    RateLimit {
        /// Human-readable error message.
        message: String,
        /// Time to wait before retrying, in seconds.
        retry_after: Option<u64>,
    },

    /// The request did not complete in time, either on the client or as a
    /// 408 from the server.
    Timeout {
        /// Human-readable error message.
        message: String,
        /// Duration of the timeout in seconds.
        duration: Option<f64>,
        /// 408 when the server reported the timeout.
        status_code: Option<u16>,
    },

    /// Request was cancelled by the caller.
    Abort {
        /// Human-readable error message.
        message: String,
    },

    /// No response was received.
    Connection {
        /// Human-readable error message.
        message: String,
        /// Underlying cause.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// Server returned a 500 internal error.
    InternalServer {
        /// Human-readable error message.
        message: String,
    },

    /// Server is overloaded or unavailable (502-504).
    ServiceUnavailable {
        /// HTTP status code.
        status_code: u16,
        /// Human-readable error message.
        message: String,
        /// Time to wait before retrying, in seconds.
        retry_after: Option<u64>,
    },

    /// Error during JSON serialization or deserialization.
    Serialization {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// I/O error.
    Io {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Arc<io::Error>,
    },

    /// HTTP client error.
    HttpClient {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// Input rejected locally before any request was made.
    Validation {
        /// Human-readable error message.
        message: String,
        /// Parameter that failed validation.
        param: Option<String>,
    },

    /// A URL parsing or manipulation error.
    Url {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<url::ParseError>,
    },

    /// Unknown error.
    Unknown {
        /// Human-readable error message.
        message: String,
    },
}

impl Error {
    /// Creates a new API error.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Error::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Creates a new authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Error::Authentication {
            message: message.into(),
        }
    }

    /// Creates a new permission error.
    pub fn permission(message: impl Into<String>) -> Self {
        Error::Permission {
            message: message.into(),
        }
    }

    /// Creates a new not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound {
            message: message.into(),
        }
    }

    /// Creates a new bad request error.
    pub fn bad_request(status_code: u16, message: impl Into<String>) -> Self {
        Error::BadRequest {
            status_code,
            message: message.into(),
        }
    }

    /// Creates a new rate limit error.
    pub fn rate_limit(message: impl Into<String>, retry_after: Option<u64>) -> Self {
        Error::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    /// Creates a new timeout error.
    pub fn timeout(message: impl Into<String>, duration: Option<f64>) -> Self {
        Error::Timeout {
            message: message.into(),
            duration,
            status_code: None,
        }
    }

    /// Creates a new abort error.
    pub fn abort(message: impl Into<String>) -> Self {
        Error::Abort {
            message: message.into(),
        }
    }

    /// Creates a new connection error.
    pub fn connection(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Connection {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new internal server error.
    pub fn internal_server(message: impl Into<String>) -> Self {
        Error::InternalServer {
            message: message.into(),
        }
    }

    /// Creates a new service unavailable error.
    pub fn service_unavailable(
        status_code: u16,
        message: impl Into<String>,
        retry_after: Option<u64>,
    ) -> Self {
        Error::ServiceUnavailable {
            status_code,
            message: message.into(),
            retry_after,
        }
    }

    /// Creates a new serialization error.
    pub fn serialization(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new I/O error.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            message: message.into(),
            source: Arc::new(source),
        }
    }

    /// Creates a new HTTP client error.
    pub fn http_client(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::HttpClient {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new validation error.
    pub fn validation(message: impl Into<String>, param: Option<String>) -> Self {
        Error::Validation {
            message: message.into(),
            param,
        }
    }

    /// Creates a new URL error.
    pub fn url(message: impl Into<String>, source: Option<url::ParseError>) -> Self {
        Error::Url {
            message: message.into(),
            source,
        }
    }

    /// Creates a new unknown error.
    pub fn unknown(message: impl Into<String>) -> Self {
        Error::Unknown {
            message: message.into(),
        }
    }

    /// Maps an HTTP error status to the matching variant.
    pub fn from_status(status_code: u16, message: String, retry_after: Option<u64>) -> Self {
        match status_code {
            400 | 422 => Error::bad_request(status_code, message),
            401 => Error::authentication(message),
            403 => Error::permission(message),
            404 => Error::not_found(message),
            408 => Error::Timeout {
                message,
                duration: None,
                status_code: Some(408),
            },
            429 => Error::rate_limit(message, retry_after),
            500 => Error::internal_server(message),
            502..=504 => Error::service_unavailable(status_code, message, retry_after),
            _ => Error::api(status_code, message),
        }
    }

    /// Returns true if this error is related to authentication.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::Authentication { .. })
    }

    /// Returns true if this error is related to permissions.
    pub fn is_permission(&self) -> bool {
        matches!(self, Error::Permission { .. })
    }

    /// Returns true if this error is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Returns true if this error is related to rate limiting.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Error::RateLimit { .. })
    }

    /// Returns true if this error is a bad request.
    pub fn is_bad_request(&self) -> bool {
        matches!(self, Error::BadRequest { .. })
    }

    /// Returns true if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Returns true if this error is an abort.
    pub fn is_abort(&self) -> bool {
        matches!(self, Error::Abort { .. })
    }

    /// Returns true if this error is a connection error.
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection { .. })
    }

    /// Returns true if this error is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// Returns true if this error is a server error.
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_some_and(|status| status >= 500)
    }

    /// Returns true when the server answered with an error status.
    ///
    /// Transport failures (no response at all) are not rejections.
    pub fn is_rejection(&self) -> bool {
        self.status_code().is_some()
    }

    /// Returns true for 4xx statuses that repeating the request cannot fix.
    ///
    /// 408 and 429 are transient and therefore excluded.
    pub fn is_client_error(&self) -> bool {
        self.status_code()
            .is_some_and(|status| (400..500).contains(&status) && status != 408 && status != 429)
    }

    /// Returns true if repeating the request may succeed.
    pub fn is_retryable(&self) -> bool {
        !(self.is_client_error()
            || matches!(
                self,
                Error::Abort { .. } | Error::Validation { .. } | Error::Url { .. }
            ))
    }

    /// Returns the HTTP status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status_code, .. } => Some(*status_code),
            Error::Authentication { .. } => Some(401),
            Error::Permission { .. } => Some(403),
            Error::NotFound { .. } => Some(404),
            Error::BadRequest { status_code, .. } => Some(*status_code),
            Error::RateLimit { .. } => Some(429),
            Error::Timeout { status_code, .. } => *status_code,
            Error::InternalServer { .. } => Some(500),
            Error::ServiceUnavailable { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Returns the bare human-readable message, without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            Error::Api { message, .. }
            | Error::Authentication { message }
            | Error::Permission { message }
            | Error::NotFound { message }
            | Error::BadRequest { message, .. }
            | Error::RateLimit { message, .. }
            | Error::Timeout { message, .. }
            | Error::Abort { message }
            | Error::Connection { message, .. }
            | Error::InternalServer { message }
            | Error::ServiceUnavailable { message, .. }
            | Error::Serialization { message, .. }
            | Error::Io { message, .. }
            | Error::HttpClient { message, .. }
            | Error::Validation { message, .. }
            | Error::Url { message, .. }
            | Error::Unknown { message } => message,
        }
    }

    /// The message to show a user.
    ///
    /// HTTP errors whose body carried no message are described by status.
    pub fn summary(&self) -> String {
        match self.status_code() {
            Some(status) if self.message().trim().is_empty() => {
                format!("HTTP error! status: {status}")
            }
            _ => self.message().to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(status) = self.status_code()
            && self.message().trim().is_empty()
        {
            return write!(f, "HTTP error! status: {status}");
        }
        match self {
            Error::Api {
                status_code,
                message,
            } => write!(f, "API error ({status_code}): {message}"),
            Error::Authentication { message } => {
                write!(f, "Authentication error: {message}")
            }
            Error::Permission { message } => {
                write!(f, "Permission error: {message}")
            }
            Error::NotFound { message } => write!(f, "Resource not found: {message}"),
            Error::BadRequest { message, .. } => write!(f, "Bad request: {message}"),
            Error::RateLimit {
                message,
                retry_after,
            } => {
                if let Some(retry_after) = retry_after {
                    write!(
                        f,
                        "Rate limit exceeded: {message} (retry after {retry_after} seconds)"
                    )
                } else {
                    write!(f, "Rate limit exceeded: {message}")
                }
            }
            Error::Timeout {
                message, duration, ..
            } => {
                if let Some(duration) = duration {
                    write!(f, "Timeout error: {message} ({duration} seconds)")
                } else {
                    write!(f, "Timeout error: {message}")
                }
            }
            Error::Abort { message } => {
                write!(f, "Request aborted: {message}")
            }
            Error::Connection { message, .. } => {
                write!(f, "Connection error: {message}")
            }
            Error::InternalServer { message } => {
                write!(f, "Internal server error: {message}")
            }
            Error::ServiceUnavailable {
                message,
                retry_after,
                ..
            } => {
                if let Some(retry_after) = retry_after {
                    write!(
                        f,
                        "Service unavailable: {message} (retry after {retry_after} seconds)"
                    )
                } else {
                    write!(f, "Service unavailable: {message}")
                }
            }
            Error::Serialization { message, .. } => {
                write!(f, "Serialization error: {message}")
            }
            Error::Io { message, .. } => {
                write!(f, "I/O error: {message}")
            }
            Error::HttpClient { message, .. } => {
                write!(f, "HTTP client error: {message}")
            }
            Error::Validation { message, param } => {
                if let Some(param) = param {
                    write!(f, "Validation error: {message} (parameter: {param})")
                } else {
                    write!(f, "Validation error: {message}")
                }
            }
            Error::Url { message, .. } => {
                write!(f, "URL error: {message}")
            }
            Error::Unknown { message } => {
                write!(f, "Unknown error: {message}")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Connection { source, .. }
            | Error::Serialization { source, .. }
            | Error::HttpClient { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Io { source, .. } => Some(source),
            Error::Url { source, .. } => {
                source.as_ref().map(|e| e as &(dyn error::Error + 'static))
            }
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::io(err.to_string(), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(format!("JSON error: {err}"), Some(Box::new(err)))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::serialization(format!("YAML error: {err}"), Some(Box::new(err)))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::url(format!("URL parse error: {err}"), Some(err))
    }
}

impl From<Utf8Error> for Error {
    fn from(err: Utf8Error) -> Self {
        Error::serialization(format!("UTF-8 error: {err}"), Some(Box::new(err)))
    }
}

/// A specialized Result type for finchat operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(Error::from_status(401, "nope".into(), None).is_authentication());
        assert!(Error::from_status(403, "nope".into(), None).is_permission());
        assert!(Error::from_status(404, "gone".into(), None).is_not_found());
        assert!(Error::from_status(422, "bad".into(), None).is_bad_request());
        assert!(Error::from_status(429, "slow".into(), Some(3)).is_rate_limit());
        assert!(Error::from_status(503, "down".into(), None).is_server_error());
        assert_eq!(
            Error::from_status(418, "teapot".into(), None).status_code(),
            Some(418)
        );
    }

    #[test]
    fn client_errors_are_not_retryable() {
        for status in [400, 401, 403, 404, 409, 422] {
            let err = Error::from_status(status, "x".into(), None);
            assert!(err.is_client_error(), "{status}");
            assert!(!err.is_retryable(), "{status}");
        }
    }

    #[test]
    fn transient_statuses_are_retryable() {
        for status in [408, 429, 500, 502, 503, 504] {
            let err = Error::from_status(status, "x".into(), None);
            assert!(!err.is_client_error(), "{status}");
            assert!(err.is_retryable(), "{status}");
        }
    }

    #[test]
    fn message_text_does_not_affect_classification() {
        // A server error whose text mentions 404 is still a server error.
        let err = Error::from_status(500, "upstream returned 404".into(), None);
        assert!(!err.is_client_error());
        assert!(err.is_retryable());

        let err = Error::connection("connect to 10.0.0.4 refused", None);
        assert!(err.is_retryable());
        assert!(!err.is_rejection());
    }

    #[test]
    fn local_failures_are_not_retryable() {
        assert!(!Error::abort("cancelled").is_retryable());
        assert!(!Error::validation("not a csv", Some("file".into())).is_retryable());
        assert!(Error::timeout("slow", Some(1.0)).is_retryable());
    }

    #[test]
    fn request_timeout_status_is_a_timeout() {
        let err = Error::from_status(408, "took too long".into(), None);
        assert!(err.is_timeout());
        assert_eq!(err.status_code(), Some(408));
        assert!(err.is_rejection());
        assert!(err.is_retryable());
        assert!(!err.is_client_error());
        assert_eq!(Error::timeout("slow", None).status_code(), None);
    }

    #[test]
    fn empty_rejection_is_described_by_status() {
        let err = Error::from_status(401, String::new(), None);
        assert_eq!(err.message(), "");
        assert_eq!(err.summary(), "HTTP error! status: 401");
        assert_eq!(err.to_string(), "HTTP error! status: 401");

        let err = Error::from_status(401, "Bad token".into(), None);
        assert_eq!(err.summary(), "Bad token");
    }

    #[test]
    fn display_and_message() {
        let err = Error::authentication("Invalid credentials");
        assert_eq!(err.to_string(), "Authentication error: Invalid credentials");
        assert_eq!(err.message(), "Invalid credentials");

        let err = Error::validation("only .csv files are accepted", Some("file".into()));
        assert_eq!(
            err.to_string(),
            "Validation error: only .csv files are accepted (parameter: file)"
        );
    }
}
