use crate::error::{Error, Result};

/// Uniform outcome of every call made through [`crate::FinChat`].
///
/// Failures are values, not panics: callers look at `success` and show
/// `error` to the user.  `status` holds the HTTP status whenever the server
/// answered, which is how rejections are told apart from transport failures.
#[derive(Debug, Clone)]
pub struct ApiResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub status: Option<u16>,
    cause: Option<Error>,
}

impl<T> ApiResult<T> {
    /// A successful result carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            status: None,
            cause: None,
        }
    }

    /// A failed result built from `err`.
    pub fn err(err: Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.summary()),
            status: err.status_code(),
            cause: Some(err),
        }
    }

    /// A result from a completed exchange, keeping the success status.
    pub fn from_exchange(exchange: Result<(u16, T)>) -> Self {
        match exchange {
            Ok((status, data)) => Self {
                status: Some(status),
                ..Self::ok(data)
            },
            Err(err) => Self::err(err),
        }
    }

    /// The classified error behind a failure.
    pub fn cause(&self) -> Option<&Error> {
        self.cause.as_ref()
    }

    /// True when the server answered with an error status.
    pub fn is_rejection(&self) -> bool {
        self.cause.as_ref().is_some_and(Error::is_rejection)
    }

    /// The error message, or `fallback` when there is none.
    pub fn error_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self.error.as_deref() {
            Some(message) if !message.trim().is_empty() => message,
            _ => fallback,
        }
    }

    /// Transform the payload of a successful result.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ApiResult<U> {
        ApiResult {
            success: self.success,
            data: self.data.map(f),
            error: self.error,
            status: self.status,
            cause: self.cause,
        }
    }

    /// Convert back into a `Result` for `?`-style callers.
    pub fn into_result(self) -> Result<T> {
        match (self.data, self.cause) {
            (Some(data), None) => Ok(data),
            (_, Some(cause)) => Err(cause),
            (None, None) => Err(Error::unknown(
                self.error
                    .unwrap_or_else(|| "request produced no data".to_string()),
            )),
        }
    }
}

impl<T> From<Result<T>> for ApiResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => ApiResult::ok(data),
            Err(err) => ApiResult::err(err),
        }
    }
}
