//! Logging trait for finchat client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! every HTTP exchange passing through the [`FinChat`](crate::FinChat) client.

use std::time::Duration;

use reqwest::Method;

use crate::Error;

/// A trait for logging finchat client operations.
///
/// Implement this trait to record every request the client makes together
/// with its outcome.  Bearer tokens are never passed to the logger.
///
/// # Example
///
/// ```rust,ignore
/// use finchat::{ClientLogger, Error};
/// use reqwest::Method;
/// use std::time::Duration;
///
/// struct StderrLogger;
///
/// impl ClientLogger for StderrLogger {
///     fn log_request(&self, method: &Method, url: &str) {
///         eprintln!("-> {method} {url}");
///     }
///
///     fn log_response(&self, method: &Method, url: &str, status: u16, elapsed: Duration) {
///         eprintln!("<- {method} {url} {status} in {elapsed:?}");
///     }
///
///     fn log_failure(&self, method: &Method, url: &str, error: &Error) {
///         eprintln!("!! {method} {url}: {error}");
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Called right before a request is sent.
    fn log_request(&self, method: &Method, url: &str);

    /// Called once a response with a 2xx status has been fully decoded.
    fn log_response(&self, method: &Method, url: &str, status: u16, elapsed: Duration);

    /// Called when the request fails for any reason, including error statuses.
    fn log_failure(&self, method: &Method, url: &str, error: &Error);
}
