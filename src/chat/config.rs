//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg`, an optional YAML
//! configuration file, and the resolved [`ChatConfig`].
//!
//! Precedence, highest first: command-line flags, the YAML file,
//! `FINCHAT_API_URL`, built-in defaults.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use arrrg_derive::CommandLine;
use serde::{Deserialize, Serialize};

use crate::client::{API_URL_ENV, DEFAULT_API_URL};
use crate::error::{Error, Result};
use crate::retry::DEFAULT_MAX_ATTEMPTS;

/// Default per-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Session file used when neither flag nor config file names one.
const DEFAULT_SESSION_FILE: &str = ".finchat/session.json";

/// Command-line arguments for the finchat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the backend.
    #[arrrg(optional, "Backend base URL (default: $FINCHAT_API_URL or http://localhost:8000)", "URL")]
    pub api_url: Option<String>,

    /// Per-request timeout.
    #[arrrg(optional, "Request timeout in seconds (default: 30)", "SECONDS")]
    pub timeout: Option<u64>,

    /// Attempts for retried reads.
    #[arrrg(optional, "Attempts for idempotent requests (default: 3)", "N")]
    pub max_attempts: Option<u32>,

    /// Where the session is persisted.
    #[arrrg(optional, "Session file (default: ~/.finchat/session.json)", "PATH")]
    pub session_file: Option<String>,

    /// YAML configuration file.
    #[arrrg(optional, "YAML configuration file", "PATH")]
    pub config: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Settings that may be provided in a YAML configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}

impl ConfigFile {
    /// Load a configuration file from disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|err| Error::io(format!("failed to read {}", path.display()), err))?;
        Ok(serde_yaml::from_str(&content)?)
    }
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Backend base URL.
    pub api_url: String,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Attempts for retried reads.
    pub max_attempts: u32,

    /// Where the session is persisted.
    pub session_file: PathBuf,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - API URL: `$FINCHAT_API_URL`, else `http://localhost:8000`
    /// - Timeout: 30 seconds
    /// - Attempts: 3
    /// - Session file: `~/.finchat/session.json`
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            api_url: env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            session_file: default_session_file(),
            use_color: true,
        }
    }

    /// Sets the backend base URL.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the attempt budget for retried reads.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the session file.
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = path.into();
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Overlay values from a configuration file.
    pub fn merge_file(mut self, file: ConfigFile) -> Self {
        if let Some(api_url) = file.api_url {
            self.api_url = api_url;
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(max_attempts) = file.max_attempts {
            self.max_attempts = max_attempts;
        }
        if let Some(session_file) = file.session_file {
            self.session_file = session_file;
        }
        if let Some(color) = file.color {
            self.use_color = color;
        }
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<ChatArgs> for ChatConfig {
    type Error = Error;

    fn try_from(args: ChatArgs) -> Result<Self> {
        let mut config = ChatConfig::new();
        if let Some(path) = &args.config {
            config = config.merge_file(ConfigFile::from_file(path)?);
        }
        if let Some(api_url) = args.api_url {
            config.api_url = api_url;
        }
        if let Some(secs) = args.timeout {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(max_attempts) = args.max_attempts {
            config.max_attempts = max_attempts;
        }
        if let Some(session_file) = args.session_file {
            config.session_file = PathBuf::from(session_file);
        }
        if args.no_color {
            config.use_color = false;
        }
        Ok(config)
    }
}

fn default_session_file() -> PathBuf {
    match env::var_os("HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(DEFAULT_SESSION_FILE),
        _ => PathBuf::from(DEFAULT_SESSION_FILE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_attempts, 3);
        assert!(config.use_color);
        assert!(config.session_file.ends_with(".finchat/session.json"));
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            api_url: Some("http://finchat.internal:8080".to_string()),
            timeout: Some(5),
            max_attempts: Some(1),
            session_file: Some("/tmp/finchat.json".to_string()),
            config: None,
            no_color: true,
        };
        let config = ChatConfig::try_from(args).unwrap();
        assert_eq!(config.api_url, "http://finchat.internal:8080");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.session_file, PathBuf::from("/tmp/finchat.json"));
        assert!(!config.use_color);
    }

    #[test]
    fn config_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finchat.yaml");
        std::fs::write(
            &path,
            "api_url: http://from-file:8000\ntimeout_secs: 12\nmax_attempts: 5\ncolor: false\n",
        )
        .unwrap();

        let args = ChatArgs {
            config: Some(path.display().to_string()),
            max_attempts: Some(2),
            ..ChatArgs::default()
        };
        let config = ChatConfig::try_from(args).unwrap();
        assert_eq!(config.api_url, "http://from-file:8000");
        assert_eq!(config.timeout, Duration::from_secs(12));
        assert_eq!(config.max_attempts, 2);
        assert!(!config.use_color);
    }

    #[test]
    fn config_file_rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finchat.yaml");
        std::fs::write(&path, "api_urll: http://typo\n").unwrap();
        assert!(ConfigFile::from_file(&path).is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let args = ChatArgs {
            config: Some("/nonexistent/finchat.yaml".to_string()),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::try_from(args).is_err());
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_api_url("https://api.example.com")
            .with_timeout(Duration::from_secs(3))
            .with_max_attempts(4)
            .with_session_file("session.json")
            .without_color();
        assert_eq!(config.api_url, "https://api.example.com");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.max_attempts, 4);
        assert_eq!(config.session_file, PathBuf::from("session.json"));
        assert!(!config.use_color);
    }
}
