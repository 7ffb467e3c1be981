//! Immutable per-run configuration snapshot.
//!
//! A [`Config`] is loaded (or defaulted), validated once at startup, and
//! then handed to the session by value. Validation failures are fatal
//! before any navigation begins: a batch never starts against a malformed
//! base URL or an unusable download directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::download::RetryPolicy;
use crate::filter::FilterConfig;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Io {
        /// The file that failed to read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for this schema.
    #[error("cannot parse config file {path}: {source}")]
    Parse {
        /// The file that failed to parse.
        path: PathBuf,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// The base URL is not an absolute http(s) URL.
    #[error("invalid base URL `{url}`: {reason}")]
    InvalidBaseUrl {
        /// The offending value.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The timeout must be at least one second.
    #[error("invalid timeout_seconds {value}: must be >= 1")]
    InvalidTimeout {
        /// The offending value.
        value: u64,
    },

    /// The user agent contains characters not allowed in a header value.
    #[error("invalid user_agent: must be non-empty printable ASCII")]
    InvalidUserAgent,
}

/// Configuration snapshot for one run.
///
/// Filter patterns are matched against **decoded** display names (see
/// [`FilterConfig`]); the shipped defaults are authored in decoded form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scheme + host of the remote file tree, no trailing slash.
    pub base_url: String,
    /// Path of the listing to open first, always starting with `/`.
    pub start_path: String,
    /// Directory downloads land in.
    pub download_directory: PathBuf,
    /// Substrings a kept filename must contain one of (empty = keep all).
    pub include_patterns: Vec<String>,
    /// Substrings that drop a filename, evaluated after the include check.
    pub exclude_patterns: Vec<String>,
    /// Total fetch attempts per file download.
    pub max_retries: u32,
    /// Fixed delay between attempts, in seconds.
    pub retry_delay_seconds: u64,
    /// HTTP request timeout, in seconds.
    pub timeout_seconds: u64,
    /// User-Agent header sent on every request.
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://myrient.erista.me".to_string(),
            start_path: "/files/No-Intro/Nintendo%20-%20Game%20Boy/".to_string(),
            download_directory: PathBuf::from("."),
            include_patterns: vec!["(USA)".to_string()],
            exclude_patterns: vec!["(Demo)".to_string(), "(Beta)".to_string()],
            max_retries: 3,
            retry_delay_seconds: 5,
            timeout_seconds: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
        }
    }
}

impl Config {
    /// Loads a config from a JSON file, normalizes it, and validates it.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] / [`ConfigError::Parse`] on unreadable or
    /// malformed files, plus anything [`Config::validate`] rejects.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Canonicalizes the shape of user-supplied values: the base URL loses
    /// any trailing slash, the start path gains a leading one.
    pub fn normalize(&mut self) {
        while self.base_url.ends_with('/') {
            self.base_url.pop();
        }
        if !self.start_path.starts_with('/') {
            self.start_path.insert(0, '/');
        }
    }

    /// Checks invariants that must hold before a session starts.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let parsed = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme `{}`", parsed.scheme()),
            });
        }

        if self.timeout_seconds == 0 {
            return Err(ConfigError::InvalidTimeout {
                value: self.timeout_seconds,
            });
        }

        if self.user_agent.is_empty()
            || !self.user_agent.chars().all(|c| (' '..='~').contains(&c))
        {
            return Err(ConfigError::InvalidUserAgent);
        }

        Ok(())
    }

    /// The complete URL of the starting listing.
    #[must_use]
    pub fn full_url(&self) -> String {
        format!("{}{}", self.base_url, self.start_path)
    }

    /// Builds the filter for this run.
    #[must_use]
    pub fn filter(&self) -> FilterConfig {
        FilterConfig::new(self.include_patterns.clone(), self.exclude_patterns.clone())
    }

    /// Builds the retry policy for this run.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_secs(self.retry_delay_seconds),
        )
    }

    /// The HTTP request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
