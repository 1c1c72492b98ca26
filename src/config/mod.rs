//! Configuration handling for the price service.
//!
//! Everything is read from environment variables with development
//! defaults. `Config::from_env` is the only place that touches the
//! environment; the rest of the crate receives a `Config` value.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Environment variable names. Public so tests and binaries can refer to them.
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_CACHE_PATH: &str = "CACHE_PATH";
pub const ENV_CATALOG_PATH: &str = "CATALOG_PATH";
pub const ENV_CACHE_TTL_SECS: &str = "CACHE_TTL_SECS";
pub const ENV_STATUS_STALE_SECS: &str = "STATUS_STALE_SECS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";
pub const ENV_MIN_REQUEST_SPACING_MS: &str = "MIN_REQUEST_SPACING_MS";
pub const ENV_FETCH_ATTEMPTS: &str = "FETCH_ATTEMPTS";
pub const ENV_KEEP_STALE_ON_FAILURE: &str = "KEEP_STALE_ON_FAILURE";
pub const ENV_REMINDERS_COMMAND: &str = "REMINDERS_COMMAND";
pub const ENV_SPECIALS_SEARCH: &str = "SPECIALS_SEARCH";

/// Default development values used when environment variables are absent.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5002";
const DEFAULT_CACHE_PATH: &str = "prices_cache.json";
const DEFAULT_CACHE_TTL_SECS: u64 = 60 * 60;
const DEFAULT_STATUS_STALE_SECS: u64 = 2 * 60 * 60;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
const DEFAULT_MIN_REQUEST_SPACING_MS: u64 = 1000;
const DEFAULT_FETCH_ATTEMPTS: u32 = 2;
const DEFAULT_REMINDERS_COMMAND: &str = "remindctl";

/// Outbound request timeouts must stay within this window.
const REQUEST_TIMEOUT_RANGE: std::ops::RangeInclusive<u64> = 10..=30;

/// Application runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    bind_addr: String,
    cache_path: PathBuf,
    catalog_path: Option<PathBuf>,
    cache_ttl: Duration,
    status_stale_after: Duration,
    request_timeout: Duration,
    min_request_spacing: Duration,
    fetch_attempts: u32,
    keep_stale_on_failure: bool,
    reminders_command: String,
    specials_search: bool,
}

impl Config {
    /// Load from environment variables, falling back to development defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var(ENV_BIND_ADDR).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let cache_path = env::var(ENV_CACHE_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CACHE_PATH));
        let catalog_path = env::var(ENV_CATALOG_PATH).ok().map(PathBuf::from);

        let cache_ttl_secs = parse_var(ENV_CACHE_TTL_SECS, DEFAULT_CACHE_TTL_SECS)?;
        let status_stale_secs = parse_var(ENV_STATUS_STALE_SECS, DEFAULT_STATUS_STALE_SECS)?;
        let request_timeout_secs =
            parse_var(ENV_REQUEST_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS)?;
        if !REQUEST_TIMEOUT_RANGE.contains(&request_timeout_secs) {
            return Err(ConfigError::InvalidValue {
                field: ENV_REQUEST_TIMEOUT_SECS,
                reason: format!(
                    "must be between {} and {} seconds",
                    REQUEST_TIMEOUT_RANGE.start(),
                    REQUEST_TIMEOUT_RANGE.end()
                ),
            });
        }
        let spacing_ms = parse_var(ENV_MIN_REQUEST_SPACING_MS, DEFAULT_MIN_REQUEST_SPACING_MS)?;
        let fetch_attempts = parse_var(ENV_FETCH_ATTEMPTS, DEFAULT_FETCH_ATTEMPTS)?;
        if fetch_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_FETCH_ATTEMPTS,
                reason: "must be at least 1".to_string(),
            });
        }
        let keep_stale_on_failure = parse_var(ENV_KEEP_STALE_ON_FAILURE, false)?;
        let reminders_command = env::var(ENV_REMINDERS_COMMAND)
            .unwrap_or_else(|_| DEFAULT_REMINDERS_COMMAND.to_string());
        let specials_search = parse_var(ENV_SPECIALS_SEARCH, true)?;

        Ok(Self {
            bind_addr,
            cache_path,
            catalog_path,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            status_stale_after: Duration::from_secs(status_stale_secs),
            request_timeout: Duration::from_secs(request_timeout_secs),
            min_request_spacing: Duration::from_millis(spacing_ms),
            fetch_attempts,
            keep_stale_on_failure,
            reminders_command,
            specials_search,
        })
    }

    /// TCP bind address (host:port) for the HTTP server.
    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }
    /// Location of the JSON price cache.
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }
    /// Optional catalog file; the built-in catalog is used when absent.
    pub fn catalog_path(&self) -> Option<&Path> {
        self.catalog_path.as_deref()
    }
    /// Age after which a cached snapshot triggers a re-scrape.
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }
    /// Age after which the status endpoint reports `stale`.
    pub fn status_stale_after(&self) -> Duration {
        self.status_stale_after
    }
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
    /// Minimum spacing between two requests to the same host.
    pub fn min_request_spacing(&self) -> Duration {
        self.min_request_spacing
    }
    pub fn fetch_attempts(&self) -> u32 {
        self.fetch_attempts
    }
    /// Keep the previous quote for products that failed in a partially successful cycle.
    pub fn keep_stale_on_failure(&self) -> bool {
        self.keep_stale_on_failure
    }
    /// Executable used to push shopping-list lines into reminders.
    pub fn reminders_command(&self) -> &str {
        &self.reminders_command
    }
    /// Whether `/api/specials` also queries the search engine per catalog product.
    pub fn specials_search(&self) -> bool {
        self.specials_search
    }
}

/// Development defaults; what `from_env` yields with no overrides set.
impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            catalog_path: None,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            status_stale_after: Duration::from_secs(DEFAULT_STATUS_STALE_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            min_request_spacing: Duration::from_millis(DEFAULT_MIN_REQUEST_SPACING_MS),
            fetch_attempts: DEFAULT_FETCH_ATTEMPTS,
            keep_stale_on_failure: false,
            reminders_command: DEFAULT_REMINDERS_COMMAND.to_string(),
            specials_search: true,
        }
    }
}

fn parse_var<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            field: key,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl Error for ConfigError {}
