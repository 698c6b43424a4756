use crate::ask::AskOrdering;
use crate::error::ConfigError;
use std::env;
use std::time::Duration;

/// Environment variable names - single source of truth
pub mod env_vars {
    /// Base URL of the notes backend (e.g. "http://127.0.0.1:8000")
    pub const API_URL: &str = "NOTES_API_URL";
    pub const REQUEST_TIMEOUT_SECS: &str = "NOTES_REQUEST_TIMEOUT_SECS";
    /// Autosave quiet period in milliseconds
    pub const AUTOSAVE_DEBOUNCE_MS: &str = "NOTES_AUTOSAVE_DEBOUNCE_MS";
    /// Optional number of references requested per query
    pub const QUERY_TOP_K: &str = "NOTES_QUERY_TOP_K";
    /// "arrival" (default) or "dispatch"
    pub const ASK_ORDERING: &str = "NOTES_ASK_ORDERING";
}

/// Default values
pub mod defaults {
    pub const API_URL: &str = "http://127.0.0.1:8000";
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    pub const AUTOSAVE_DEBOUNCE_MS: u64 = 500;
    pub const NEW_NOTE_TITLE: &str = "Untitled Note";
    pub const REFERENCE_PREVIEW_CHARS: usize = 120;
}

/// Runtime configuration for the notes client
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub request_timeout: Duration,
    pub autosave_quiet_period: Duration,
    pub query_top_k: Option<u32>,
    pub ask_ordering: AskOrdering,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: defaults::API_URL.to_string(),
            request_timeout: Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS),
            autosave_quiet_period: Duration::from_millis(defaults::AUTOSAVE_DEBOUNCE_MS),
            query_top_k: None,
            ask_ordering: AskOrdering::ArrivalOrder,
        }
    }
}

impl ClientConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    /// Unset or blank variables fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(url) = get(env_vars::API_URL) {
            config.api_url = url.trim_end_matches('/').to_string();
        }

        if let Some(raw) = get(env_vars::REQUEST_TIMEOUT_SECS) {
            let secs = parse_number::<u64>(env_vars::REQUEST_TIMEOUT_SECS, &raw)?;
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = get(env_vars::AUTOSAVE_DEBOUNCE_MS) {
            let ms = parse_number::<u64>(env_vars::AUTOSAVE_DEBOUNCE_MS, &raw)?;
            config.autosave_quiet_period = Duration::from_millis(ms);
        }

        if let Some(raw) = get(env_vars::QUERY_TOP_K) {
            config.query_top_k = Some(parse_number::<u32>(env_vars::QUERY_TOP_K, &raw)?);
        }

        if let Some(raw) = get(env_vars::ASK_ORDERING) {
            config.ask_ordering = match raw.to_lowercase().as_str() {
                "arrival" => AskOrdering::ArrivalOrder,
                "dispatch" => AskOrdering::DispatchOrder,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: env_vars::ASK_ORDERING,
                        value: raw,
                        reason: "expected \"arrival\" or \"dispatch\"".to_string(),
                    });
                }
            };
        }

        Ok(config)
    }
}

fn parse_number<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
