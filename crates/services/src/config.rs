use std::env;

use chrono::Duration;
use course_core::model::StudentId;
use course_core::TrackerConfig;
use url::Url;

use crate::error::ConfigError;

pub const BASE_URL_VAR: &str = "COURSE_API_BASE_URL";
pub const TOKEN_VAR: &str = "COURSE_API_TOKEN";
pub const STUDENT_VAR: &str = "COURSE_STUDENT_ID";
pub const THRESHOLD_VAR: &str = "COURSE_COMPLETION_THRESHOLD";
pub const DEBOUNCE_VAR: &str = "COURSE_COMPLETION_DEBOUNCE_MS";

/// Client settings, read from the environment.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_base_url: Url,
    pub api_token: Option<String>,
    pub student_id: Option<StudentId>,
    pub tracker: TrackerConfig,
}

impl ClientConfig {
    /// # Errors
    ///
    /// Returns `ConfigError` if the base URL is missing or any value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key/value source; blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the base URL is missing or any value fails to parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let raw_url = get(BASE_URL_VAR).ok_or(ConfigError::Missing(BASE_URL_VAR))?;
        let api_base_url = Url::parse(&raw_url).map_err(|source| ConfigError::InvalidUrl {
            raw: raw_url.clone(),
            source,
        })?;

        let threshold = match get(THRESHOLD_VAR) {
            Some(raw) => raw.parse::<f64>().map_err(|_| ConfigError::InvalidNumber {
                var: THRESHOLD_VAR,
                raw,
            })?,
            None => TrackerConfig::DEFAULT_THRESHOLD,
        };
        let debounce_ms = match get(DEBOUNCE_VAR) {
            Some(raw) => raw.parse::<i64>().map_err(|_| ConfigError::InvalidNumber {
                var: DEBOUNCE_VAR,
                raw,
            })?,
            None => TrackerConfig::DEFAULT_DEBOUNCE_MS,
        };
        let tracker = TrackerConfig::new(threshold, Duration::milliseconds(debounce_ms))?;

        Ok(Self {
            api_base_url,
            api_token: get(TOKEN_VAR),
            student_id: get(STUDENT_VAR).map(StudentId::new),
            tracker,
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, url: Url) -> Self {
        self.api_base_url = url;
        self
    }
}
