use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "http://your-oseon-server:8999";
pub const DEFAULT_API_VERSION: &str = "2.0";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;
const MAX_RETRIES_ALLOWED: u32 = 10;

/// Connection and behaviour settings, built once at startup and passed explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OseonConfig {
    pub base_url: String,
    pub api_version: String,
    pub username: String,
    pub password: String,
    pub user_header: String,
    pub terminal_header: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub demo_mode: bool,
}

impl Default for OseonConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            username: "your-username".to_string(),
            password: "your-password".to_string(),
            user_header: "your-user".to_string(),
            terminal_header: "your-terminal".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: 0,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            demo_mode: false,
        }
    }
}

impl OseonConfig {
    /// Reads `OSEON_CONFIG_FILE` when set, then layers `OSEON_*` environment overrides on top.
    pub fn load() -> AppResult<Self> {
        let base = match std::env::var("OSEON_CONFIG_FILE") {
            Ok(path) if !path.trim().is_empty() => Self::from_yaml_file(Path::new(path.trim()))?,
            _ => Self::default(),
        };
        let config = base.with_overrides(&oseon_env_vars())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> AppResult<Self> {
        Self::default().with_overrides(&oseon_env_vars())
    }

    pub fn from_yaml_file(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|error| {
            AppError::Config(format!("Unable to read config file {}: {}", path.display(), error))
        })?;
        let config: Self = serde_yaml::from_str(&raw)?;
        Ok(config)
    }

    pub fn with_overrides(mut self, vars: &BTreeMap<String, String>) -> AppResult<Self> {
        let get = |key: &str| vars.get(key).map(|value| value.trim().to_string());

        if let Some(value) = get("OSEON_BASE_URL") {
            self.base_url = value;
        }
        if let Some(value) = get("OSEON_API_VERSION") {
            self.api_version = value;
        }
        if let Some(value) = get("OSEON_USERNAME") {
            self.username = value;
        }
        if let Some(value) = vars.get("OSEON_PASSWORD") {
            self.password = value.clone();
        }
        if let Some(value) = get("OSEON_USER_HEADER") {
            self.user_header = value;
        }
        if let Some(value) = get("OSEON_TERMINAL_HEADER") {
            self.terminal_header = value;
        }
        if let Some(value) = get("OSEON_TIMEOUT_SECS") {
            self.timeout_secs = parse_number("OSEON_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = get("OSEON_MAX_RETRIES") {
            self.max_retries = parse_number("OSEON_MAX_RETRIES", &value)?;
        }
        if let Some(value) = get("OSEON_RETRY_BACKOFF_MS") {
            self.retry_backoff_ms = parse_number("OSEON_RETRY_BACKOFF_MS", &value)?;
        }
        if let Some(value) = get("OSEON_DEMO_MODE") {
            self.demo_mode = matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        Ok(self)
    }

    pub fn validate(&self) -> AppResult<()> {
        let base_url = self.base_url.trim();
        if base_url.is_empty() {
            return Err(AppError::Config("Base URL cannot be empty".to_string()));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "Base URL '{}' must start with http:// or https://",
                base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::Config("Timeout must be at least one second".to_string()));
        }
        if self.max_retries > MAX_RETRIES_ALLOWED {
            return Err(AppError::Config(format!(
                "Max retries {} exceeds allowed maximum {}",
                self.max_retries, MAX_RETRIES_ALLOWED
            )));
        }
        Ok(())
    }

    pub fn trimmed_base_url(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }
}

fn oseon_env_vars() -> BTreeMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with("OSEON_"))
        .collect()
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> AppResult<T> {
    raw.parse::<T>()
        .map_err(|_| AppError::Config(format!("{} must be a non-negative integer, got '{}'", key, raw)))
}
