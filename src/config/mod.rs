//! Client configuration (layered: code > env > file > defaults).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::store::SessionStoreConfig;
use crate::error::InsurError;

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REFRESH_PATH: &str = "/api/auth/refresh";

/// Settings for [`crate::http::ApiClient`] and the resource clients.
///
/// Resolution order:
/// 1. Values set in code (`with_*` methods)
/// 2. Environment variables (`INSUR_*`, `.env` honoured)
/// 3. An optional TOML file passed to [`ClientConfig::from_file`]
/// 4. Defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub refresh_path: String,
    /// Treat tokens as expired this many seconds early.
    pub expiry_skew_secs: i64,
    pub session_dir: PathBuf,
    pub profile: String,
    /// Serve placeholder data when selected listings fail.
    pub demo_fallback: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            expiry_skew_secs: 0,
            session_dir: SessionStoreConfig::default_dir(),
            profile: "default".to_string(),
            demo_fallback: false,
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with environment variables.
    pub fn from_env() -> Result<Self, InsurError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::default().apply_env(|key| std::env::var(key).ok())
    }

    /// TOML file overlaid with environment variables.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, InsurError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw).map_err(|err| {
            InsurError::Configuration(format!("invalid config file {}: {err}", path.display()))
        })?;
        let _ = dotenvy::dotenv();
        config.apply_env(|key| std::env::var(key).ok())
    }

    /// Overlay values from a variable lookup (normally the process env).
    pub fn apply_env(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, InsurError> {
        if let Some(url) = lookup("INSUR_API_URL") {
            self = self.with_base_url(url)?;
        }
        if let Some(raw) = lookup("INSUR_TIMEOUT_SECS") {
            self.timeout_secs = parse_var("INSUR_TIMEOUT_SECS", &raw)?;
        }
        if let Some(path) = lookup("INSUR_REFRESH_PATH") {
            self.refresh_path = path;
        }
        if let Some(raw) = lookup("INSUR_EXPIRY_SKEW_SECS") {
            self.expiry_skew_secs = parse_var("INSUR_EXPIRY_SKEW_SECS", &raw)?;
        }
        if let Some(dir) = lookup("INSUR_SESSION_DIR") {
            self.session_dir = PathBuf::from(dir);
        }
        if let Some(profile) = lookup("INSUR_PROFILE") {
            self.profile = profile;
        }
        if let Some(flag) = lookup("INSUR_DEMO_FALLBACK") {
            self.demo_fallback = matches!(flag.trim(), "1" | "true" | "TRUE" | "yes");
        }
        self.validate()?;
        Ok(self)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Result<Self, InsurError> {
        self.base_url = normalize_base_url(&url.into())?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn with_session_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.session_dir = dir.into();
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    pub fn with_expiry_skew(mut self, skew_secs: i64) -> Self {
        self.expiry_skew_secs = skew_secs;
        self
    }

    pub fn with_demo_fallback(mut self, enabled: bool) -> Self {
        self.demo_fallback = enabled;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), InsurError> {
        normalize_base_url(&self.base_url)?;
        if self.timeout_secs == 0 {
            return Err(InsurError::Configuration(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.expiry_skew_secs < 0 {
            return Err(InsurError::Configuration(
                "expiry_skew_secs must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

fn normalize_base_url(url: &str) -> Result<String, InsurError> {
    let trimmed = url.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(InsurError::Configuration(format!(
            "base URL must start with http:// or https:// (got {url:?})"
        )));
    }
    Ok(trimmed.to_string())
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, InsurError> {
    raw.trim()
        .parse()
        .map_err(|_| InsurError::Configuration(format!("{name} has invalid value {raw:?}")))
}
