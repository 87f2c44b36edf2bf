//! Configuration for the assessment service.
//!
//! Everything comes from environment variables, with a `.env` file loaded
//! first when present.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

const DEFAULT_STORE_PATH: &str = "data/personality-submissions.ndjson";

/// Main configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub scoring: ScoringConfig,
    pub access: AccessConfig,
    pub rate_limit: RateLimitConfig,
    pub store: StoreConfig,
    /// `None` unless every required email credential is present.
    pub email: Option<EmailConfig>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            server: ServerConfig::resolve()?,
            scoring: ScoringConfig::resolve()?,
            access: AccessConfig::resolve()?,
            rate_limit: RateLimitConfig::resolve()?,
            store: StoreConfig::resolve()?,
            email: EmailConfig::resolve()?,
        })
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn resolve() -> Result<Self, ConfigError> {
        Ok(Self {
            host: optional_env("HOST")?.unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_optional_env("PORT", 8788)?,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                key: "HOST".to_string(),
                message: format!("not a valid listen address: {e}"),
            })
    }
}

/// Duration thresholds applied to submissions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    /// Completions faster than this are flagged as rapid.
    pub min_duration_minutes: f64,
    /// Submissions reporting more than this are rejected.
    pub max_duration_minutes: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_duration_minutes: 8.0,
            max_duration_minutes: 180.0,
        }
    }
}

impl ScoringConfig {
    fn resolve() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let min_duration_minutes =
            parse_optional_env("MIN_DURATION_MINUTES", defaults.min_duration_minutes)?;
        let max_duration_minutes =
            parse_optional_env("MAX_DURATION_MINUTES", defaults.max_duration_minutes)?;

        if !max_duration_minutes.is_finite() || max_duration_minutes < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "MAX_DURATION_MINUTES".to_string(),
                message: "must be a non-negative number".to_string(),
            });
        }

        Ok(Self {
            min_duration_minutes,
            max_duration_minutes,
        })
    }
}

/// Shared-secret and origin access rules.
#[derive(Debug, Clone, Default)]
pub struct AccessConfig {
    pub api_key: Option<SecretString>,
    pub allowed_origins: Vec<String>,
    /// When set (and a key is configured), submissions must carry the key.
    pub require_submission_api_key: bool,
}

impl AccessConfig {
    fn resolve() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: optional_env("API_KEY")?
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
            allowed_origins: parse_list(optional_env("ALLOWED_ORIGIN")?.as_deref()),
            require_submission_api_key: parse_bool_env("REQUIRE_SUBMISSION_API_KEY", false)?,
        })
    }
}

/// Fixed-window rate limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_submissions: u64,
    pub max_admin: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(10 * 60 * 1000),
            max_submissions: 30,
            max_admin: 120,
        }
    }
}

impl RateLimitConfig {
    fn resolve() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let window_ms: u64 = parse_optional_env("RATE_WINDOW_MS", defaults.window.as_millis() as u64)?;
        let max_admin = match optional_env("RATE_MAX_ADMIN")? {
            Some(_) => parse_optional_env("RATE_MAX_ADMIN", defaults.max_admin)?,
            None => parse_optional_env("RATE_MAX_FEEDBACK", defaults.max_admin)?,
        };

        Ok(Self {
            window: Duration::from_millis(window_ms),
            max_submissions: parse_optional_env("RATE_MAX_SUBMISSIONS", defaults.max_submissions)?,
            max_admin,
        })
    }
}

/// Submission log location.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl StoreConfig {
    fn resolve() -> Result<Self, ConfigError> {
        let configured = optional_env("STORE_PATH")?
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_STORE_PATH.to_string());
        let path = PathBuf::from(configured);
        let path = if path.is_absolute() {
            path
        } else {
            std::env::current_dir()
                .map_err(|e| ConfigError::ParseError(format!("failed to read working directory: {e}")))?
                .join(path)
        };
        Ok(Self { path })
    }
}

/// Gmail service-account delivery settings.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub from: String,
    pub to: String,
    pub cc: Option<String>,
    pub client_email: String,
    pub private_key: SecretString,
    pub impersonated_user: String,
}

impl EmailConfig {
    fn resolve() -> Result<Option<Self>, ConfigError> {
        let trimmed = |key: &str| -> Result<Option<String>, ConfigError> {
            Ok(optional_env(key)?
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()))
        };

        let (Some(from), Some(to), Some(client_email), Some(private_key), Some(impersonated_user)) = (
            trimmed("EMAIL_FROM")?,
            trimmed("EMAIL_TO")?,
            trimmed("GOOGLE_CLIENT_EMAIL")?,
            trimmed("GOOGLE_PRIVATE_KEY")?,
            trimmed("GOOGLE_IMPERSONATED_USER")?,
        ) else {
            return Ok(None);
        };

        Ok(Some(Self {
            from,
            to,
            cc: trimmed("EMAIL_CC")?,
            client_email,
            private_key: SecretString::from(normalize_private_key(&private_key)),
            impersonated_user,
        }))
    }
}

/// Expand literal `\n` sequences, as private keys are often pasted into a
/// single-line env var.
pub fn normalize_private_key(key: &str) -> String {
    key.replace("\\n", "\n")
}

fn parse_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(val) if val.is_empty() => Ok(None),
        Ok(val) => Ok(Some(val)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::ParseError(format!(
            "failed to read {key}: {e}"
        ))),
    }
}

pub(crate) fn parse_optional_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key)?
        .map(|s| {
            s.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{e}"),
            })
        })
        .transpose()
        .map(|opt| opt.unwrap_or(default))
}

pub(crate) fn parse_bool_env(key: &str, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = optional_env(key)? else {
        return Ok(default);
    };
    match raw.trim().to_lowercase().as_str() {
        "" => Ok(default),
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}
