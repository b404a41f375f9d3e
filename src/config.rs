//! Configuration module
//!
//! Application settings are read from a TOML file
//! (`~/.config/admin-dashboard/config.toml` by default). Every section and
//! field has a default, so a partial file or no file at all is valid.
//! Platform credentials never live in the file; they come from the
//! environment via [`PlatformConfig::from_env`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::{DomainError, DomainResult, RetryConfig};

/// Default location of the configuration file
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("admin-dashboard")
        .join("config.toml")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub admin: AdminConfig,
    pub subscriptions: SubscriptionConfig,
    pub cors: CorsConfig,
}

impl AppConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Write the configuration, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
        }
        let contents =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to encode config: {}", e))?;
        std::fs::write(path, contents)
            .map_err(|e| format!("Failed to write config file {}: {}", path.display(), e))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me-dashboard-secret".to_string(),
            jwt_expiration_hours: 24,
        }
    }
}

/// Bootstrap administrator created at startup when missing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            email: "admin@example.com".to_string(),
            password: "admin123".to_string(),
            display_name: "Administrator".to_string(),
        }
    }
}

/// Retry policy for establishing live subscriptions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SubscriptionConfig {
    pub retry_max_attempts: u32,
    pub retry_initial_delay_ms: u64,
    pub retry_max_delay_ms: u64,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            retry_max_attempts: 3,
            retry_initial_delay_ms: 200,
            retry_max_delay_ms: 5_000,
        }
    }
}

impl SubscriptionConfig {
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retry_max_attempts.max(1),
            initial_delay: Duration::from_millis(self.retry_initial_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
            ..RetryConfig::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CorsConfig {
    /// Empty means any origin
    pub allowed_origins: Vec<String>,
}

/// Credentials of the managed platform project, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    pub api_key: String,
    pub project_id: String,
    pub auth_domain: Option<String>,
    pub app_id: Option<String>,
}

impl PlatformConfig {
    pub const API_KEY_VAR: &'static str = "PLATFORM_API_KEY";
    pub const PROJECT_ID_VAR: &'static str = "PLATFORM_PROJECT_ID";
    pub const AUTH_DOMAIN_VAR: &'static str = "PLATFORM_AUTH_DOMAIN";
    pub const APP_ID_VAR: &'static str = "PLATFORM_APP_ID";

    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source and validate.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DomainResult<Self> {
        let optional = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let config = Self {
            api_key: lookup(Self::API_KEY_VAR).unwrap_or_default(),
            project_id: lookup(Self::PROJECT_ID_VAR).unwrap_or_default(),
            auth_domain: optional(Self::AUTH_DOMAIN_VAR),
            app_id: optional(Self::APP_ID_VAR),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DomainResult<()> {
        let missing: Vec<&str> = [
            (Self::API_KEY_VAR, &self.api_key),
            (Self::PROJECT_ID_VAR, &self.project_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Configuration(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )))
        }
    }
}
