//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `scenehub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// HAL backend settings.
    pub hal: HalConfig,
    /// Scheduler settings.
    pub scheduler: SchedulerConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// HAL backend configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HalConfig {
    /// Base URL of the HAL service.
    pub url: String,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
}

/// Scheduler configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Fixed timezone cron schedules and time-range conditions are
    /// evaluated in (IANA name, e.g. `Europe/Paris`).
    pub timezone: String,
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration file")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration file")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl Config {
    /// Load configuration from `scenehub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if a
    /// value fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("scenehub.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SCENEHUB_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("SCENEHUB_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("SCENEHUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("SCENEHUB_HAL_URL") {
            self.hal.url = val;
        }
        if let Ok(val) = std::env::var("SCENEHUB_TIMEZONE") {
            self.scheduler.timezone = val;
        }
        if let Ok(val) = std::env::var("SCENEHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        self.timezone()?;
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Parse the configured scheduler timezone.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for an unknown IANA name.
    pub fn timezone(&self) -> Result<chrono_tz::Tz, ConfigError> {
        self.scheduler.timezone.parse().map_err(|_| {
            ConfigError::Validation(format!(
                "unknown timezone `{}`",
                self.scheduler.timezone
            ))
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:scenehub.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "scenehubd=info,scenehub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for HalConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            timeout_seconds: 5,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_provide_workable_defaults() {
        let config = Config::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
        assert_eq!(config.hal.url, "http://localhost:8080");
        assert_eq!(config.timezone().unwrap(), chrono_tz::UTC);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_partial_toml_and_keep_defaults_elsewhere() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9000

            [scheduler]
            timezone = "Asia/Shanghai"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.timezone().unwrap(), chrono_tz::Asia::Shanghai);
    }

    #[test]
    fn should_reject_unknown_timezone() {
        let config: Config = toml::from_str(
            r#"
            [scheduler]
            timezone = "Mars/Olympus_Mons"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_port() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 0
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}
