use std::env;
use std::fmt;
use std::str::FromStr;

use auth::HashCost;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment as EnvironmentSource;
use config::File;
use serde::Deserialize;
use thiserror::Error;

/// Signing secret used when none is configured outside production.
pub const DEVELOPMENT_SIGNING_SECRET: &[u8] = b"identity-service-development-signing-secret";

/// Deployment environment, selected by `RUN_MODE`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    /// Whether error responses may carry internal detail.
    pub fn exposes_internals(&self) -> bool {
        !matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::Message(format!(
                "Unknown RUN_MODE '{}', expected development, test or production",
                other
            ))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-fatal configuration problems, reported once at startup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationWarning {
    #[error("jwt.secret is not set, tokens are signed with the built-in development secret")]
    DevelopmentSigningSecret,

    #[error("database.url is not set, identities are kept in memory and lost on restart")]
    InMemoryStore,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub jwt: JwtConfig,
    /// Argon2id cost parameters.
    #[serde(default)]
    pub password: HashCost,
    #[serde(skip)]
    pub environment: Environment,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            http_port: 3000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    #[serde(default = "DatabaseConfig::default_max_connections")]
    pub max_connections: u32,
}

impl DatabaseConfig {
    fn default_max_connections() -> u32 {
        5
    }

    /// Configured URL, ignoring blank values.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.trim().is_empty())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: Self::default_max_connections(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: Option<String>,
    #[serde(default = "JwtConfig::default_expiration_minutes")]
    pub expiration_minutes: i64,
}

impl JwtConfig {
    fn default_expiration_minutes() -> i64 {
        60
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: None,
            expiration_minutes: Self::default_expiration_minutes(),
        }
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SECRET, SERVER__HTTP_PORT, etc.)
    /// 2. Environment-specific config file (config/{RUN_MODE}.toml)
    /// 3. Default config file (config/default.toml)
    /// 4. Built-in defaults
    ///
    /// # Errors
    /// * `ConfigError` - Unknown RUN_MODE, unreadable source, or a setting
    ///   that is not allowed in the selected environment
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        let environment = Environment::from_str(&run_mode)?;

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(EnvironmentSource::default().separator("__"))
            .build()?;

        let mut config: Config = configuration.try_deserialize()?;
        config.environment = environment;
        config.validate()?;

        Ok(config)
    }

    /// Reject settings that must never reach a running service.
    ///
    /// # Errors
    /// * `ConfigError::Message` - Non-positive token lifetime, or a production
    ///   deployment without a signing secret or database
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.expiration_minutes <= 0 {
            return Err(ConfigError::Message(format!(
                "jwt.expiration_minutes must be positive, got {}",
                self.jwt.expiration_minutes
            )));
        }

        if self.environment == Environment::Production {
            if self.configured_secret().is_none() {
                return Err(ConfigError::Message(
                    "jwt.secret must be set in production".to_string(),
                ));
            }
            if self.database.url().is_none() {
                return Err(ConfigError::Message(
                    "database.url must be set in production".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Secret used to sign and verify tokens.
    ///
    /// # Errors
    /// * `ConfigError::Message` - No secret configured in production
    pub fn signing_secret(&self) -> Result<&[u8], ConfigError> {
        match self.configured_secret() {
            Some(secret) => Ok(secret.as_bytes()),
            None if self.environment == Environment::Production => Err(ConfigError::Message(
                "jwt.secret must be set in production".to_string(),
            )),
            None => Ok(DEVELOPMENT_SIGNING_SECRET),
        }
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.jwt.expiration_minutes)
    }

    /// Problems worth a log line at startup. The test environment stays quiet
    /// about the development secret.
    pub fn warnings(&self) -> Vec<ConfigurationWarning> {
        let mut warnings = Vec::new();

        if self.configured_secret().is_none() && self.environment == Environment::Development {
            warnings.push(ConfigurationWarning::DevelopmentSigningSecret);
        }
        if self.database.url().is_none() && self.environment != Environment::Test {
            warnings.push(ConfigurationWarning::InMemoryStore);
        }

        warnings
    }

    fn configured_secret(&self) -> Option<&str> {
        self.jwt
            .secret
            .as_deref()
            .filter(|secret| !secret.trim().is_empty())
    }
}
