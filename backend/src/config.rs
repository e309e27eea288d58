//! Layered service configuration.
//!
//! Sources, lowest precedence first: built-in defaults, an optional
//! `config.toml` in the working directory, `TRAVELMATE__SECTION__KEY`
//! environment variables, and finally the bare `JWT_SECRET`, `DATABASE_URL`
//! and `PORT` variables used by existing deployments.

use std::env;
use std::fmt;

use config::{Config as ConfigLoader, Environment, File};
use serde::Deserialize;

/// Signing secret used only when `auth.allow_insecure_dev_secret` is set.
pub const DEV_JWT_SECRET: &str = "travelmate-insecure-development-secret";

/// One year.
pub const MAX_TOKEN_TTL_HOURS: u64 = 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub bootstrap: BootstrapConfig,
    pub logging: LoggingConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite path, optionally prefixed with `sqlite:`. `:memory:` is accepted.
    pub url: String,
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    pub token_ttl_hours: u64,
    pub bcrypt_cost: u32,
    #[serde(default)]
    pub allow_insecure_dev_secret: bool,
}

impl AuthConfig {
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("allow_insecure_dev_secret", &self.allow_insecure_dev_secret)
            .finish()
    }
}

/// Default administrator created on first start.
#[derive(Clone, Deserialize)]
pub struct BootstrapConfig {
    pub admin_name: String,
    pub admin_email: String,
    pub admin_password: String,
}

impl fmt::Debug for BootstrapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapConfig")
            .field("admin_name", &self.admin_name)
            .field("admin_email", &self.admin_email)
            .field("admin_password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated origins, or `*`.
    pub origins: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("JWT_SECRET is not set (set auth.allow_insecure_dev_secret for local development only)")]
    MissingSecret,
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Load configuration from defaults, `config.toml` and the environment.
    ///
    /// A `.env` file in the working directory is read first when present.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let settings = ConfigLoader::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "sqlite:./data/travelmate.db")?
            .set_default("auth.jwt_secret", "")?
            .set_default("auth.token_ttl_hours", 24)?
            .set_default("auth.bcrypt_cost", i64::from(bcrypt::DEFAULT_COST))?
            .set_default("auth.allow_insecure_dev_secret", false)?
            .set_default("bootstrap.admin_name", "Admin")?
            .set_default("bootstrap.admin_email", "admin@travelmate.com")?
            .set_default("bootstrap.admin_password", "admin123")?
            .set_default("logging.level", "info")?
            .set_default("cors.origins", "*")?
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("TRAVELMATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("auth.jwt_secret", env::var("JWT_SECRET").ok())?
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option("server.port", env::var("PORT").ok())?
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validated()
    }

    /// Check cross-field constraints and apply the development secret fallback.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            if !self.auth.allow_insecure_dev_secret {
                return Err(ConfigError::MissingSecret);
            }
            self.auth.jwt_secret = DEV_JWT_SECRET.to_string();
        }

        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err(ConfigError::Invalid(format!(
                "auth.bcrypt_cost must be between 4 and 31, got {}",
                self.auth.bcrypt_cost
            )));
        }

        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.auth.token_ttl_hours) {
            return Err(ConfigError::Invalid(format!(
                "auth.token_ttl_hours must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_HOURS, self.auth.token_ttl_hours
            )));
        }

        Ok(self)
    }
}
