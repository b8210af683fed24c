use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::error::{CoreError, CoreResult};
use crate::types::{InvalidDatePolicy, OrdinalOverflow};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub schedule: ScheduleConfig,
    pub documents: DocumentsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u8,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub session_ttl_hours: u32,
    pub activation_ttl_hours: u32,
    pub bootstrap_admin: Option<BootstrapAdminConfig>,
}

/// Administrator account created at startup when no account with this email exists.
#[derive(Clone, Deserialize)]
pub struct BootstrapAdminConfig {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdminConfig")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub serve_origin: Option<String>,
}

impl ServerConfig {
    /// ## Summary
    /// The origin the server listens on, as `http://{host}:{port}`.
    #[must_use]
    pub fn serve_origin(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// ## Summary
    /// The public origin: `serve_origin` when configured, otherwise
    /// `http://{host}:{port}`.
    #[must_use]
    pub fn origin(&self) -> String {
        if let Some(origin) = &self.serve_origin {
            origin.clone()
        } else {
            self.serve_origin()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// IANA name of the timezone wall-clock slot times are expressed in.
    pub timezone: String,
    pub max_recurrence_count: u32,
    pub invalid_monthly_date: InvalidDatePolicy,
    pub ordinal_overflow: OrdinalOverflow,
}

impl ScheduleConfig {
    /// ## Summary
    /// Parses the configured timezone.
    ///
    /// ## Errors
    /// Returns `UnknownTimezone` if the name is not a known IANA timezone.
    pub fn tz(&self) -> CoreResult<chrono_tz::Tz> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_err| CoreError::UnknownTimezone(self.timezone.clone()))
    }

    /// ## Summary
    /// Clamps a requested recurrence count into `[1, max_recurrence_count]`.
    #[must_use]
    pub fn clamp_count(&self, requested: i64) -> u32 {
        let max = i64::from(self.max_recurrence_count.max(1));
        // Bounded by `max`, which came from a u32.
        u32::try_from(requested.clamp(1, max)).unwrap_or(1)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentsConfig {
    pub max_upload_bytes: u64,
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `.env` file and environment variables into a `Settings`.
    /// Environment variables take precedence over `config.toml` values.
    ///
    /// Environment keys use a `CAMPUS` prefix and `__` between sections, e.g.
    /// `CAMPUS__DATABASE__URL` or `CAMPUS__SCHEDULE__TIMEZONE`.
    ///
    /// ## Errors
    /// Returns an error if building the configuration, deserializing or validating it fails.
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8698)?
            .set_default("database.max_connections", 4)?
            .set_default("database.run_migrations", true)?
            .set_default("logging.level", "debug")?
            .set_default("auth.session_ttl_hours", 168)?
            .set_default("auth.activation_ttl_hours", 72)?
            .set_default("schedule.timezone", "Europe/Paris")?
            .set_default("schedule.max_recurrence_count", 52)?
            .set_default(
                "schedule.invalid_monthly_date",
                InvalidDatePolicy::default().as_str(),
            )?
            .set_default("schedule.ordinal_overflow", OrdinalOverflow::default().as_str())?
            .set_default("documents.max_upload_bytes", 10 * 1024 * 1024)?
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            // Environment, including values loaded from `.env`
            .add_source(
                config::Environment::with_prefix("CAMPUS")
                    .prefix_separator("__")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;

        settings.validate()?;
        Ok(settings)
    }

    /// ## Summary
    /// Checks values that deserialize fine but cannot be used.
    ///
    /// ## Errors
    /// Returns `ConfigError` describing the first invalid value.
    pub fn validate(&self) -> CoreResult<()> {
        if self.database.url.trim().is_empty() {
            return Err(CoreError::ConfigError("database.url is empty".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(CoreError::ConfigError(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.schedule.max_recurrence_count == 0 {
            return Err(CoreError::ConfigError(
                "schedule.max_recurrence_count must be at least 1".to_string(),
            ));
        }
        if self.auth.session_ttl_hours == 0 || self.auth.activation_ttl_hours == 0 {
            return Err(CoreError::ConfigError(
                "auth token lifetimes must be at least one hour".to_string(),
            ));
        }
        self.schedule.tz()?;
        Ok(())
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}

#[cfg(test)]
mod tests;
