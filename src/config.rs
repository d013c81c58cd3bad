// Process-wide configuration loaded once at start-up

use chrono::Duration;
use jsonwebtoken::Algorithm;

/// Immutable service configuration
///
/// Built from the environment in `main` and shared behind an `Arc`; nothing
/// reads environment variables after start-up.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub token_ttl: Duration,
    pub reset_token_ttl: Duration,
    pub reset_sweep_interval: std::time::Duration,
    pub db_max_connections: u32,
    /// Development aid: echo reset tokens in the forgot-password response
    pub expose_reset_token: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        let jwt_algorithm = match lookup("JWT_ALGORITHM").as_deref() {
            None | Some("HS256") => Algorithm::HS256,
            Some("HS384") => Algorithm::HS384,
            Some("HS512") => Algorithm::HS512,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "JWT_ALGORITHM",
                    message: format!("unsupported algorithm '{}', expected HS256, HS384 or HS512", other),
                })
            }
        };

        let jwt_secret = required("JWT_SECRET_KEY")?;
        if jwt_secret.is_empty() {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET_KEY",
                message: "must not be empty".to_string(),
            });
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            jwt_secret,
            jwt_algorithm,
            token_ttl: parse_ttl_minutes(&lookup, "JWT_EXPIRE_MINUTES", 60)?,
            reset_token_ttl: parse_ttl_minutes(&lookup, "RESET_TOKEN_EXPIRE_MINUTES", 60)?,
            reset_sweep_interval: std::time::Duration::from_secs(
                parse_positive(&lookup, "RESET_SWEEP_INTERVAL_SECONDS", 300)? as u64,
            ),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            expose_reset_token: parse_or(&lookup, "EXPOSE_RESET_TOKEN", false)?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: e.to_string(),
        }),
    }
}

/// Upper bound for token lifetimes: one year
const MAX_TTL_MINUTES: i64 = 365 * 24 * 60;

fn parse_ttl_minutes<F>(lookup: &F, key: &'static str, default: i64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let minutes = parse_positive(lookup, key, default)?;
    if minutes > MAX_TTL_MINUTES {
        return Err(ConfigError::Invalid {
            key,
            message: format!("must be at most {} minutes", MAX_TTL_MINUTES),
        });
    }
    Duration::try_minutes(minutes).ok_or(ConfigError::Invalid {
        key,
        message: "out of range".to_string(),
    })
}

fn parse_positive<F>(lookup: &F, key: &'static str, default: i64) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = parse_or(lookup, key, default)?;
    if value <= 0 {
        return Err(ConfigError::Invalid {
            key,
            message: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
