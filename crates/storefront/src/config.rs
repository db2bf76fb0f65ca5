//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 5000)
//! - `STOREFRONT_UPLOAD_DIR` - Directory for uploaded images (default: uploads)
//! - `STOREFRONT_UPLOAD_BASE_URL` - URL prefix of stored images (default: /uploads)
//! - `STOREFRONT_MAX_UPLOAD_BYTES` - Request body limit for uploads (default: 10 MiB)
//! - `STOREFRONT_CORS_ORIGINS` - Comma-separated allowed origins
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0 to 1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0 to 1.0 (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_PORT: &str = "5000";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://localhost:5000";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Directory uploaded images are written to
    pub upload_dir: PathBuf,
    /// URL prefix under which uploaded images are served
    pub upload_base_url: String,
    /// Largest accepted request body, in bytes
    pub max_upload_bytes: usize,
    /// Origins allowed by CORS
    pub cors_origins: Vec<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key/value source.
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = get("STOREFRONT_DATABASE_URL")
            .or_else(|| get("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("STOREFRONT_DATABASE_URL".to_owned()))?;

        let host = parse_var(&get, "STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_var(&get, "STOREFRONT_PORT", DEFAULT_PORT)?;
        let upload_dir = get("STOREFRONT_UPLOAD_DIR").map_or_else(|| "uploads".into(), PathBuf::from);
        let upload_base_url =
            get("STOREFRONT_UPLOAD_BASE_URL").unwrap_or_else(|| "/uploads".to_owned());
        let max_upload_bytes = match get("STOREFRONT_MAX_UPLOAD_BYTES") {
            Some(raw) => parse_value("STOREFRONT_MAX_UPLOAD_BYTES", &raw)?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };
        let cors_origins = split_origins(
            &get("STOREFRONT_CORS_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_owned()),
        );

        let sentry_dsn = get("SENTRY_DSN").filter(|dsn| !dsn.trim().is_empty());
        let sentry_environment = get("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = parse_rate(&get, "SENTRY_SAMPLE_RATE", 1.0)?;
        let sentry_traces_sample_rate = parse_rate(&get, "SENTRY_TRACES_SAMPLE_RATE", 0.1)?;

        Ok(Self {
            database_url,
            host,
            port,
            upload_dir,
            upload_base_url,
            max_upload_bytes,
            cors_origins,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
}

/// Parse a variable, using `default` when it is unset.
fn parse_var<T>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get(key).unwrap_or_else(|| default.to_owned());
    parse_value(key, &raw)
}

/// Parse a sample rate and check it lies in `[0, 1]`.
fn parse_rate(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: f32,
) -> Result<f32, ConfigError> {
    let Some(raw) = get(key) else {
        return Ok(default);
    };
    let rate: f32 = parse_value(key, &raw)?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_owned(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ));
    }
    Ok(rate)
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| origin.trim_end_matches('/').to_owned())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        StorefrontConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("STOREFRONT_DATABASE_URL", "postgres://localhost/shop")]).unwrap();

        assert_eq!(config.port, 5000);
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:5000");
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.upload_base_url, "/uploads");
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(
            config.cors_origins,
            vec!["http://localhost:5173", "http://localhost:5000"]
        );
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[("DATABASE_URL", "postgres://fly/shop")]).unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://fly/shop");

        let config = load(&[
            ("STOREFRONT_DATABASE_URL", "postgres://primary/shop"),
            ("DATABASE_URL", "postgres://fly/shop"),
        ])
        .unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://primary/shop");
    }

    #[test]
    fn test_missing_database_url() {
        assert!(matches!(
            load(&[]),
            Err(ConfigError::MissingEnvVar(key)) if key == "STOREFRONT_DATABASE_URL"
        ));
    }

    #[test]
    fn test_invalid_values() {
        let base = ("STOREFRONT_DATABASE_URL", "postgres://localhost/shop");
        assert!(matches!(
            load(&[base, ("STOREFRONT_PORT", "http")]),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "STOREFRONT_PORT"
        ));
        assert!(load(&[base, ("STOREFRONT_HOST", "localhost:80")]).is_err());
        assert!(load(&[base, ("SENTRY_SAMPLE_RATE", "1.5")]).is_err());
    }

    #[test]
    fn test_cors_origins_are_trimmed() {
        let config = load(&[
            ("STOREFRONT_DATABASE_URL", "postgres://localhost/shop"),
            (
                "STOREFRONT_CORS_ORIGINS",
                " https://shop.example.com/ , ,https://admin.example.com",
            ),
        ])
        .unwrap();

        assert_eq!(
            config.cors_origins,
            vec!["https://shop.example.com", "https://admin.example.com"]
        );
    }
}
