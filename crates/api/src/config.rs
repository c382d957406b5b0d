//! # API Configuration Module
//!
//! Loads the server configuration from environment variables once at startup.
//! Nothing else in the service reads the environment; the resulting
//! [`ApiConfig`] is handed to [`crate::start_server`] explicitly.
//!
//! ## Environment Variables
//!
//! - `API_HOST`: The host address to bind the server to (default: "0.0.0.0")
//! - `API_PORT`: The port to listen on (default: 3000)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 5)
//! - `LOG_LEVEL`: Logging level (default: "info")
//! - `API_CORS_ORIGINS`: Comma-separated list of allowed CORS origins
//! - `STATIC_TOKENS`: Comma-separated list of bearer tokens accepted on protected routes
//! - `JWT_SECRET` (or `JWT_HMAC_SECRET`): HMAC secret for verifying bearer JWTs (optional)
//! - `API_REQUEST_TIMEOUT_SECONDS`: Per-request timeout (default: 30)

use eyre::{Result, WrapErr};
use std::env;
use tracing::Level;

/// Configuration for the slotbook API server
///
/// # Example
///
/// ```no_run
/// use eyre::Result;
/// use slotbook_api::config::ApiConfig;
///
/// fn example() -> Result<()> {
///     let config = ApiConfig::from_env()?;
///     println!("Starting server on {}", config.server_addr());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host address for the API server (e.g., "127.0.0.1", "0.0.0.0")
    pub host: String,

    /// Port for the API server to listen on
    pub port: u16,

    /// PostgreSQL database connection string
    pub database_url: String,

    /// Upper bound on pooled database connections
    pub database_max_connections: u32,

    /// Log level for the application
    pub log_level: Level,

    /// CORS allowed origins (optional)
    pub cors_origins: Option<Vec<String>>,

    /// Bearer tokens accepted without an API key lookup
    pub static_tokens: Vec<String>,

    /// JWT secret for verifying HMAC-signed bearer tokens (optional)
    pub jwt_secret: Option<String>,

    /// Request timeout in seconds
    pub request_timeout: u64,
}

impl ApiConfig {
    /// Creates a new ApiConfig from environment variables
    ///
    /// # Errors
    ///
    /// - `DATABASE_URL` is not set
    /// - `API_PORT` or `DATABASE_MAX_CONNECTIONS` cannot be parsed
    pub fn from_env() -> Result<Self> {
        // Network settings
        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("API_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .wrap_err("Invalid API_PORT value")?;

        // Database settings
        let database_url = env::var("DATABASE_URL")
            .wrap_err("DATABASE_URL environment variable must be set")?;
        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .wrap_err("Invalid DATABASE_MAX_CONNECTIONS value")?;

        // Logging settings
        let log_level = parse_log_level(&env::var("LOG_LEVEL").unwrap_or_default());

        // CORS settings
        let cors_origins = env::var("API_CORS_ORIGINS").ok().map(|origins| split_list(&origins));

        // Security settings
        let static_tokens = env::var("STATIC_TOKENS")
            .map(|tokens| split_list(&tokens))
            .unwrap_or_default();
        let jwt_secret = env::var("JWT_SECRET")
            .or_else(|_| env::var("JWT_HMAC_SECRET"))
            .ok()
            .map(|secret| secret.trim().to_string())
            .filter(|secret| !secret.is_empty());

        // Performance settings
        let request_timeout = env::var("API_REQUEST_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        Ok(Self {
            host,
            port,
            database_url,
            database_max_connections,
            log_level,
            cors_origins,
            static_tokens,
            jwt_secret,
            request_timeout,
        })
    }

    /// Returns the server address as a string (e.g., "127.0.0.1:8080")
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn accepts_static_token(&self, token: &str) -> bool {
        self.static_tokens.iter().any(|t| t == token)
    }
}

fn parse_log_level(value: &str) -> Level {
    match value.trim().to_ascii_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_values_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(split_list(" a, b ,,c ,"), vec!["a", "b", "c"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        assert_eq!(parse_log_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_log_level("verbose"), Level::INFO);
        assert_eq!(parse_log_level(""), Level::INFO);
    }

    #[test]
    fn static_tokens_match_exactly() {
        let config = ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            database_url: "postgres://localhost/slotbook".to_string(),
            database_max_connections: 5,
            log_level: Level::INFO,
            cors_origins: None,
            static_tokens: vec!["s3cret".to_string()],
            jwt_secret: None,
            request_timeout: 30,
        };

        assert!(config.accepts_static_token("s3cret"));
        assert!(!config.accepts_static_token("s3cret "));
        assert!(!config.accepts_static_token(""));
        assert_eq!(config.server_addr(), "127.0.0.1:3000");
    }
}
