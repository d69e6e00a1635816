use storysplice_cloud::config::StorageConfig;
use storysplice_media::config::MediaConfig;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `900`).
    ///
    /// Must outlast the media request timeout: generation and rendering
    /// calls run inside a single request.
    pub request_timeout_secs: u64,
    /// Upper bound for draining in-flight requests on shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Idle time after which an editor session is evicted (default: `3600`).
    pub session_ttl_secs: u64,
    /// Largest accepted request body, in bytes (default: 512 MiB).
    pub max_upload_bytes: usize,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    pub media: MediaConfig,
    pub storage: StorageConfig,
}

const DEFAULT_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                    |
    /// |---------------------------|----------------------------|
    /// | `HOST`                    | `0.0.0.0`                  |
    /// | `PORT`                    | `3000`                     |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`    | `900`                      |
    /// | `SHUTDOWN_TIMEOUT_SECS`   | `30`                       |
    /// | `EDITOR_SESSION_TTL_SECS` | `3600`                     |
    /// | `MAX_UPLOAD_BYTES`        | `536870912`                |
    ///
    /// JWT, media and storage settings are read by their own `from_env`.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "900".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let session_ttl_secs: u64 = std::env::var("EDITOR_SESSION_TTL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("EDITOR_SESSION_TTL_SECS must be a valid u64");

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_BYTES.to_string())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            session_ttl_secs,
            max_upload_bytes,
            jwt: JwtConfig::from_env(),
            media: MediaConfig::from_env(),
            storage: StorageConfig::from_env(),
        }
    }
}
