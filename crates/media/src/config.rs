use std::time::Duration;

/// Media service connection settings.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Service base URL, without the `/api/storyboard` prefix.
    pub base_url: String,
    /// Per-request timeout. Generation calls routinely take minutes.
    pub request_timeout: Duration,
}

/// Default per-request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 600;

impl MediaConfig {
    /// Load media configuration from environment variables.
    ///
    /// | Env Var                      | Default                  |
    /// |------------------------------|--------------------------|
    /// | `MEDIA_API_URL`              | `http://localhost:8080`  |
    /// | `MEDIA_REQUEST_TIMEOUT_SECS` | `600`                    |
    pub fn from_env() -> Self {
        let base_url = std::env::var("MEDIA_API_URL")
            .unwrap_or_else(|_| "http://localhost:8080".into())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs: u64 = std::env::var("MEDIA_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_REQUEST_TIMEOUT_SECS.to_string())
            .parse()
            .expect("MEDIA_REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
        }
    }
}
