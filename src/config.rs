//! Backend endpoint configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

pub const DEFAULT_LOCAL_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(String),

    #[error("missing required env var {var}")]
    Missing { var: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiEnvironment {
    Local,
    Deployed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub environment: ApiEnvironment,
    pub base_url: String,
    pub timeouts: RequestTimeouts,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `PAYDRIFT_ENV`: `local` (default) or `deployed`
    /// - `PAYDRIFT_API_URL`: required when deployed, default `http://localhost:8000` locally
    /// - `PAYDRIFT_REQUEST_TIMEOUT_SECS`: default 120
    /// - `PAYDRIFT_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown environment or a deployed environment
    /// without an API URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let environment = parse_environment(lookup("PAYDRIFT_ENV").as_deref())?;
        let base_url = match (environment, lookup("PAYDRIFT_API_URL")) {
            (_, Some(url)) => url,
            (ApiEnvironment::Local, None) => DEFAULT_LOCAL_API_URL.to_owned(),
            (ApiEnvironment::Deployed, None) => return Err(ConfigError::Missing { var: "PAYDRIFT_API_URL" }),
        };
        let timeouts = RequestTimeouts {
            request_secs: parse_u64(&lookup, "PAYDRIFT_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64(&lookup, "PAYDRIFT_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { environment, base_url: normalize_base_url(&base_url), timeouts })
    }

    /// Replace the base URL, e.g. from a CLI flag.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            environment: ApiEnvironment::Local,
            base_url: DEFAULT_LOCAL_API_URL.to_owned(),
            timeouts: RequestTimeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
        }
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    lookup(key)
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_environment(raw: Option<&str>) -> Result<ApiEnvironment, ConfigError> {
    match raw.unwrap_or("local") {
        "local" => Ok(ApiEnvironment::Local),
        "deployed" => Ok(ApiEnvironment::Deployed),
        other => Err(ConfigError::Parse(format!(
            "unknown PAYDRIFT_ENV '{other}' (expected 'local' or 'deployed')"
        ))),
    }
}
