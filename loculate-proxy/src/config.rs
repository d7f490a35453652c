use anyhow::Context;
use loculate_providers::distance_matrix::{DEFAULT_DISTANCE_MATRIX_URL, DistanceMatrixConfig};
use std::net::SocketAddr;
use std::time::Duration;

pub const ENV_BIND: &str = "LOCULATE_BIND";
pub const ENV_API_KEY: &str = "GOOGLE_MAPS_API_KEY";
pub const ENV_DISTANCE_MATRIX_URL: &str = "LOCULATE_DISTANCE_MATRIX_URL";

pub const DEFAULT_BIND: &str = "127.0.0.1:8787";
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub bind: SocketAddr,
    /// Provider credential. `None` makes every valid request fail with 500.
    pub api_key: Option<String>,
    pub distance_matrix_url: String,
    pub upstream_timeout: Duration,
}

impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("bind", &self.bind)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("distance_matrix_url", &self.distance_matrix_url)
            .field("upstream_timeout", &self.upstream_timeout)
            .finish()
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8787)),
            api_key: None,
            distance_matrix_url: DEFAULT_DISTANCE_MATRIX_URL.into(),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }
}

impl ProxyConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_raw = get(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .parse()
            .with_context(|| format!("invalid {ENV_BIND}: {bind_raw}"))?;

        Ok(Self {
            bind,
            api_key: get(ENV_API_KEY),
            distance_matrix_url: get(ENV_DISTANCE_MATRIX_URL)
                .unwrap_or_else(|| DEFAULT_DISTANCE_MATRIX_URL.to_string()),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        })
    }

    pub fn distance_matrix(&self) -> Option<DistanceMatrixConfig> {
        self.api_key.as_ref().map(|key| DistanceMatrixConfig {
            base_url: self.distance_matrix_url.clone(),
            api_key: key.clone(),
        })
    }
}
