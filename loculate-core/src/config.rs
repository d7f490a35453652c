use serde::{Deserialize, Serialize};

/// Client-side settings shared by the coordinator and the panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the travel-time proxy.
    pub proxy_url: String,

    /// Upper bound on the coordinator's HTTP call to the proxy.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// How long the panel waits in `Loading` for a bus reply.
    #[serde(default = "default_reply_timeout_ms")]
    pub reply_timeout_ms: u64,
}

pub fn default_request_timeout_ms() -> u64 {
    15_000
}

pub fn default_reply_timeout_ms() -> u64 {
    20_000
}
