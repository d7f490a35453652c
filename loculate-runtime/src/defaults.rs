use loculate_core::config::{ClientConfig, default_reply_timeout_ms, default_request_timeout_ms};

/// Where a locally run `loculate-proxy` listens by default.
pub const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:8787/";

pub fn default_client_config() -> ClientConfig {
    ClientConfig {
        proxy_url: DEFAULT_PROXY_URL.into(),
        request_timeout_ms: default_request_timeout_ms(),
        reply_timeout_ms: default_reply_timeout_ms(),
    }
}
