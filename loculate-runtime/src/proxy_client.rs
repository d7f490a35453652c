use anyhow::Context;
use async_trait::async_trait;
use loculate_core::config::ClientConfig;
use loculate_core::types::{RoutePair, TravelData};
use loculate_engine::traits::TravelTimeService;
use loculate_providers::proxy::{build_travel_time_request, parse_proxy_response};
use loculate_providers::runtime;
use std::time::Duration;

/// Travel-time service backed by the HTTP proxy.
#[derive(Debug, Clone)]
pub struct ProxyTravelTimeService {
    proxy_url: String,
    timeout: Duration,
}

impl ProxyTravelTimeService {
    pub fn new(proxy_url: impl Into<String>) -> Self {
        Self {
            proxy_url: proxy_url.into(),
            timeout: runtime::DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn from_config(cfg: &ClientConfig) -> Self {
        Self::new(cfg.proxy_url.clone())
            .with_timeout(Duration::from_millis(cfg.request_timeout_ms))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl TravelTimeService for ProxyTravelTimeService {
    async fn travel_time(&self, pair: &RoutePair) -> anyhow::Result<TravelData> {
        let req = build_travel_time_request(&self.proxy_url, pair)?;
        let resp = runtime::execute_with_timeout(&req, self.timeout)
            .await
            .context("Could not reach travel time service")?;
        Ok(parse_proxy_response(&resp)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn passes_pair_and_decodes_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("origin", "123 Main St"))
            .and(query_param("destination", "456 Oak Ave"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"duration":"12 mins","distance":"10.0 mi"}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let svc = ProxyTravelTimeService::new(server.uri());
        let data = svc
            .travel_time(&RoutePair::new("123 Main St", "456 Oak Ave"))
            .await
            .unwrap();
        assert_eq!(data.duration, "12 mins");
    }

    #[tokio::test]
    async fn rejection_message_is_the_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_raw(
                r#"{"error":"Missing origin or destination parameter"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let err = ProxyTravelTimeService::new(server.uri())
            .travel_time(&RoutePair::new("", "B"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing origin or destination parameter");
    }

    #[tokio::test]
    async fn unreachable_proxy_is_generic_failure() {
        let err = ProxyTravelTimeService::new("http://127.0.0.1:9/")
            .with_timeout(Duration::from_millis(500))
            .travel_time(&RoutePair::new("A", "B"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Could not reach travel time service");
    }
}
