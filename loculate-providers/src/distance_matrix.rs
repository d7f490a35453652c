//! Upstream distance-matrix provider: request building, response parsing, and a
//! thin client that ties the two to [`crate::runtime`].

use crate::request::HttpRequest;
use crate::runtime;
use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_DISTANCE_MATRIX_URL: &str =
    "https://maps.googleapis.com/maps/api/distancematrix/json";

const STATUS_OK: &str = "OK";

#[derive(Clone, PartialEq, Eq)]
pub struct DistanceMatrixConfig {
    pub base_url: String,
    pub api_key: String,
}

impl std::fmt::Debug for DistanceMatrixConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistanceMatrixConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// The one route element we care about.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLeg {
    pub duration_text: String,
    pub distance_meters: f64,
}

#[derive(Debug, Error)]
pub enum DistanceMatrixError {
    /// Top-level status other than `OK`.
    #[error("Distance Matrix API error: {status}{}", detail_suffix(.message))]
    Status {
        status: String,
        message: Option<String>,
    },
    /// Per-element status other than `OK`.
    #[error("Failed to calculate route: {0}")]
    Element(String),
    #[error("distance matrix response has no route element")]
    MissingElement,
    #[error("decode distance matrix JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

fn detail_suffix(message: &Option<String>) -> String {
    match message.as_deref().map(str::trim) {
        Some(m) if !m.is_empty() => format!(" ({m})"),
        _ => String::new(),
    }
}

impl DistanceMatrixError {
    /// The provider answered but refused the route (as opposed to us failing).
    pub fn is_upstream_rejection(&self) -> bool {
        matches!(
            self,
            DistanceMatrixError::Status { .. } | DistanceMatrixError::Element(_)
        )
    }
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    #[serde(default)]
    duration: Option<TextValue>,
    #[serde(default)]
    distance: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    text: String,
    value: f64,
}

pub fn build_distance_matrix_request(
    cfg: &DistanceMatrixConfig,
    origin: &str,
    destination: &str,
) -> anyhow::Result<HttpRequest> {
    let url = url::Url::parse_with_params(
        &cfg.base_url,
        &[
            ("origins", origin),
            ("destinations", destination),
            ("mode", "driving"),
            ("key", cfg.api_key.as_str()),
        ],
    )
    .with_context(|| format!("invalid distance matrix url: {}", cfg.base_url))?;
    Ok(HttpRequest::get(url.to_string()))
}

pub fn parse_distance_matrix(body: &[u8]) -> Result<RouteLeg, DistanceMatrixError> {
    let resp: MatrixResponse = serde_json::from_slice(body)?;
    if resp.status != STATUS_OK {
        return Err(DistanceMatrixError::Status {
            status: resp.status,
            message: resp.error_message,
        });
    }

    let element = resp
        .rows
        .into_iter()
        .next()
        .and_then(|row| row.elements.into_iter().next())
        .ok_or(DistanceMatrixError::MissingElement)?;

    if element.status != STATUS_OK {
        return Err(DistanceMatrixError::Element(element.status));
    }

    match (element.duration, element.distance) {
        (Some(duration), Some(distance)) => Ok(RouteLeg {
            duration_text: duration.text,
            distance_meters: distance.value,
        }),
        _ => Err(DistanceMatrixError::MissingElement),
    }
}

#[derive(Debug, Clone)]
pub struct DistanceMatrixClient {
    cfg: DistanceMatrixConfig,
    timeout: Duration,
}

impl DistanceMatrixClient {
    pub fn new(cfg: DistanceMatrixConfig) -> Self {
        Self {
            cfg,
            timeout: runtime::DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn route(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<RouteLeg, DistanceMatrixError> {
        let req = build_distance_matrix_request(&self.cfg, origin, destination)?;
        log::debug!("calling distance matrix: {req:?}");
        let resp = runtime::execute_with_timeout(&req, self.timeout).await?;
        // The provider reports failures in the JSON status even on HTTP 200, and
        // non-2xx bodies usually still carry a status we can surface.
        parse_distance_matrix(&resp.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cfg(base_url: &str) -> DistanceMatrixConfig {
        DistanceMatrixConfig {
            base_url: base_url.into(),
            api_key: "test-key".into(),
        }
    }

    const OK_BODY: &str = r#"{
        "status": "OK",
        "rows": [{"elements": [{
            "status": "OK",
            "duration": {"text": "12 mins", "value": 720},
            "distance": {"text": "10.0 mi", "value": 16093}
        }]}]
    }"#;

    #[test]
    fn builds_encoded_query() {
        let req = build_distance_matrix_request(
            &cfg("https://maps.example.com/json"),
            "123 Main St",
            "456 Oak Ave & 2nd",
        )
        .unwrap();
        assert_eq!(req.method, "GET");
        assert!(req.url.contains("origins=123+Main+St"));
        assert!(req.url.contains("destinations=456+Oak+Ave+%26+2nd"));
        assert!(req.url.contains("key=test-key"));
    }

    #[test]
    fn parses_ok_element() {
        let leg = parse_distance_matrix(OK_BODY.as_bytes()).unwrap();
        assert_eq!(leg.duration_text, "12 mins");
        assert_eq!(leg.distance_meters, 16093.0);
    }

    #[test]
    fn top_level_status_is_rejection() {
        let body = br#"{"status":"REQUEST_DENIED","error_message":"bad key","rows":[]}"#;
        let err = parse_distance_matrix(body).unwrap_err();
        assert!(err.is_upstream_rejection());
        assert_eq!(
            err.to_string(),
            "Distance Matrix API error: REQUEST_DENIED (bad key)"
        );
    }

    #[test]
    fn element_status_is_rejection() {
        let body = br#"{"status":"OK","rows":[{"elements":[{"status":"NOT_FOUND"}]}]}"#;
        let err = parse_distance_matrix(body).unwrap_err();
        assert!(err.is_upstream_rejection());
        assert_eq!(err.to_string(), "Failed to calculate route: NOT_FOUND");
    }

    #[test]
    fn empty_rows_is_not_a_rejection() {
        let err = parse_distance_matrix(br#"{"status":"OK","rows":[]}"#).unwrap_err();
        assert!(!err.is_upstream_rejection());
    }

    #[test]
    fn garbage_is_decode_error() {
        let err = parse_distance_matrix(b"<html>").unwrap_err();
        assert!(matches!(err, DistanceMatrixError::Decode(_)));
    }

    #[tokio::test]
    async fn client_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("origins", "123 Main St"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(OK_BODY, "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let client = DistanceMatrixClient::new(cfg(&server.uri()));
        let leg = client.route("123 Main St", "456 Oak Ave").await.unwrap();
        assert_eq!(leg.duration_text, "12 mins");
    }
}
