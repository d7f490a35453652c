//! Client side of the travel-time proxy: `GET ?origin=..&destination=..`.

use crate::request::HttpRequest;
use crate::runtime::HttpResponse;
use anyhow::Context;
use loculate_core::types::{RoutePair, TravelData};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON body the proxy sends with every non-200 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProxyError {
    /// The proxy answered with an error body.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected proxy response (status {status})")]
    Malformed { status: u16 },
}

pub fn build_travel_time_request(proxy_url: &str, pair: &RoutePair) -> anyhow::Result<HttpRequest> {
    let url = url::Url::parse_with_params(
        proxy_url,
        &[
            ("origin", pair.origin.as_str()),
            ("destination", pair.destination.as_str()),
        ],
    )
    .with_context(|| format!("invalid proxy url: {proxy_url}"))?;
    Ok(HttpRequest::get(url.to_string()))
}

pub fn parse_proxy_response(resp: &HttpResponse) -> Result<TravelData, ProxyError> {
    if resp.is_success() {
        return serde_json::from_slice::<TravelData>(&resp.body)
            .map_err(|_| ProxyError::Malformed { status: resp.status });
    }

    match serde_json::from_slice::<ErrorBody>(&resp.body) {
        Ok(body) if !body.error.trim().is_empty() => Err(ProxyError::Rejected {
            status: resp.status,
            message: body.error,
        }),
        _ => Err(ProxyError::Malformed { status: resp.status }),
    }
}
