//! HTTP surface: `GET /?origin=..&destination=..` plus a permissive CORS preflight.

use crate::config::ProxyConfig;
use anyhow::Context;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use loculate_core::types::TravelData;
use loculate_core::units::format_miles;
use loculate_providers::distance_matrix::DistanceMatrixClient;
use loculate_providers::proxy::ErrorBody;
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;

pub const MISSING_PARAMS: &str = "Missing origin or destination parameter";
pub const KEY_NOT_CONFIGURED: &str = "API key not configured";
pub const INTERNAL_ERROR: &str = "Internal server error";

#[derive(Clone)]
struct AppState {
    /// `None` when no provider credential is configured.
    client: Option<Arc<DistanceMatrixClient>>,
}

/// The first `origin` and `destination` values; later repeats are ignored.
#[derive(Debug, Default)]
struct TravelQuery {
    origin: Option<String>,
    destination: Option<String>,
}

impl TravelQuery {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "origin" => &mut query.origin,
                "destination" => &mut query.destination,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody::new(self.message))).into_response()
    }
}

pub fn router(cfg: &ProxyConfig) -> Router {
    let client = cfg.distance_matrix().map(|dm| {
        Arc::new(DistanceMatrixClient::new(dm).with_timeout(cfg.upstream_timeout))
    });
    if client.is_none() {
        log::warn!("no provider API key configured; travel requests will fail");
    }

    Router::new()
        .route("/", get(travel_time).options(preflight))
        .with_state(AppState { client })
        .layer(cors_header(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(cors_header(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, OPTIONS"),
        ))
        .layer(cors_header(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
}

/// Serves the router on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: tokio::net::TcpListener,
    cfg: &ProxyConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    axum::serve(listener, router(cfg))
        .with_graceful_shutdown(shutdown)
        .await
        .context("serve proxy")
}

fn cors_header(name: HeaderName, value: HeaderValue) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(name, value)
}

/// OPTIONS /
async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// GET /
async fn travel_time(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<TravelData>, ApiError> {
    log::info!("processing travel request");
    let query = TravelQuery::from_pairs(pairs);

    let (Some(origin), Some(destination)) =
        (non_blank(query.origin), non_blank(query.destination))
    else {
        log::info!("rejecting travel request with missing parameters");
        return Err(ApiError::bad_request(MISSING_PARAMS));
    };

    let Some(client) = state.client.as_ref() else {
        log::error!("travel request refused: provider API key not configured");
        return Err(ApiError::internal(KEY_NOT_CONFIGURED));
    };

    log::debug!("calling distance matrix provider");
    match client.route(&origin, &destination).await {
        Ok(leg) => {
            log::info!("travel request answered");
            Ok(Json(TravelData {
                duration: leg.duration_text,
                distance: format_miles(leg.distance_meters),
            }))
        }
        Err(e) if e.is_upstream_rejection() => {
            log::warn!("provider rejected route: {e}");
            Err(ApiError::bad_request(e.to_string()))
        }
        Err(e) => {
            log::error!("travel request failed: {e:#}");
            Err(ApiError::internal(INTERNAL_ERROR))
        }
    }
}
