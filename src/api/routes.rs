use std::any::Any;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, error};

use crate::api::health::{HealthSnapshot, HealthState};
use crate::api::latency::{LatencyReport, LatencyStats};
use crate::config::{Config, PRICE_REVALIDATE_SECS};
use crate::error::{failure, AppError, Result};
use crate::fetcher::PriceResolver;
use crate::relay::WaitlistRelay;
use crate::types::PriceResult;

#[derive(Clone)]
pub struct ApiState {
    pub resolver: Arc<PriceResolver>,
    pub relay: Arc<WaitlistRelay>,
    pub health: Arc<HealthState>,
    pub latency: Arc<LatencyStats>,
}

impl ApiState {
    /// One pooled HTTP client shared by both handlers. No client-wide timeout:
    /// price lookups use transport defaults and the relay sets its own deadline.
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let latency = Arc::new(LatencyStats::new());
        let relay = WaitlistRelay::new(client.clone(), cfg, Arc::clone(&latency));

        Ok(Self {
            resolver: Arc::new(PriceResolver::new(client, cfg, Arc::clone(&latency))),
            health: Arc::new(HealthState::new(relay.is_configured())),
            relay: Arc::new(relay),
            latency,
        })
    }
}

pub fn router(state: ApiState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/api/token-price", get(get_token_price))
        .route("/api/waitlist", post(post_waitlist))
        .route("/health", get(get_health))
        .route("/stats/latency", get(get_stats_latency))
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// `*` allows any origin, anything else must be a single valid origin.
pub fn cors_layer(allow_origin: &str) -> Result<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if allow_origin.trim() == "*" {
        return Ok(cors.allow_origin(AnyOrigin));
    }
    let origin = HeaderValue::from_str(allow_origin.trim())
        .map_err(|_| AppError::Config(format!("invalid CORS_ALLOW_ORIGIN: {allow_origin}")))?;
    Ok(cors.allow_origin(origin))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Always 200. Failures upstream are absorbed into the default price.
async fn get_token_price(State(state): State<ApiState>) -> impl IntoResponse {
    let (price, source) = state.resolver.resolve().await;
    state.health.record_price(source);
    debug!("token price {} served from {source}", price.price);

    let cache_control = format!(
        "public, s-maxage={PRICE_REVALIDATE_SECS}, stale-while-revalidate={PRICE_REVALIDATE_SECS}"
    );
    ([(header::CACHE_CONTROL, cache_control)], Json::<PriceResult>(price))
}

async fn post_waitlist(State(state): State<ApiState>, body: Bytes) -> Response {
    let outcome = state.relay.submit(&body).await;
    state.health.record_relay(outcome.is_ok());

    match outcome {
        Ok(data) => Json(data).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthSnapshot> {
    Json(state.health.snapshot())
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<LatencyReport> {
    Json(state.latency.report())
}

/// A panicking handler still answers with the normalized error body.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        String::new()
    };
    error!("[api] internal error: {message}");
    failure(StatusCode::INTERNAL_SERVER_ERROR, message)
}
