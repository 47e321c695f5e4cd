//! HTTP API gateway for agentdesk.
//!
//! Endpoints:
//!
//! - `GET  /`: Liveness greeting
//! - `GET  /health`: Status plus whether a provider key is configured
//! - `GET  /agents`: Agent catalog
//! - `POST /agent/ask`: Answer a query with the selected agent
//!
//! Built on Axum. One task per request; the only shared state is the
//! read-only [`RequestRouter`].

pub mod agent_api;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::{Router, extract::State, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use agentdesk_agent::{AgentRegistry, RequestRouter};
use agentdesk_config::{AppConfig, GatewayConfig};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub router: Arc<RequestRouter>,
    pub has_api_key: bool,
    /// First characters of the key, for the health endpoint. Never the whole key.
    pub api_key_prefix: Option<String>,
}

impl GatewayState {
    pub fn new(router: Arc<RequestRouter>, config: &AppConfig) -> Self {
        Self {
            router,
            has_api_key: config.has_api_key(),
            api_key_prefix: config.api_key_prefix(),
        }
    }
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - CORS per `gateway.cors_origins`
/// - Request body size limit (`gateway.max_body_bytes`)
/// - HTTP trace logging
pub fn build_router(state: SharedState, gateway: &GatewayConfig) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .merge(agent_api::agent_router())
        .layer(DefaultBodyLimit::max(gateway.max_body_bytes))
        .layer(cors_layer(gateway))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(gateway: &GatewayConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if gateway.allows_any_origin() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = gateway
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Start the gateway HTTP server.
///
/// Fails before binding when no provider key is configured.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let providers = agentdesk_providers::build_from_config(&config)?;
    let provider = providers
        .default()
        .ok_or("no default provider configured")?;

    let registry = Arc::new(AgentRegistry::from_config(&config));
    info!(agents = registry.len(), "Agent registry loaded");

    let router = Arc::new(RequestRouter::from_config(provider, registry, &config));
    let state = Arc::new(GatewayState::new(router, &config));
    let app = build_router(state, &config.gateway);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct RootResponse {
    message: &'static str,
}

async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Hello World",
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
    has_groq_key: bool,
    groq_key_prefix: Option<String>,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "Agent backend is running",
        has_groq_key: state.has_api_key,
        groq_key_prefix: state.api_key_prefix.clone(),
    })
}
