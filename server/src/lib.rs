//! ============================================================================
//! JOLIE SERVER - HTTP surface for the Jolie chat backend
//! ============================================================================
//! Wires configuration, the memory store and the completion client into an
//! axum router:
//! - POST /chat            conversation pipeline (primary) or passthrough (relay)
//! - GET  /health          liveness
//! - /memory/*             profile CRUD (primary only)
//! ============================================================================

pub mod error;
pub mod memory_routes;

use anyhow::{anyhow, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use jolie_core::{
    BackendVariant, ChatOrchestrator, ChatRequest, CompletionClient, CompletionProvider,
    ConfigError, JolieConfig, MemoryStore, RelayChat, SupabaseStore,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::error::ApiError;

/// Chat behavior selected at startup
pub enum ChatBackend {
    Primary(ChatOrchestrator),
    Relay(RelayChat),
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<ChatBackend>,
    /// Present for the primary variant
    pub store: Option<Arc<dyn MemoryStore>>,
}

impl AppState {
    pub fn primary(store: Arc<dyn MemoryStore>, provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            backend: Arc::new(ChatBackend::Primary(ChatOrchestrator::new(
                store.clone(),
                provider,
            ))),
            store: Some(store),
        }
    }

    pub fn relay(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            backend: Arc::new(ChatBackend::Relay(RelayChat::new(provider))),
            store: None,
        }
    }

    /// Build live clients from configuration
    pub fn from_config(config: &JolieConfig) -> Result<Self, ConfigError> {
        let provider: Arc<dyn CompletionProvider> = Arc::new(CompletionClient::new(
            config.model.clone(),
            config.retry.clone(),
        ));

        match config.variant {
            BackendVariant::Primary => {
                let store_config = config
                    .store
                    .as_ref()
                    .ok_or(ConfigError::MissingStoreCredentials)?;
                Ok(Self::primary(
                    Arc::new(SupabaseStore::new(store_config)),
                    provider,
                ))
            }
            BackendVariant::Relay => Ok(Self::relay(provider)),
        }
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/chat", post(chat))
        .route("/health", get(health));

    if matches!(state.backend.as_ref(), ChatBackend::Primary(_)) {
        router = router.merge(memory_routes::router());
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let span = info_span!("chat", request_id = %Uuid::new_v4());

    dispatch(&state, &request).instrument(span).await
}

async fn dispatch(state: &AppState, request: &ChatRequest) -> Result<Json<Value>, ApiError> {
    match state.backend.as_ref() {
        ChatBackend::Primary(orchestrator) => {
            let reply = orchestrator.handle(request).await?;
            Ok(Json(reply.into_json()))
        }
        ChatBackend::Relay(relay) => Ok(Json(relay.handle(&request.message).await?)),
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Load configuration, build the router and serve until shutdown
pub async fn run() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Could not load .env file: {}", e);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = JolieConfig::from_env()?;
    let state = AppState::from_config(&config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|e| anyhow!("Failed to bind {}: {}", config.bind_addr, e))?;
    info!(
        "Jolie ({:?}) listening on {} with model {}",
        config.variant, config.bind_addr, config.model.model
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow!("Server error: {}", e))
}
