//! HTTP surface for the Evolution API webhook.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use finbalance_core::today_in;
use finbalance_finance::{WebhookOrchestrator, WebhookOutcome};
use finbalance_ingest::WebhookPayload;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing::{error, info};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<WebhookOrchestrator>,
    pub timezone: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(receive_webhook))
        // path the hosted edge function used, so existing gateway setups keep working
        .route("/functions/v1/whatsapp-webhook", post(receive_webhook))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn serve(bind: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    info!("FinBalance webhook listening on http://{bind}");
    axum::serve(listener, build_router(state))
        .await
        .context("server error")
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": VERSION }))
}

type ApiError = (StatusCode, Json<Value>);

fn internal(err: anyhow::Error) -> ApiError {
    error!(error = %err, "webhook failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": format!("{err:#}") })),
    )
}

async fn receive_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let payload: WebhookPayload = serde_json::from_slice(&body)
        .context("invalid webhook payload")
        .map_err(internal)?;
    let today = today_in(state.timezone.as_deref()).map_err(internal)?;

    let body = match state.orchestrator.handle(&payload, today).await {
        WebhookOutcome::Test => json!({ "success": true, "message": "Webhook is working!" }),
        WebhookOutcome::NoMessage => {
            json!({ "success": true, "message": "No message to process" })
        }
        WebhookOutcome::Processed { parsed, .. } => json!({ "success": true, "parsed": parsed }),
    };
    Ok(Json(body))
}
