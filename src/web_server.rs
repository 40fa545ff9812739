use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    serve, Json, Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::constants::GENERIC_GATEWAY_ERROR;
use crate::gateway::{ChatError, ChatReply, ChatRequest};
use crate::llm_interaction::CompletionClient;

// Shared application state
#[derive(Clone)]
pub struct AppState {
    upstream: Arc<CompletionClient>,
}

impl AppState {
    pub fn new(upstream: CompletionClient) -> Self {
        Self {
            upstream: Arc::new(upstream),
        }
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    let error = if message.trim().is_empty() {
        GENERIC_GATEWAY_ERROR.to_string()
    } else {
        message
    };
    (status, Json(ChatError { error })).into_response()
}

// POST /api/chat: { message } -> { reply } | { error }
async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(%rejection, "Rejected malformed chat request");
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    info!(message_len = request.message.len(), "Received chat request");

    match state.upstream.complete(&request.message).await {
        Ok(reply) => (StatusCode::OK, Json(ChatReply { reply })).into_response(),
        Err(e) => {
            error!("Completion failed: {:?}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http()) // Add request logging
}

pub async fn start_web_server(port: u16, upstream: CompletionClient) -> Result<()> {
    info!(model = %upstream.model(), "Using completion model");
    let app = build_router(AppState::new(upstream));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Gateway listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}
