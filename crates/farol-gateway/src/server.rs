use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::stream;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use farol_core::{ChatError, ChatMode, ChatOrchestrator, ChatRequest};

use crate::types::{chunk_text, ChatStreamRequest, StreamLine};

/// Delivery chunk size in characters.
const CHUNK_CHARS: usize = 80;

const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson; charset=utf-8";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ChatOrchestrator>,
}

/// Create the Axum router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat/stream", post(chat_stream))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the gateway server
pub async fn start_server(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let router = create_router(state);
    let addr = format!("{}:{}", host, port);

    info!(addr = %addr, "Starting chat gateway");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Chat gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for Ctrl+C");
    info!("Shutdown signal received");
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Single NDJSON error line with the given HTTP status, emitted before
/// any stream begins.
fn error_response(status: StatusCode, error: String) -> Response {
    let line = StreamLine::Error { error }.to_ndjson();
    ndjson_response(status, Body::from(line))
}

fn ndjson_response(status: StatusCode, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(NDJSON_CONTENT_TYPE),
    );
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache, no-transform"));
    response
}

async fn chat_stream(
    State(state): State<AppState>,
    Json(request): Json<ChatStreamRequest>,
) -> Response {
    let chat_request = ChatRequest {
        message: request.message.trim().to_string(),
        history: request.sanitized_history(),
        mode: ChatMode::parse_or_default(&request.mode),
    };

    let reply = match state.orchestrator.handle(chat_request).await {
        Ok(reply) => reply,
        Err(error @ ChatError::EmptyMessage) => {
            return error_response(StatusCode::BAD_REQUEST, error.to_string());
        }
        Err(error) => {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, error.to_string());
        }
    };

    // Retrieval and generation are complete; the stream only delivers.
    // A consumer disconnect simply drops the remaining chunks.
    let mut lines = Vec::with_capacity(reply.answer.len() / CHUNK_CHARS + 3);
    lines.push(StreamLine::Meta {
        skills_used: reply.sources,
    });
    for chunk in chunk_text(&reply.answer, CHUNK_CHARS) {
        lines.push(StreamLine::Delta { text: chunk });
    }
    lines.push(StreamLine::Done);

    let body = Body::from_stream(stream::iter(
        lines
            .into_iter()
            .map(|line| Ok::<_, Infallible>(line.to_ndjson())),
    ));
    ndjson_response(StatusCode::OK, body).into_response()
}
