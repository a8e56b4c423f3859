//! REST API Server for the finance chat agent
//!
//! Exposes the agent via HTTP endpoints
//! Integrates with the browser chat UI

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::agent::FinanceAgent;
use crate::classifier::tables::TABLES_VERSION;
use crate::error::AgentError;
use crate::models::AgentRequest;

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::error(message.into()))).into_response()
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<FinanceAgent>,
    pub api_base_url: String,
}

/// =============================
/// Health & Config Endpoints
/// =============================

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "message": "Your Finance Bro API is running"
    }))
}

async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "model": state.agent.model_name(),
        "classifier_tables": TABLES_VERSION,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn client_config(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "apiBaseUrl": state.api_base_url }))
}

/// =============================
/// Chat Endpoint
/// =============================

async fn chat_handler(State(state): State<ApiState>, Json(req): Json<AgentRequest>) -> Response {
    if req.user_query.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "User query cannot be empty");
    }

    let Some(finance_info) = req.finance_info.as_ref() else {
        return error_response(StatusCode::BAD_REQUEST, "Finance info is required");
    };

    let chat_history = req.chat_history.as_deref().unwrap_or_default();

    info!(
        query_chars = req.user_query.len(),
        history = chat_history.len(),
        "Received chat request"
    );

    let replies = match state
        .agent
        .respond(&req.user_query, finance_info, chat_history)
        .await
    {
        Ok(replies) => replies,
        Err(AgentError::InvalidRequest(message)) => {
            return error_response(StatusCode::BAD_REQUEST, message);
        }
        Err(e) => {
            error!("Chat request failed: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("An error occurred while processing your request: {}", e),
            );
        }
    };

    // Newline-delimited JSON; an error mid-stream aborts the body
    let lines = replies.map(|reply| -> Result<String, AgentError> {
        let reply = reply.map_err(|e| {
            error!("Chat stream failed: {}", e);
            e
        })?;
        let mut line = serde_json::to_string(&reply)?;
        line.push('\n');
        Ok(line)
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from_stream(lines))
        .unwrap_or_else(|e| {
            error!("Failed to build streaming response: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to build response")
        })
}

/// =============================
/// Router
/// =============================

pub fn create_router(agent: Arc<FinanceAgent>, api_base_url: String) -> Router {
    let state = ApiState {
        agent,
        api_base_url,
    };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/config", get(client_config))
        .route("/agent/chat", post(chat_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    agent: Arc<FinanceAgent>,
    api_base_url: String,
    bind_addr: &str,
) -> crate::Result<()> {
    let router = create_router(agent, api_base_url);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;

    info!("API Server listening on http://{}", bind_addr);

    axum::serve(listener, router).await?;

    Ok(())
}
