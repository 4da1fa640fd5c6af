//! API routes for sqlsaged

use crate::server::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use sqlsage_shared::{AskRequest, ErrorBody, HealthResponse, VERSION};
use std::sync::Arc;
use tracing::{error, info, warn};

type AppStateArc = Arc<AppState>;

const INDEX_HTML: &str = include_str!("../static/index.html");

// ============================================================================
// Page Routes
// ============================================================================

pub fn page_routes() -> Router<AppStateArc> {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

// ============================================================================
// Ask Routes
// ============================================================================

pub fn ask_routes() -> Router<AppStateArc> {
    Router::new().route("/ask", post(ask))
}

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

async fn ask(
    State(state): State<AppStateArc>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            warn!("  Rejected /ask body: {}", rejection.body_text());
            return bad_request(format!("Invalid request body: {}", rejection.body_text()));
        }
    };

    let Some(question) = req.question().map(str::to_string) else {
        return bad_request("Question is required");
    };

    info!("  Ask: {:?}", question);
    let pipeline = Arc::clone(&state.pipeline);
    match tokio::task::spawn_blocking(move || pipeline.run(&question)).await {
        Ok(run) => Json(run.context.into_response()).into_response(),
        Err(e) => {
            error!("  Pipeline worker panicked: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "Internal error while answering the question".to_string(),
                }),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/health", get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: VERSION.to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        database: state.pipeline.database(),
        model: state.pipeline.model().to_string(),
    })
}
