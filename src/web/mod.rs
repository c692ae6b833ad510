//! HTTP surface: the single page plus the JSON optimize endpoint.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::OptimizeError;
use crate::optimizer::Optimizer;

const INDEX_HTML: &str = include_str!("index.html");

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub optimizer: Arc<Optimizer>,
}

/// Build the Axum router.
pub fn routes(optimizer: Arc<Optimizer>) -> Router {
    let state = AppState { optimizer };

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/optimize", post(optimize))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "email-optimizer"
    }))
}

#[derive(Deserialize)]
struct OptimizeRequest {
    topic: String,
    #[serde(default, alias = "api_key")]
    credential: Option<SecretString>,
}

async fn optimize(
    State(state): State<AppState>,
    payload: Result<Json<OptimizeRequest>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => return rejection_response(&rejection),
    };
    let Some(api_key) = body.credential else {
        return error_response(&OptimizeError::MissingCredential);
    };

    match state.optimizer.optimize(&body.topic, &api_key).await {
        Ok(result) => {
            info!("Optimization complete");
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(e) => {
            if e.is_upstream() {
                warn!(error = %e, "Optimization failed");
            }
            error_response(&e)
        }
    }
}

fn error_response(error: &OptimizeError) -> Response {
    let (status, message) = match error {
        OptimizeError::InputRejected { .. } => (StatusCode::UNPROCESSABLE_ENTITY, error.to_string()),
        OptimizeError::MissingCredential => (StatusCode::UNAUTHORIZED, error.to_string()),
        OptimizeError::Generation(_) | OptimizeError::Evaluation(_) => {
            (StatusCode::BAD_GATEWAY, format!("Request failed: {error}"))
        }
    };
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Malformed bodies keep axum's status but use the same `{error}` shape.
fn rejection_response(rejection: &JsonRejection) -> Response {
    (
        rejection.status(),
        Json(serde_json::json!({ "error": rejection.body_text() })),
    )
        .into_response()
}
