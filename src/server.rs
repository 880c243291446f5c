//! HTTP surface: liveness, embedding health probe, and `/ask`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::PipelineError;
use crate::pipeline::{Answer, Pipeline};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
}

impl AppState {
    /// Wraps a pipeline for the router.
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/ask", post(ask))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug, Serialize)]
struct HomeBody {
    message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum HealthBody {
    Ok { embedding_dim: usize },
    Error { detail: String },
}

type ApiError = (StatusCode, Json<ErrorBody>);

async fn home() -> Json<HomeBody> {
    Json(HomeBody {
        message: "Jyotir Brahmana Vedanta API is live.",
    })
}

async fn health(State(state): State<AppState>) -> Json<HealthBody> {
    let embedder = state.pipeline.embedder().clone();
    let probe = tokio::task::spawn_blocking(move || embedder.embed("health check")).await;
    let body = match probe {
        Ok(Ok(vector)) => HealthBody::Ok {
            embedding_dim: vector.len(),
        },
        Ok(Err(err)) => {
            warn!(error = %format!("{err:#}"), "health probe embedding failed");
            HealthBody::Error {
                detail: format!("{err:#}"),
            }
        }
        Err(err) => HealthBody::Error {
            detail: format!("health probe task failed: {err}"),
        },
    };
    Json(body)
}

async fn ask(
    State(state): State<AppState>,
    request: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<Answer>, ApiError> {
    let Json(request) = request.map_err(|rejection| bad_request(rejection.body_text()))?;
    if request.question.trim().is_empty() {
        return Err(bad_request(PipelineError::EmptyQuestion.to_string()));
    }
    let pipeline = state.pipeline.clone();
    let outcome = tokio::task::spawn_blocking(move || pipeline.answer(&request.question))
        .await
        .map_err(|err| internal_error(format!("pipeline task failed: {err}")))?;
    match outcome {
        Ok(answer) => Ok(Json(answer)),
        Err(err) if err.is_client_error() => Err(bad_request(err.to_string())),
        Err(err) => {
            error!(error = %err, "ask failed");
            Err(internal_error(err.to_string()))
        }
    }
}

fn bad_request(detail: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            detail: detail.into(),
        }),
    )
}

fn internal_error(detail: impl Into<String>) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            detail: detail.into(),
        }),
    )
}
