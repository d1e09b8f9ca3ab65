//! HTTP API over the retrieval engine and the quiz corpus.
//!
//! The engine and corpus are built once at startup and shared through axum
//! state.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tutor_knowledge::{CorpusRecord, RetrievalEngine, RetrievalResponse};
use tutor_quiz::{analyze_performance, generate_quiz, QuizRequest, ResultItem, DEFAULT_DIFFICULTY};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<RetrievalEngine>,
    pub corpus: Arc<Vec<CorpusRecord>>,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question_text: String,

    /// Accepted for compatibility; retrieval does not filter on it
    #[serde(default)]
    pub subject: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuizGenerateRequest {
    pub topic: String,
    #[serde(default)]
    pub difficulty: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub results: Vec<ResultItem>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/retrieve", post(retrieve_context))
        .route("/quiz/generate", post(quiz_generate))
        .route("/quiz/analyze", post(quiz_analyze))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn home() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "Online",
        "message": "AI Tutor Backend is running",
    }))
}

async fn retrieve_context(
    State(state): State<ServerState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<RetrievalResponse>, ApiError> {
    if request.question_text.trim().is_empty() {
        return Err(error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "question_text must not be empty",
        ));
    }

    tracing::info!(subject = ?request.subject, "Received query: {}", request.question_text);

    state
        .engine
        .retrieve(&request.question_text)
        .await
        .map(Json)
        .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

async fn quiz_generate(
    State(state): State<ServerState>,
    Json(request): Json<QuizGenerateRequest>,
) -> Json<serde_json::Value> {
    let request = QuizRequest {
        difficulty: request
            .difficulty
            .unwrap_or_else(|| DEFAULT_DIFFICULTY.to_string()),
        ..QuizRequest::new(request.topic)
    };

    let quiz = generate_quiz(&state.corpus, &request, &mut rand::thread_rng());
    Json(serde_json::json!({ "quiz": quiz }))
}

async fn quiz_analyze(Json(request): Json<AnalysisRequest>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "feedback": analyze_performance(&request.results) }))
}

fn error(status: StatusCode, detail: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            detail: detail.into(),
        }),
    )
}
