//! Practice endpoints: new problems and answer evaluation

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Query, State,
    },
    http::HeaderMap,
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::http::middleware::{optional_user, AuthenticatedUser};
use crate::http::AppError;
use crate::practice::{Difficulty, Evaluation, EvaluationRequest, Problem, Source};
use crate::store::history::{HistoryEntry, NewHistoryEntry};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemRequest {
    pub difficulty_level: Difficulty,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemResponse {
    #[serde(flatten)]
    pub problem: Problem,
    pub difficulty: Difficulty,
    pub source: Source,
}

/// POST /api/problem
pub async fn problem_handler(
    State(state): State<AppState>,
    payload: Result<Json<ProblemRequest>, JsonRejection>,
) -> Result<Json<ProblemResponse>, AppError> {
    let Json(req) = payload?;

    if !state.ai_limiter.check() {
        return Err(AppError::RateLimited);
    }

    let (problem, source) = state.evaluator.next_problem(req.difficulty_level).await;

    Ok(Json(ProblemResponse {
        problem,
        difficulty: req.difficulty_level,
        source,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResponse {
    #[serde(flatten)]
    pub evaluation: Evaluation,
    pub source: Source,
}

/// POST /api/evaluate-with-claude and its aliases
pub async fn evaluate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<EvaluationRequest>, JsonRejection>,
) -> Result<Json<EvaluationResponse>, AppError> {
    let Json(req) = payload?;

    if req.user_answer.trim().is_empty() {
        return Err(AppError::BadRequest("userAnswer must not be empty".to_string()));
    }
    if req.japanese_sentence.trim().is_empty() {
        return Err(AppError::BadRequest(
            "japaneseSentence must not be empty".to_string(),
        ));
    }

    if !state.ai_limiter.check() {
        return Err(AppError::RateLimited);
    }

    let (evaluation, source) = state.evaluator.evaluate(&req).await;

    if let Some(user) = optional_user(&headers, &state.config.supabase_jwt_secret) {
        let entry = NewHistoryEntry {
            id: Uuid::new_v4(),
            user_id: user.user_id,
            difficulty: req.difficulty.map(|d| d.to_string()),
            japanese_sentence: req.japanese_sentence.trim().to_string(),
            user_answer: req.user_answer.trim().to_string(),
            correct_translation: evaluation.correct_translation.clone(),
            rating: evaluation.rating,
        };

        match state.history.record(&entry).await {
            Ok(_) => info!(user_id = %user.user_id, rating = evaluation.rating, "Recorded practice attempt"),
            Err(e) => warn!(user_id = %user.user_id, error = %e, "Failed to record practice attempt"),
        }
    }

    Ok(Json(EvaluationResponse { evaluation, source }))
}

pub const DEFAULT_HISTORY_LIMIT: i64 = 20;
pub const MAX_HISTORY_LIMIT: i64 = 100;

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub entries: Vec<HistoryEntry>,
}

/// GET /api/history
pub async fn history_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, AppError> {
    let Query(query) = query?;
    // Clamped into 1..=100, so the cast cannot truncate
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT) as usize;

    let entries = state.history.recent(auth.user_id, limit).await?;
    Ok(Json(HistoryResponse { entries }))
}
