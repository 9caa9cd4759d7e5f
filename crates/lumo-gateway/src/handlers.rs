// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lumo_core::{
    CompetencyDefinition, DeleteSummary, FeedbackReport, Message, PerformanceLevel, Session,
    SessionSummary,
};
use lumo_evaluation::{CompetencyAnalysis, CompetencyView, SessionEvaluation, UserProgress};
use lumo_interview::{ChatTurn, FinishOutcome, NewSession, TickOutcome, TimerStatus};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::error::{ApiError, ErrorResponse};
use crate::server::GatewayState;

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

// --- Sessions ---

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub session_ids: Vec<String>,
}

/// POST /v1/sessions
pub async fn create_session(
    State(state): State<GatewayState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<NewSession>,
) -> Result<(StatusCode, Json<Session>), ApiError> {
    let session = state.sessions.create_session(&user, body).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /v1/sessions
pub async fn list_sessions(
    State(state): State<GatewayState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<SessionListResponse> {
    let sessions = state.sessions.list_sessions(&user).await?;
    Ok(Json(SessionListResponse { sessions }))
}

/// DELETE /v1/sessions
pub async fn delete_all_sessions(
    State(state): State<GatewayState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<DeleteSummary> {
    Ok(Json(state.sessions.delete_all_sessions(&user).await?))
}

/// POST /v1/sessions/bulk-delete
pub async fn bulk_delete_sessions(
    State(state): State<GatewayState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<BulkDeleteRequest>,
) -> ApiResult<DeleteSummary> {
    Ok(Json(
        state
            .sessions
            .delete_sessions(&user, &body.session_ids)
            .await?,
    ))
}

/// DELETE /v1/sessions/{id}
pub async fn delete_session(
    State(state): State<GatewayState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<String>,
) -> ApiResult<DeleteSummary> {
    Ok(Json(state.sessions.delete_session(&user, &session_id).await?))
}

// --- Messages ---

#[derive(Debug, Serialize)]
pub struct SessionMessagesResponse {
    pub session: Session,
    pub messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub content: String,
}

/// GET /v1/sessions/{id}/messages
pub async fn get_session_messages(
    State(state): State<GatewayState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<String>,
) -> ApiResult<SessionMessagesResponse> {
    let (session, messages) = state.sessions.messages(&user, &session_id).await?;
    Ok(Json(SessionMessagesResponse { session, messages }))
}

/// POST /v1/sessions/{id}/messages
pub async fn post_chat_message(
    State(state): State<GatewayState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<String>,
    Json(body): Json<ChatRequest>,
) -> ApiResult<ChatTurn> {
    Ok(Json(
        state
            .sessions
            .chat(&user, &session_id, &body.content)
            .await?,
    ))
}

/// GET /v1/messages/{id}
pub async fn get_message(
    State(state): State<GatewayState>,
    CurrentUser(user): CurrentUser,
    Path(message_id): Path<String>,
) -> ApiResult<Message> {
    Ok(Json(state.sessions.message(&user, &message_id).await?))
}

// --- Timer ---

#[derive(Debug, Deserialize)]
pub struct TickRequest {
    pub seconds: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct FinishParams {
    #[serde(default)]
    pub interrupted: bool,
}

/// GET /v1/sessions/{id}/timer
pub async fn get_timer(
    State(state): State<GatewayState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<String>,
) -> ApiResult<TimerStatus> {
    Ok(Json(state.sessions.timer_status(&user, &session_id).await?))
}

/// POST /v1/sessions/{id}/timer/start
pub async fn start_timer(
    State(state): State<GatewayState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<String>,
) -> ApiResult<TimerStatus> {
    Ok(Json(state.sessions.start_timer(&user, &session_id).await?))
}

/// POST /v1/sessions/{id}/timer/pause
pub async fn pause_timer(
    State(state): State<GatewayState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<String>,
) -> ApiResult<TimerStatus> {
    Ok(Json(state.sessions.pause_timer(&user, &session_id).await?))
}

/// POST /v1/sessions/{id}/timer/resume
pub async fn resume_timer(
    State(state): State<GatewayState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<String>,
) -> ApiResult<TimerStatus> {
    Ok(Json(state.sessions.resume_timer(&user, &session_id).await?))
}

/// POST /v1/sessions/{id}/timer/tick
pub async fn tick_timer(
    State(state): State<GatewayState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<String>,
    Json(body): Json<TickRequest>,
) -> ApiResult<TickOutcome> {
    Ok(Json(
        state
            .sessions
            .tick_timer(&user, &session_id, body.seconds)
            .await?,
    ))
}

/// POST /v1/sessions/{id}/timer/finish?interrupted=true
pub async fn finish_timer(
    State(state): State<GatewayState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<String>,
    Query(params): Query<FinishParams>,
) -> ApiResult<FinishOutcome> {
    Ok(Json(
        state
            .sessions
            .finish_timer(&user, &session_id, params.interrupted)
            .await?,
    ))
}

// --- Evaluation ---

#[derive(Debug, Serialize)]
pub struct EvaluationResponse {
    pub session_id: String,
    pub average_score: f64,
    pub performance_level: PerformanceLevel,
    pub questions_analyzed: i64,
    pub session_duration_minutes: i64,
    pub time_management_score: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub exists: bool,
    pub report: FeedbackReport,
    pub competency_scores: Vec<CompetencyView>,
}

/// POST /v1/sessions/{id}/evaluate
pub async fn evaluate_session(
    State(state): State<GatewayState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<String>,
) -> ApiResult<EvaluationResponse> {
    let outcome = state
        .evaluation
        .evaluate_for_user(&user, &session_id)
        .await?;
    let report = outcome.report;
    Ok(Json(EvaluationResponse {
        session_id: report.session_id,
        average_score: report.average_score,
        performance_level: report.performance_level,
        questions_analyzed: report.questions_analyzed,
        session_duration_minutes: report.session_duration_minutes,
        time_management_score: report.time_management_score,
    }))
}

/// GET /v1/sessions/{id}/feedback
///
/// 404 with the eligibility diagnostics when the session has no report yet.
pub async fn get_feedback(
    State(state): State<GatewayState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<String>,
) -> Result<Response, ApiError> {
    match state
        .evaluation
        .session_evaluation(&user, &session_id)
        .await?
    {
        SessionEvaluation::Ready {
            report,
            competencies,
        } => Ok(Json(FeedbackResponse {
            exists: true,
            report,
            competency_scores: competencies,
        })
        .into_response()),
        SessionEvaluation::Missing(eligibility) => Ok((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "no evaluation for this session".to_string(),
                eligibility: Some(eligibility),
            }),
        )
            .into_response()),
    }
}

/// GET /v1/user/analytics
pub async fn get_user_analytics(
    State(state): State<GatewayState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<UserProgress> {
    Ok(Json(state.evaluation.user_progress(&user).await?))
}

/// GET /v1/user/competencies
pub async fn get_competency_analysis(
    State(state): State<GatewayState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, ApiError> {
    let analysis: CompetencyAnalysis = state.evaluation.competency_analysis(&user).await?;
    if analysis.total_evaluations == 0 {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("no evaluations available")),
        )
            .into_response());
    }
    Ok(Json(analysis).into_response())
}

#[derive(Debug, Serialize)]
pub struct CompetencyListResponse {
    pub competencies: Vec<CompetencyDefinition>,
}

/// GET /v1/competencies
pub async fn list_competencies(
    State(state): State<GatewayState>,
) -> ApiResult<CompetencyListResponse> {
    let competencies = state.evaluation.competency_definitions().await?;
    Ok(Json(CompetencyListResponse { competencies }))
}
