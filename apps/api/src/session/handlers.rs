use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::Termination;
use crate::errors::AppError;
use crate::llm_client::ToolDeclaration;
use crate::pipeline::career::ScoreBand;
use crate::pipeline::{CareerAnalysis, InterviewFeedback, MatchBadge};
use crate::session::workflow::shortcuts;
use crate::session::{DocumentReport, InterviewPair, Session, Shortcut};
use crate::state::AppState;

#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub id: Uuid,
}

#[derive(Deserialize)]
pub struct QuestionRequest {
    pub job_title: String,
}

#[derive(Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Serialize)]
pub struct AnalysisResponse {
    pub analysis: CareerAnalysis,
    pub badges: Vec<MatchBadge>,
}

#[derive(Serialize)]
pub struct FeedbackResponse {
    #[serde(flatten)]
    pub feedback: InterviewFeedback,
    pub band: ScoreBand,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub tool_rounds: usize,
    pub tools_used: Vec<String>,
    pub termination: Termination,
}

/// GET /api/v1/tools
pub async fn handle_list_tools(State(state): State<AppState>) -> Json<Vec<ToolDeclaration>> {
    Json(state.coach.tools().catalog())
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<CreateSessionResponse>) {
    let id = state.sessions.create().await;
    (StatusCode::CREATED, Json(CreateSessionResponse { id }))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Session>, AppError> {
    let handle = state.sessions.get(id).await?;
    let snapshot = handle.lock().await.clone();
    Ok(Json(snapshot))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/:id/document
/// Multipart upload; the CV is read from the `file` field.
pub async fn handle_upload_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<DocumentReport>, AppError> {
    let handle = state.sessions.get(id).await?;

    let mut upload: Option<(String, Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("the 'file' field needs a filename".to_string()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("could not read upload: {e}")))?;
        upload = Some((filename, data));
        break;
    }
    let (filename, data) =
        upload.ok_or_else(|| AppError::Validation("missing 'file' field".to_string()))?;

    let mut session = handle.lock().await;
    let report = state
        .coach
        .analyze_document(&mut session, &filename, data.to_vec())
        .await?;
    Ok(Json(report))
}

/// POST /api/v1/sessions/:id/analysis
pub async fn handle_rerun_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    let analysis = state.coach.rerun_analysis(&mut session).await?;
    Ok(Json(AnalysisResponse {
        badges: analysis.badges(),
        analysis,
    }))
}

/// POST /api/v1/sessions/:id/interview/question
pub async fn handle_interview_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<QuestionRequest>,
) -> Result<Json<InterviewPair>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    let pair = state.coach.new_question(&mut session, &req.job_title).await?;
    Ok(Json(pair))
}

/// POST /api/v1/sessions/:id/interview/answer
pub async fn handle_interview_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<FeedbackResponse>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    let feedback = state.coach.submit_answer(&mut session, &req.answer).await?;
    Ok(Json(FeedbackResponse {
        band: feedback.score_band(),
        feedback,
    }))
}

/// POST /api/v1/sessions/:id/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    let outcome = state.coach.chat(&mut session, &req.message).await?;
    Ok(Json(ChatResponse {
        tools_used: outcome.invocations.iter().map(|i| i.name.clone()).collect(),
        reply: outcome.reply,
        tool_rounds: outcome.tool_rounds,
        termination: outcome.termination,
    }))
}

/// GET /api/v1/sessions/:id/shortcuts
pub async fn handle_shortcuts(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Shortcut>>, AppError> {
    let handle = state.sessions.get(id).await?;
    let session = handle.lock().await;
    Ok(Json(shortcuts(&session)?))
}
