//! Route handler functions for all API endpoints.
//!
//! Each handler extracts path parameters and JSON bodies via axum
//! extractors, calls into AppState services, and returns JSON responses.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::info;
use uuid::Uuid;

use helpdesk_chat::{
    ActionRequest, ChatReply, ConversationDetail, ConversationSummary, ConversationTurn,
    EscalationForm, EscalationReceipt, MessageRequest,
};
use helpdesk_core::types::{
    EscalatedIssue, IssueDraft, IssueStatus, KnowledgeDraft, KnowledgeEntry, UserAccount,
};
use helpdesk_storage::Mutation;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Notice attached to reads served from the built-in fallback data.
pub const OFFLINE_NOTICE: &str =
    "Server Offline: showing the built-in knowledge base. Changes cannot be saved right now.";

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub store_online: bool,
    pub active_sessions: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserAccount,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KnowledgeListResponse {
    pub entries: Vec<KnowledgeEntry>,
    pub offline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<ConversationSummary>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub session_id: Uuid,
    pub turns: Vec<ConversationTurn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IssuesResponse {
    pub issues: Vec<EscalatedIssue>,
    pub pending: usize,
    pub resolved: usize,
    pub offline: bool,
}

// =============================================================================
// Public endpoints
// =============================================================================

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        store_online: state.knowledge.is_online(),
        active_sessions: state.chat.session_count(),
    })
}

/// POST /auth/login - exchange credentials for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (token, user) = state.auth.login(&req.email, &req.password).await?;
    Ok(Json(LoginResponse { token, user }))
}

// =============================================================================
// Authenticated endpoints
// =============================================================================

/// POST /auth/logout - drop the caller's token.
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<StatusCode, ApiError> {
    state.auth.logout(&user.token)?;
    info!(user_id = user.account.id, "Logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/me - the caller's account.
pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<UserAccount> {
    Json(user.account)
}

/// GET /qa - the knowledge base, flagged when served from fallback data.
pub async fn list_qa(State(state): State<AppState>) -> Json<KnowledgeListResponse> {
    let fetched = state.knowledge.fetch_all().await;
    let offline = fetched.is_fallback();
    Json(KnowledgeListResponse {
        entries: fetched.records,
        offline,
        notice: offline.then(|| OFFLINE_NOTICE.to_string()),
    })
}

/// GET /admin/events - SSE stream of issue and knowledge-base changes.
///
/// Issue payloads carry submitter contact details, so only admins subscribe.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>> + Send> {
    let rx = state.event_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(value) => {
            let kind = value
                .get("type")
                .and_then(|t| t.as_str())
                .unwrap_or("message")
                .to_string();
            let data = serde_json::to_string(&value).unwrap_or_default();
            Some(Ok(Event::default().event(kind).data(data)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

// =============================================================================
// Chat
// =============================================================================

/// POST /chat/sessions - open a conversation with its welcome turn.
pub async fn create_session(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<(StatusCode, Json<ChatReply>), ApiError> {
    let reply = state.chat.start_session(user.participant()).await?;
    Ok((StatusCode::CREATED, Json(reply)))
}

/// GET /chat/sessions - the caller's live conversations, oldest first.
///
/// Admins see every account's conversations.
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Json<SessionsResponse> {
    Json(SessionsResponse {
        sessions: state.chat.list_sessions(user.participant()),
    })
}

/// GET /chat/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConversationDetail>, ApiError> {
    Ok(Json(state.chat.get_session(user.participant(), id)?))
}

/// DELETE /chat/sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.chat.delete_session(user.participant(), id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /chat/sessions/{id}/messages - answer one typed message.
pub async fn post_message(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    let reply = state
        .chat
        .handle_message(user.participant(), id, &req.text)
        .await?;
    Ok(Json(reply))
}

/// POST /chat/sessions/{id}/actions - answer an action button.
pub async fn post_action(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<ActionRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    let reply = state
        .chat
        .handle_action(user.participant(), id, req.action)
        .await?;
    Ok(Json(reply))
}

/// POST /chat/sessions/{id}/escalations - forward the conversation to support.
pub async fn post_escalation(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(form): Json<EscalationForm>,
) -> Result<(StatusCode, Json<EscalationReceipt>), ApiError> {
    let receipt = state.chat.escalate(user.participant(), id, &form).await?;
    if let Some(issue) = &receipt.issue {
        state.emit(
            "issue_submitted",
            serde_json::to_value(issue).unwrap_or_default(),
        );
    }
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// GET /chat/sessions/{id}/history
pub async fn history(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let turns = state.chat.get_history(user.participant(), id)?;
    Ok(Json(HistoryResponse {
        session_id: id,
        turns,
    }))
}

// =============================================================================
// Admin: knowledge base
// =============================================================================

/// GET /admin/qa
pub async fn admin_list_qa(State(state): State<AppState>) -> Json<KnowledgeListResponse> {
    list_qa(State(state)).await
}

/// GET /admin/qa/{id}
pub async fn admin_get_qa(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<KnowledgeEntry>, ApiError> {
    state
        .knowledge
        .fetch_one(&id)
        .await
        .records
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Knowledge entry {} not found", id)))
}

/// POST /admin/qa - add an entry.
pub async fn admin_create_qa(
    State(state): State<AppState>,
    Json(draft): Json<KnowledgeDraft>,
) -> Result<(StatusCode, Json<KnowledgeEntry>), ApiError> {
    let draft = draft.normalized()?;
    let entry = state
        .knowledge
        .mutate(Mutation::Create(draft))
        .await?
        .ok_or_else(|| ApiError::Internal("store returned no record on create".to_string()))?;
    info!(entry_id = entry.id, "Knowledge entry created");
    state.emit("knowledge_changed", serde_json::json!({ "id": entry.id }));
    Ok((StatusCode::CREATED, Json(entry)))
}

/// PUT /admin/qa/{id} - replace an entry.
pub async fn admin_update_qa(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(draft): Json<KnowledgeDraft>,
) -> Result<Json<KnowledgeEntry>, ApiError> {
    let draft = draft.normalized()?;
    let entry = state
        .knowledge
        .mutate(Mutation::Update(id, draft))
        .await?
        .ok_or_else(|| ApiError::Internal("store returned no record on update".to_string()))?;
    info!(entry_id = id, "Knowledge entry updated");
    state.emit("knowledge_changed", serde_json::json!({ "id": id }));
    Ok(Json(entry))
}

/// DELETE /admin/qa/{id}
pub async fn admin_delete_qa(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.knowledge.mutate(Mutation::Delete(id)).await?;
    info!(entry_id = id, "Knowledge entry deleted");
    state.emit("knowledge_changed", serde_json::json!({ "id": id }));
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Admin: issues
// =============================================================================

/// GET /admin/issues - newest first, with status counts.
pub async fn admin_list_issues(State(state): State<AppState>) -> Json<IssuesResponse> {
    let fetched = state.issues.fetch_all().await;
    let offline = fetched.is_fallback();
    let mut issues = fetched.records;
    issues.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let pending = issues
        .iter()
        .filter(|i| i.status == IssueStatus::Pending)
        .count();
    let resolved = issues.len() - pending;

    Json(IssuesResponse {
        issues,
        pending,
        resolved,
        offline,
    })
}

/// PUT /admin/issues/{id}/resolve - mark an issue resolved.
///
/// Resolving an already-resolved issue is a no-op.
pub async fn resolve_issue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EscalatedIssue>, ApiError> {
    let fetched = state.issues.fetch_one(&id).await;
    if fetched.is_fallback() {
        return Err(ApiError::ServiceUnavailable(
            "Server Offline: issues cannot be updated right now".to_string(),
        ));
    }
    let issue = fetched
        .records
        .ok_or_else(|| ApiError::NotFound(format!("Issue {} not found", id)))?;

    if issue.status == IssueStatus::Resolved {
        return Ok(Json(issue));
    }

    let draft = IssueDraft {
        status: IssueStatus::Resolved,
        ..IssueDraft::from(issue)
    };
    let updated = state
        .issues
        .mutate(Mutation::Update(id.clone(), draft))
        .await?
        .ok_or_else(|| ApiError::Internal("store returned no record on update".to_string()))?;
    info!(issue_id = %id, "Issue resolved");
    state.emit(
        "issue_resolved",
        serde_json::to_value(&updated).unwrap_or_default(),
    );
    Ok(Json(updated))
}
