//! Session lifecycle and suggestion actions.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::detector::{AckOutcome, Finding, Suggestion};

#[derive(Debug, Serialize)]
pub struct SessionOpened {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SessionEnded {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SessionCleared {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsBody {
    /// The timed visual-attention flag (the UI's glow).
    pub attention: bool,
    pub suggestions: Vec<Suggestion>,
}

/// Acknowledgment result. Terminal/unknown ids are ordinary outcomes,
/// not HTTP errors.
#[derive(Debug, Serialize)]
pub struct AckBody {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finding: Option<Finding>,
}

pub async fn open(State(ctx): State<ApiContext>) -> Json<SessionOpened> {
    let session_id = ctx.open_session().await;
    tracing::info!(session = %session_id, "Session opened");
    Json(SessionOpened { session_id })
}

pub async fn close(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionEnded>, ApiError> {
    ctx.end_session(&id).await?;
    tracing::info!(session = %id, "Session ended");
    Ok(Json(SessionEnded { session_id: id }))
}

pub async fn suggestions(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuggestionsBody>, ApiError> {
    let sessions = ctx.sessions.read().await;
    let handle = sessions.get(&id).ok_or(ApiError::SessionNotFound(id))?;
    Ok(Json(SuggestionsBody {
        attention: handle.attention(),
        suggestions: handle.pending()?,
    }))
}

pub async fn accept(
    State(ctx): State<ApiContext>,
    Path((id, suggestion_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<AckBody>, ApiError> {
    let sessions = ctx.sessions.read().await;
    let handle = sessions.get(&id).ok_or(ApiError::SessionNotFound(id))?;
    let body = match handle.accept(&suggestion_id)? {
        AckOutcome::Accepted(finding) => AckBody {
            outcome: "accepted",
            finding: Some(finding),
        },
        AckOutcome::AlreadyTerminal => AckBody {
            outcome: "already_terminal",
            finding: None,
        },
        AckOutcome::NotFound => AckBody {
            outcome: "not_found",
            finding: None,
        },
        AckOutcome::Dismissed => AckBody {
            outcome: "dismissed",
            finding: None,
        },
    };
    Ok(Json(body))
}

pub async fn dismiss(
    State(ctx): State<ApiContext>,
    Path((id, suggestion_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<AckBody>, ApiError> {
    let sessions = ctx.sessions.read().await;
    let handle = sessions.get(&id).ok_or(ApiError::SessionNotFound(id))?;
    let body = match handle.dismiss(&suggestion_id)? {
        AckOutcome::Dismissed => AckBody {
            outcome: "dismissed",
            finding: None,
        },
        AckOutcome::AlreadyTerminal => AckBody {
            outcome: "already_terminal",
            finding: None,
        },
        AckOutcome::NotFound => AckBody {
            outcome: "not_found",
            finding: None,
        },
        AckOutcome::Accepted(_) => AckBody {
            outcome: "accepted",
            finding: None,
        },
    };
    Ok(Json(body))
}

pub async fn clear(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionCleared>, ApiError> {
    let sessions = ctx.sessions.read().await;
    let handle = sessions.get(&id).ok_or(ApiError::SessionNotFound(id))?;
    handle.clear().await?;
    Ok(Json(SessionCleared { session_id: id }))
}
