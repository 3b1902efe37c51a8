//! Conversation turn API handler.

use crate::api::{read_turn_input, ApiError};
use crate::AppState;
use axum::{
    extract::{Extension, Multipart, Path},
    Json,
};
use parlance_voice::TurnResult;
use std::sync::Arc;

/// Handler for `POST /agent/chat/{sessionId}`.
///
/// Runs one conversation turn against the session's transcript. The request
/// carries exactly one of the multipart fields `audio` (a recorded clip) or
/// `text`. Recovered adapter failures still answer 200 with degraded content
/// — the voice session stays alive; only invalid input (400) and media
/// faults (500) are real errors.
pub async fn agent_chat_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(session_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<TurnResult>, ApiError> {
    let input = read_turn_input(&mut multipart).await?;
    let result = state.pipeline.run_turn(&session_id, input).await?;
    Ok(Json(result))
}
