//! Standalone synthesis and transcription routes.
//!
//! Thin utility endpoints around the individual adapters, with no session
//! history involved. Unlike the conversation pipeline these have no session
//! to keep alive, so engine failures surface honestly as 502.

use crate::api::{read_turn_input, ApiError};
use crate::AppState;
use axum::{
    extract::{Extension, Multipart},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Request body for `POST /tts`.
#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    pub text: String,
}

/// Handler for `POST /tts` — text in, stored audio clip URL out.
pub async fn generate_audio_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<TtsRequest>,
) -> Result<Json<Value>, ApiError> {
    let text = body.text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("no text provided".to_string()));
    }

    let audio_url = state.pipeline.synthesize_clip(text).await?;
    Ok(Json(json!({ "audio_url": audio_url })))
}

/// Handler for `POST /transcribe` — multipart audio in, transcript out.
pub async fn transcribe_handler(
    Extension(state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let input = read_turn_input(&mut multipart).await?;
    let audio = input
        .audio
        .ok_or_else(|| ApiError::BadRequest("no audio provided".to_string()))?;

    let text = state.pipeline.transcribe_clip(&audio).await?;
    Ok(Json(json!({ "text": text })))
}

/// Handler for `POST /tts/echo` — transcribe a clip, then speak the same
/// words back.
pub async fn tts_echo_handler(
    Extension(state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let input = read_turn_input(&mut multipart).await?;
    let audio = input
        .audio
        .ok_or_else(|| ApiError::BadRequest("no audio provided".to_string()))?;

    let text = state.pipeline.transcribe_clip(&audio).await?;
    let audio_url = state.pipeline.synthesize_clip(&text).await?;

    Ok(Json(json!({
        "transcription": text,
        "audio_url": audio_url,
    })))
}
