//! Shared API plumbing: error-to-status mapping and multipart ingest.

use axum::{
    extract::Multipart,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parlance_voice::{TurnInput, VoiceError};
use thiserror::Error;

/// API error type mapping to HTTP status codes.
///
/// Recovered pipeline failures never reach this type — the pipeline folds
/// them into fallback content and the handler still answers 200. Only
/// invalid input, media faults, and failures on the standalone utility
/// routes surface here.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("upstream engine failed: {0}")]
    UpstreamFailed(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::UpstreamFailed(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<VoiceError> for ApiError {
    fn from(e: VoiceError) -> Self {
        match e {
            VoiceError::InvalidInput(msg) => ApiError::BadRequest(msg),
            VoiceError::Transcription(msg)
            | VoiceError::Generation(msg)
            | VoiceError::Synthesis(msg) => ApiError::UpstreamFailed(msg),
            VoiceError::Config(msg) => ApiError::InternalServerError(msg),
            VoiceError::Media(e) => ApiError::InternalServerError(e.to_string()),
        }
    }
}

/// Reads the alternative `audio` / `text` multipart fields into a
/// [`TurnInput`]. Unknown fields are ignored; `file` is accepted as an alias
/// for `audio` to match common recorder clients.
pub async fn read_turn_input(multipart: &mut Multipart) -> Result<TurnInput, ApiError> {
    let mut input = TurnInput::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "audio" | "file" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read audio: {}", e)))?;
                input.audio = Some(data.to_vec());
            }
            "text" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read text: {}", e)))?;
                input.text = Some(text);
            }
            _ => {}
        }
    }

    Ok(input)
}
