use crate::config::SttConfig;
use crate::error::VoiceError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Maximum audio input size for STT (10 MiB). Prevents OOM from oversized payloads.
pub const MAX_STT_INPUT_BYTES: usize = 10 * 1024 * 1024;

/// Timeout for one transcription round trip.
const STT_TIMEOUT: Duration = Duration::from_secs(120);

/// Boundary contract for the speech-to-text engine: audio bytes in, text out.
///
/// Implementations must not persist conversation state; failures are reported
/// as [`VoiceError::Transcription`] and handled by the pipeline.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, VoiceError>;
}

/// HTTP transcription client.
///
/// Posts raw audio bytes to `{base_url}/transcribe` and expects a JSON body
/// carrying either the transcript text or an engine-reported error.
#[derive(Debug, Clone)]
pub struct HttpStt {
    client: reqwest::Client,
    config: SttConfig,
}

#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpStt {
    pub fn new(client: reqwest::Client, config: SttConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Transcriber for HttpStt {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, VoiceError> {
        if audio.len() > MAX_STT_INPUT_BYTES {
            return Err(VoiceError::Transcription(format!(
                "audio data exceeds maximum size: {} bytes (limit: {} bytes)",
                audio.len(),
                MAX_STT_INPUT_BYTES
            )));
        }

        let url = format!("{}/transcribe", self.config.base_url.trim_end_matches('/'));
        let request = self
            .client
            .post(&url)
            .header("authorization", &self.config.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(audio.to_vec())
            .send();

        let response = tokio::time::timeout(STT_TIMEOUT, request)
            .await
            .map_err(|_| {
                VoiceError::Transcription(format!(
                    "transcription timed out after {} seconds",
                    STT_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| VoiceError::Transcription(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VoiceError::Transcription(format!(
                "engine returned {}: {}",
                status, body
            )));
        }

        let parsed: TranscribeResponse = response
            .json()
            .await
            .map_err(|e| VoiceError::Transcription(format!("malformed response: {}", e)))?;

        if let Some(error) = parsed.error {
            return Err(VoiceError::Transcription(error));
        }

        let text = parsed.text.ok_or_else(|| {
            VoiceError::Transcription("response missing transcript text".to_string())
        })?;

        Ok(text.trim().to_string())
    }
}
