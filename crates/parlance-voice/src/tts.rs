use crate::config::TtsConfig;
use crate::error::VoiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maximum text input size for TTS (64 KiB). Prevents resource exhaustion
/// from oversized synthesis requests.
pub const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// Timeout for one synthesis round trip (request plus audio download).
const TTS_TIMEOUT: Duration = Duration::from_secs(60);

/// Boundary contract for the speech-synthesis engine: text in, audio bytes
/// out.
///
/// Failures are reported as [`VoiceError::Synthesis`]; the pipeline
/// substitutes its pre-generated fallback audio when this happens.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, VoiceError>;
}

/// HTTP synthesis client.
///
/// Posts text to `{base_url}/speech/generate`; the engine replies with a URL
/// for the rendered audio, which is then downloaded and returned as bytes.
#[derive(Debug, Clone)]
pub struct HttpTts {
    client: reqwest::Client,
    config: TtsConfig,
}

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    voice_id: &'a str,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct SynthesizeResponse {
    audio_file: String,
}

impl HttpTts {
    pub fn new(client: reqwest::Client, config: TtsConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Synthesizer for HttpTts {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, VoiceError> {
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(VoiceError::Synthesis(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                text.len(),
                MAX_TTS_INPUT_BYTES
            )));
        }

        let url = format!(
            "{}/speech/generate",
            self.config.base_url.trim_end_matches('/')
        );
        let body = SynthesizeRequest {
            text,
            voice_id: &self.config.voice_id,
            format: &self.config.format,
        };

        let request = self
            .client
            .post(&url)
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send();

        let response = tokio::time::timeout(TTS_TIMEOUT, request)
            .await
            .map_err(|_| {
                VoiceError::Synthesis(format!(
                    "synthesis timed out after {} seconds",
                    TTS_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| VoiceError::Synthesis(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VoiceError::Synthesis(format!(
                "engine returned {}: {}",
                status, body
            )));
        }

        let parsed: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| VoiceError::Synthesis(format!("malformed response: {}", e)))?;

        // The engine hosts the rendered clip; fetch the bytes so the caller
        // owns the audio outright.
        let download = self.client.get(&parsed.audio_file).send();
        let audio = tokio::time::timeout(TTS_TIMEOUT, download)
            .await
            .map_err(|_| {
                VoiceError::Synthesis(format!(
                    "audio download timed out after {} seconds",
                    TTS_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| VoiceError::Synthesis(format!("audio download failed: {}", e)))?;

        if !audio.status().is_success() {
            return Err(VoiceError::Synthesis(format!(
                "audio download returned {}",
                audio.status()
            )));
        }

        let bytes = audio
            .bytes()
            .await
            .map_err(|e| VoiceError::Synthesis(format!("failed to read audio body: {}", e)))?;

        Ok(bytes.to_vec())
    }
}
