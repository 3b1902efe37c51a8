use crate::config::LlmConfig;
use crate::error::VoiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maximum serialized prompt size (256 KiB). Transcripts grow without
/// trimming, so oversized sessions fail here rather than at the engine.
pub const MAX_LLM_INPUT_BYTES: usize = 256 * 1024;

/// Timeout for one generation round trip.
const LLM_TIMEOUT: Duration = Duration::from_secs(60);

/// Boundary contract for the language model: serialized transcript in,
/// reply text out.
///
/// The model is stateless between calls; the prompt must carry the entire
/// conversation. Failures are reported as [`VoiceError::Generation`].
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, VoiceError>;
}

/// HTTP generation client for a Gemini-style `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct HttpLlm {
    client: reqwest::Client,
    config: LlmConfig,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: String,
}

impl HttpLlm {
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Generator for HttpLlm {
    async fn generate(&self, prompt: &str) -> Result<String, VoiceError> {
        if prompt.len() > MAX_LLM_INPUT_BYTES {
            return Err(VoiceError::Generation(format!(
                "prompt exceeds maximum size: {} bytes (limit: {} bytes)",
                prompt.len(),
                MAX_LLM_INPUT_BYTES
            )));
        }

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model,
            self.config.api_key
        );

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let request = self.client.post(&url).json(&body).send();

        let response = tokio::time::timeout(LLM_TIMEOUT, request)
            .await
            .map_err(|_| {
                VoiceError::Generation(format!(
                    "generation timed out after {} seconds",
                    LLM_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| VoiceError::Generation(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VoiceError::Generation(format!(
                "engine returned {}: {}",
                status, body
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| VoiceError::Generation(format!("malformed response: {}", e)))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| {
                VoiceError::Generation("response contained no candidates".to_string())
            })?;

        Ok(text)
    }
}
