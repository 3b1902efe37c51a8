//! The conversation turn pipeline.
//!
//! Sequences the three adapters against the history store:
//! resolve user text (transcribing audio if needed), append the user turn,
//! generate a reply from the full transcript, append the assistant turn,
//! synthesize the reply to audio. Every external call can fail independently;
//! the user-facing contract is "always get some spoken response", so
//! generation and synthesis failures substitute fixed fallbacks instead of
//! aborting. A transcription failure is the one terminal case — with no user
//! text there is nothing to reason about downstream.

use crate::error::VoiceError;
use crate::history::{render_prompt, HistoryStore, Turn};
use crate::llm::Generator;
use crate::stt::Transcriber;
use crate::tts::Synthesizer;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Reply substituted when generation fails, and the whole spoken response
/// when transcription fails.
pub const FALLBACK_MESSAGE: &str = "I'm having trouble connecting right now.";

/// Displayed transcription when speech-to-text fails for a turn.
pub const TRANSCRIPTION_FAILED: &str = "(transcription failed)";

/// File name of the pre-generated fallback audio inside the media directory.
pub const FALLBACK_AUDIO_FILE: &str = "fallback.mp3";

/// One inbound turn: exactly one of `audio` or `text`.
#[derive(Debug, Clone, Default)]
pub struct TurnInput {
    pub audio: Option<Vec<u8>>,
    pub text: Option<String>,
}

impl TurnInput {
    pub fn audio(bytes: Vec<u8>) -> Self {
        Self {
            audio: Some(bytes),
            text: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            audio: None,
            text: Some(text.into()),
        }
    }
}

/// Outcome of one turn. Ephemeral; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResult {
    pub transcription: String,
    pub reply_text: String,
    pub audio_url: String,
}

enum ResolvedText {
    Text(String),
    /// Transcription failed; the turn ends with a fallback-only result.
    TranscriptionFailed,
}

/// Orchestrates one conversation turn per call. Cheap to clone.
#[derive(Clone)]
pub struct TurnPipeline {
    transcriber: Arc<dyn Transcriber>,
    generator: Arc<dyn Generator>,
    synthesizer: Arc<dyn Synthesizer>,
    history: HistoryStore,
    media_dir: PathBuf,
}

impl TurnPipeline {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        generator: Arc<dyn Generator>,
        synthesizer: Arc<dyn Synthesizer>,
        history: HistoryStore,
        media_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            transcriber,
            generator,
            synthesizer,
            history,
            media_dir: media_dir.into(),
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    fn fallback_audio_url() -> String {
        format!("/media/{}", FALLBACK_AUDIO_FILE)
    }

    /// Pre-generates the fallback audio clip if it is not already on disk,
    /// so the degraded synthesis path never needs a live engine call.
    ///
    /// A synthesis failure here is logged and tolerated — the server still
    /// starts, it just cannot speak its fallback until the engine recovers.
    pub async fn ensure_fallback_audio(&self) -> Result<(), VoiceError> {
        let path = self.media_dir.join(FALLBACK_AUDIO_FILE);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        match self.synthesizer.synthesize(FALLBACK_MESSAGE).await {
            Ok(bytes) => {
                tokio::fs::write(&path, bytes).await?;
                info!(path = %path.display(), "pre-generated fallback audio");
            }
            Err(e) => {
                warn!("failed to pre-generate fallback audio: {}", e);
            }
        }
        Ok(())
    }

    /// Runs one conversation turn for `session_id`.
    ///
    /// Returns `Err` only for invalid input and media-storage faults; adapter
    /// failures degrade into fallback content per stage.
    pub async fn run_turn(
        &self,
        session_id: &str,
        input: TurnInput,
    ) -> Result<TurnResult, VoiceError> {
        let user_text = match self.resolve_user_text(input).await? {
            ResolvedText::Text(text) => text,
            ResolvedText::TranscriptionFailed => {
                return Ok(TurnResult {
                    transcription: TRANSCRIPTION_FAILED.to_string(),
                    reply_text: FALLBACK_MESSAGE.to_string(),
                    audio_url: Self::fallback_audio_url(),
                });
            }
        };

        self.history
            .append(session_id, Turn::user(&user_text))
            .await;
        let transcript = self.history.get(session_id).await;
        let prompt = render_prompt(&transcript);

        let reply_text = match self.generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(session_id, "generation failed, substituting fallback reply: {}", e);
                FALLBACK_MESSAGE.to_string()
            }
        };

        // The assistant turn is recorded whether the reply is real or the
        // fallback, keeping the transcript's user/assistant cadence intact.
        self.history
            .append(session_id, Turn::assistant(&reply_text))
            .await;

        let audio_url = match self.synthesizer.synthesize(&reply_text).await {
            Ok(bytes) => self.store_clip(&bytes).await?,
            Err(e) => {
                warn!(session_id, "synthesis failed, substituting fallback audio: {}", e);
                // Backfill the cached clip if startup pre-generation failed,
                // so the URL handed out here resolves. This synthesis failure
                // may be input-specific (an oversized reply, say) while the
                // short fallback phrase still renders.
                if let Err(e) = self.ensure_fallback_audio().await {
                    warn!("could not cache fallback audio: {}", e);
                }
                Self::fallback_audio_url()
            }
        };

        Ok(TurnResult {
            transcription: user_text,
            reply_text,
            audio_url,
        })
    }

    /// Transcribes a clip without touching any session history.
    pub async fn transcribe_clip(&self, audio: &[u8]) -> Result<String, VoiceError> {
        self.transcriber.transcribe(audio).await
    }

    /// Synthesizes text to a stored clip and returns its URL path, without
    /// touching any session history.
    pub async fn synthesize_clip(&self, text: &str) -> Result<String, VoiceError> {
        let bytes = self.synthesizer.synthesize(text).await?;
        self.store_clip(&bytes).await
    }

    async fn resolve_user_text(&self, input: TurnInput) -> Result<ResolvedText, VoiceError> {
        // Whitespace-only text counts as absent.
        let text = input
            .text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        match (input.audio, text) {
            (Some(_), Some(_)) => Err(VoiceError::InvalidInput(
                "provide either audio or text, not both".to_string(),
            )),
            (None, None) => Err(VoiceError::InvalidInput(
                "no audio or text provided".to_string(),
            )),
            (None, Some(text)) => Ok(ResolvedText::Text(text)),
            (Some(audio), None) => match self.transcriber.transcribe(&audio).await {
                Ok(text) => Ok(ResolvedText::Text(text)),
                Err(e) => {
                    warn!("transcription failed, ending turn with fallback: {}", e);
                    Ok(ResolvedText::TranscriptionFailed)
                }
            },
        }
    }

    async fn store_clip(&self, bytes: &[u8]) -> Result<String, VoiceError> {
        let file_name = format!("{}.mp3", Uuid::new_v4());
        let path = self.media_dir.join(&file_name);
        tokio::fs::write(&path, bytes).await?;
        Ok(format!("/media/{}", file_name))
    }
}
