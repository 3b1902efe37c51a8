//! Conversation turn pipeline for the Parlance voice relay.
//!
//! A turn arrives as either spoken audio or typed text. Audio is transcribed
//! to text, the session's accumulated transcript is sent to a language model,
//! and the reply is rendered to speech. Each of the three external calls
//! (STT, LLM, TTS) sits behind its own adapter trait and can fail
//! independently; the pipeline substitutes fixed fallbacks so a voice session
//! stays alive through partial failures.
//!
//! Conversation state lives only in the in-memory [`HistoryStore`]; adapters
//! never persist anything. Session lifetime is process lifetime.

pub mod config;
pub mod error;
pub mod history;
pub mod llm;
pub mod pipeline;
pub mod stt;
pub mod tts;

pub use config::{LlmConfig, SttConfig, TtsConfig, VoiceConfig};
pub use error::VoiceError;
pub use history::{render_prompt, HistoryStore, Role, Turn};
pub use llm::{Generator, HttpLlm};
pub use pipeline::{
    TurnInput, TurnPipeline, TurnResult, FALLBACK_AUDIO_FILE, FALLBACK_MESSAGE,
    TRANSCRIPTION_FAILED,
};
pub use stt::{HttpStt, Transcriber};
pub use tts::{HttpTts, Synthesizer};
