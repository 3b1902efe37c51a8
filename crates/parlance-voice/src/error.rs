use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("transcription error: {0}")]
    Transcription(String),

    #[error("generation error: {0}")]
    Generation(String),

    #[error("synthesis error: {0}")]
    Synthesis(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("media storage error: {0}")]
    Media(#[from] std::io::Error),
}
