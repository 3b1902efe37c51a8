//! Parlance server library logic.

pub mod api;
pub mod api_chat;
pub mod api_voice;
pub mod config;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use parlance_voice::TurnPipeline;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Maximum request body size (12 MiB). Leaves multipart-framing headroom
/// over the 10 MiB STT input ceiling.
const MAX_REQUEST_BODY_BYTES: usize = 12 * 1024 * 1024;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The conversation turn pipeline.
    pub pipeline: Arc<TurnPipeline>,
    /// Directory holding synthesized audio clips, served at `/media`.
    pub media_dir: String,
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/agent/chat/{sessionId}", post(api_chat::agent_chat_handler))
        .route("/tts", post(api_voice::generate_audio_handler))
        .route("/transcribe", post(api_voice::transcribe_handler))
        .route("/tts/echo", post(api_voice::tts_echo_handler));

    // Serve synthesized clips (including fallback.mp3) under /media/*
    let media_dir = state.media_dir.clone();
    let router = if std::path::Path::new(&media_dir).exists() {
        tracing::info!(path = %media_dir, "serving synthesized audio at /media");
        router.nest_service("/media", ServeDir::new(&media_dir))
    } else {
        tracing::info!(path = %media_dir, "media directory not found yet (created at startup)");
        router
    };

    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use parlance_voice::{
        Generator, HistoryStore, Synthesizer, Transcriber, VoiceError, FALLBACK_MESSAGE,
    };
    use tower::ServiceExt;

    struct StubStt {
        fail: bool,
    }

    #[async_trait]
    impl Transcriber for StubStt {
        async fn transcribe(&self, _audio: &[u8]) -> Result<String, VoiceError> {
            if self.fail {
                Err(VoiceError::Transcription("engine offline".to_string()))
            } else {
                Ok("spoken words".to_string())
            }
        }
    }

    struct StubLlm;

    #[async_trait]
    impl Generator for StubLlm {
        async fn generate(&self, _prompt: &str) -> Result<String, VoiceError> {
            Ok("stub reply".to_string())
        }
    }

    struct StubTts;

    #[async_trait]
    impl Synthesizer for StubTts {
        async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, VoiceError> {
            Ok(vec![1, 2, 3])
        }
    }

    fn test_app(media_dir: &std::path::Path, stt_fails: bool) -> Router {
        let pipeline = TurnPipeline::new(
            Arc::new(StubStt { fail: stt_fails }),
            Arc::new(StubLlm),
            Arc::new(StubTts),
            HistoryStore::new(),
            media_dir,
        );
        app(AppState {
            pipeline: Arc::new(pipeline),
            media_dir: media_dir.to_string_lossy().into_owned(),
        })
    }

    fn multipart_body(fields: &[(&str, &str)]) -> (String, String) {
        let boundary = "parlance-test-boundary";
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!("--{boundary}--\r\n"));
        (
            format!("multipart/form-data; boundary={boundary}"),
            body,
        )
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_check_returns_ok() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), false);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn chat_turn_with_text_field_returns_result() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), false);

        let (content_type, body) = multipart_body(&[("text", "hello")]);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/agent/chat/s1")
                    .header("content-type", content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["transcription"], "hello");
        assert_eq!(json["reply_text"], "stub reply");
        assert!(json["audio_url"].as_str().unwrap().starts_with("/media/"));
    }

    #[tokio::test]
    async fn chat_turn_with_no_fields_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), false);

        let (content_type, body) = multipart_body(&[]);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/agent/chat/s1")
                    .header("content-type", content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("no audio or text"));
    }

    #[tokio::test]
    async fn chat_turn_with_failed_transcription_still_answers_ok() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), true);

        let (content_type, body) = multipart_body(&[("audio", "fake-bytes")]);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/agent/chat/s1")
                    .header("content-type", content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["reply_text"], FALLBACK_MESSAGE);
        assert_eq!(json["audio_url"], "/media/fallback.mp3");
    }

    #[tokio::test]
    async fn standalone_tts_returns_clip_url() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), false);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/tts")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"text":"say this"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["audio_url"].as_str().unwrap().ends_with(".mp3"));
    }

    #[tokio::test]
    async fn standalone_transcribe_returns_text() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), false);

        let (content_type, body) = multipart_body(&[("audio", "fake-bytes")]);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/transcribe")
                    .header("content-type", content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["text"], "spoken words");
    }

    #[tokio::test]
    async fn echo_round_trips_transcription_into_audio() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), false);

        let (content_type, body) = multipart_body(&[("file", "fake-bytes")]);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/tts/echo")
                    .header("content-type", content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["transcription"], "spoken words");
        assert!(json["audio_url"].as_str().unwrap().starts_with("/media/"));
    }

    #[tokio::test]
    async fn failed_transcription_on_utility_route_is_bad_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), true);

        let (content_type, body) = multipart_body(&[("audio", "fake-bytes")]);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/transcribe")
                    .header("content-type", content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
