//! HTTP routes
//!
//! Handlers translate JSON bodies into core requests and run all model work
//! on the blocking pool.

use std::convert::Infallible;
use std::sync::Arc;

use axum::http::header::{self, HeaderValue};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use voicebox_core::{
    AudioBuffer, ReferenceAudio, StreamEvent, StreamRequest, Synthesizer, VoiceboxError,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

mod clone;
mod custom_voice;
mod health;
mod prompts;
mod voice_design;

/// Events buffered between the generating thread and the client
const STREAM_BUFFER: usize = 2;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/health/models", get(health::models))
        .route("/api/v1/custom-voice/generate", post(custom_voice::generate))
        .route("/api/v1/custom-voice/speakers", get(custom_voice::speakers))
        .route("/api/v1/custom-voice/languages", get(custom_voice::languages))
        .route("/api/v1/voice-design/generate", post(voice_design::generate))
        .route("/api/v1/base/clone", post(clone::clone_voice))
        .route("/api/v1/base/clone/stream", post(clone::clone_stream))
        .route("/api/v1/base/upload-ref-audio", post(clone::upload_ref_audio))
        .route("/api/v1/base/transcribe", post(clone::transcribe))
        .route("/api/v1/base/create-prompt", post(prompts::create))
        .route("/api/v1/base/save-voice", post(prompts::save_voice))
        .route("/api/v1/base/generate-with-prompt", post(prompts::generate))
        .route("/api/v1/base/generate-with-prompt/stream", post(prompts::generate_stream))
        .route("/api/v1/base/prompts", get(prompts::list))
        .route("/api/v1/base/cache/stats", get(prompts::cache_stats))
        .route(
            "/api/v1/base/prompts/:prompt_id",
            get(prompts::get_prompt).delete(prompts::delete),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub(crate) fn default_language() -> String {
    voicebox_core::DEFAULT_LANGUAGE.to_string()
}

pub(crate) const fn default_speed() -> f32 {
    voicebox_core::DEFAULT_SPEED
}

pub(crate) fn default_response_format() -> String {
    "base64".to_string()
}

/// Base64 payload returned by the generate endpoints
#[derive(Debug, Serialize)]
pub(crate) struct AudioPayload {
    audio: String,
    sample_rate: u32,
    format: &'static str,
}

/// Base64 JSON for `response_format = "base64"`, a WAV attachment otherwise
pub(crate) fn audio_response(
    audio: &AudioBuffer,
    response_format: &str,
    filename: &str,
) -> ApiResult<Response> {
    if response_format == "base64" {
        let payload = AudioPayload {
            audio: audio.to_base64_wav()?,
            sample_rate: audio.sample_rate,
            format: "wav",
        };
        return Ok(Json(payload).into_response());
    }

    let disposition = HeaderValue::from_str(&format!("attachment; filename={filename}.wav"))
        .map_err(|_| VoiceboxError::invalid_request(format!("Invalid file name: {filename}")))?;
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("audio/wav")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        audio.to_wav()?,
    )
        .into_response())
}

/// Run a blocking core call on the blocking pool
pub(crate) async fn blocking<T, F>(state: &AppState, work: F) -> ApiResult<T>
where
    F: FnOnce(&Synthesizer) -> Result<T, VoiceboxError> + Send + 'static,
    T: Send + 'static,
{
    let synthesizer = Arc::clone(&state.synthesizer);
    let result = tokio::task::spawn_blocking(move || work(synthesizer.as_ref())).await?;
    Ok(result?)
}

pub(crate) fn decode_base64(payload: &str) -> ApiResult<Vec<u8>> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(VoiceboxError::from)?;
    Ok(bytes)
}

/// Reference bytes from a base64 payload or, failing that, a URL
pub(crate) async fn reference_bytes(
    state: &AppState,
    base64: Option<&str>,
    url: Option<&str>,
) -> ApiResult<Option<Vec<u8>>> {
    match (base64.filter(|b| !b.is_empty()), url.filter(|u| !u.is_empty())) {
        (Some(payload), _) => decode_base64(payload).map(Some),
        (None, Some(url)) => state.fetch_reference(url).await.map(Some),
        (None, None) => Ok(None),
    }
}

/// Inline reference for clone requests
pub(crate) async fn inline_reference(
    state: &AppState,
    base64: Option<&str>,
    url: Option<&str>,
    ref_text: Option<String>,
    x_vector_only: bool,
) -> ApiResult<Option<ReferenceAudio>> {
    Ok(reference_bytes(state, base64, url)
        .await?
        .map(|audio| ReferenceAudio {
            audio,
            ref_text,
            x_vector_only,
        }))
}

/// Stream a session as server-sent events
///
/// The session runs on the blocking pool and is dropped, releasing the
/// model, as soon as the client goes away.
pub(crate) fn stream_response(state: &AppState, request: StreamRequest) -> Response {
    let (tx, rx) = mpsc::channel(STREAM_BUFFER);
    let synthesizer = Arc::clone(&state.synthesizer);
    tokio::task::spawn_blocking(move || {
        for event in synthesizer.stream(request) {
            if tx.blocking_send(event).is_err() {
                tracing::info!("Stream client disconnected, abandoning session");
                break;
            }
        }
    });
    sse(ReceiverStream::new(rx))
}

/// A stream that fails before any session starts
pub(crate) fn stream_error(err: &ApiError) -> Response {
    tracing::error!("Stream rejected: {}", err);
    let event = StreamEvent::Error {
        error: err.to_string(),
    };
    sse(futures::stream::iter([event]))
}

fn sse<S>(events: S) -> Response
where
    S: Stream<Item = StreamEvent> + Send + 'static,
{
    let stream = events.map(|event| Ok::<_, Infallible>(to_event(&event)));
    let mut response = Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response();
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    response
}

fn to_event(event: &StreamEvent) -> Event {
    Event::default()
        .json_data(event)
        .unwrap_or_else(|e| Event::default().data(format!(r#"{{"type":"error","error":"{e}"}}"#)))
}
