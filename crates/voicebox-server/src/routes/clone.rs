// Voice cloning from inline reference audio, uploads and transcription

use axum::extract::{Multipart, State};
use axum::response::Response;
use axum::Json;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use voicebox_core::{ReferenceSource, StreamRequest, SynthesisRequest, VoiceMode};

use super::{
    audio_response, blocking, decode_base64, default_language, default_response_format,
    default_speed, inline_reference, stream_error, stream_response,
};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VoiceCloneRequest {
    text: String,
    #[serde(default = "default_language")]
    language: String,
    ref_audio_base64: Option<String>,
    ref_audio_url: Option<String>,
    ref_text: Option<String>,
    #[serde(default)]
    x_vector_only_mode: bool,
    #[serde(default = "default_speed")]
    speed: f32,
    #[serde(default = "default_response_format")]
    response_format: String,
}

#[derive(Debug, Deserialize)]
pub struct StreamingVoiceCloneRequest {
    text: String,
    #[serde(default = "default_language")]
    language: String,
    ref_audio_base64: Option<String>,
    ref_audio_url: Option<String>,
    ref_text: Option<String>,
    #[serde(default)]
    x_vector_only_mode: bool,
    #[serde(default = "default_speed")]
    speed: f32,
    chunk_size: Option<usize>,
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct TranscribeRequest {
    ref_audio_base64: String,
}

pub async fn clone_voice(
    State(state): State<AppState>,
    Json(body): Json<VoiceCloneRequest>,
) -> ApiResult<Response> {
    tracing::info!("Generating voice clone");

    let reference = inline_reference(
        &state,
        body.ref_audio_base64.as_deref(),
        body.ref_audio_url.as_deref(),
        body.ref_text,
        body.x_vector_only_mode,
    )
    .await?;

    let request = SynthesisRequest::new(
        body.text,
        VoiceMode::Clone {
            reference: reference.map(ReferenceSource::Inline),
        },
    )
    .with_language(body.language)
    .with_speed(body.speed);

    let audio = blocking(&state, move |synth| synth.synthesize(&request)).await?;
    audio_response(&audio, &body.response_format, "voice_clone")
}

pub async fn clone_stream(
    State(state): State<AppState>,
    Json(body): Json<StreamingVoiceCloneRequest>,
) -> Response {
    tracing::info!(
        "Clone stream request received, text length: {}",
        body.text.chars().count()
    );

    let reference = match inline_reference(
        &state,
        body.ref_audio_base64.as_deref(),
        body.ref_audio_url.as_deref(),
        body.ref_text,
        body.x_vector_only_mode,
    )
    .await
    {
        Ok(reference) => reference,
        Err(err) => return stream_error(&err),
    };

    let synthesis = SynthesisRequest::new(
        body.text,
        VoiceMode::Clone {
            reference: reference.map(ReferenceSource::Inline),
        },
    )
    .with_language(body.language)
    .with_speed(body.speed);

    let mut request = StreamRequest::new(synthesis);
    request.chunk_size = body.chunk_size;
    request.seed = body.seed;
    stream_response(&state, request)
}

pub async fn upload_ref_audio(mut multipart: Multipart) -> ApiResult<Json<Value>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let content = field.bytes().await?;
        tracing::info!(
            "Uploading reference audio: {} ({} bytes)",
            filename.as_deref().unwrap_or("<unnamed>"),
            content.len()
        );

        return Ok(Json(json!({
            "filename": filename,
            "content_type": content_type,
            "audio_base64": base64::engine::general_purpose::STANDARD.encode(&content),
            "message": "File uploaded and encoded successfully",
        })));
    }
    Err(ApiError::Upload("missing multipart field `file`".to_string()))
}

pub async fn transcribe(
    State(state): State<AppState>,
    Json(body): Json<TranscribeRequest>,
) -> ApiResult<Json<Value>> {
    tracing::info!("Transcribing reference audio");
    let audio = decode_base64(&body.ref_audio_base64)?;
    let text = blocking(&state, move |synth| synth.transcribe(&audio)).await?;
    Ok(Json(json!({ "text": text })))
}
