// Stored voice prompts and the prompt cache status endpoint

use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use voicebox_core::{
    NewPrompt, PromptDetail, StreamRequest, SynthesisRequest, VoiceMode, VoiceboxError,
};

use super::{
    audio_response, blocking, decode_base64, default_language, default_response_format,
    default_speed, reference_bytes, stream_response,
};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePromptRequest {
    ref_audio_base64: Option<String>,
    ref_audio_url: Option<String>,
    ref_text: Option<String>,
    name: Option<String>,
    #[serde(default)]
    x_vector_only_mode: bool,
}

#[derive(Debug, Deserialize)]
pub struct SaveGeneratedVoiceRequest {
    name: String,
    ref_audio_base64: String,
    ref_text: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateWithPromptRequest {
    prompt_id: String,
    text: String,
    #[serde(default = "default_language")]
    language: String,
    #[serde(default = "default_speed")]
    speed: f32,
    #[serde(default = "default_response_format")]
    response_format: String,
}

#[derive(Debug, Deserialize)]
pub struct StreamingGenerateWithPromptRequest {
    prompt_id: String,
    text: String,
    #[serde(default = "default_language")]
    language: String,
    #[serde(default = "default_speed")]
    speed: f32,
    chunk_size: Option<usize>,
    seed: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct CreatePromptResponse {
    prompt_id: String,
    message: String,
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreatePromptRequest>,
) -> ApiResult<Json<CreatePromptResponse>> {
    tracing::info!("Creating voice clone prompt");

    let ref_audio = reference_bytes(
        &state,
        body.ref_audio_base64.as_deref(),
        body.ref_audio_url.as_deref(),
    )
    .await?
    .ok_or_else(|| {
        VoiceboxError::invalid_request("Either ref_audio_url or ref_audio_base64 must be provided")
    })?;

    let prompt = NewPrompt {
        name: body.name,
        ref_audio,
        ref_text: body.ref_text,
        x_vector_only: body.x_vector_only_mode,
    };
    let prompt_id = blocking(&state, move |synth| synth.prompts().create(prompt)).await?;

    Ok(Json(CreatePromptResponse {
        prompt_id,
        message: "Prompt created successfully".to_string(),
    }))
}

pub async fn save_voice(
    State(state): State<AppState>,
    Json(body): Json<SaveGeneratedVoiceRequest>,
) -> ApiResult<Json<CreatePromptResponse>> {
    let audio = decode_base64(&body.ref_audio_base64)?;
    let name = body.name.clone();
    let prompt_id = blocking(&state, move |synth| {
        synth.prompts().save_generated(body.name, audio, body.ref_text)
    })
    .await?;

    tracing::info!("Saved generated voice '{}' with ID: {}", name, prompt_id);
    Ok(Json(CreatePromptResponse {
        prompt_id,
        message: format!("Voice '{name}' saved successfully"),
    }))
}

pub async fn generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateWithPromptRequest>,
) -> ApiResult<Response> {
    tracing::info!("Generating with prompt {}", body.prompt_id);

    let request = SynthesisRequest::new(body.text, VoiceMode::clone_prompt(body.prompt_id))
        .with_language(body.language)
        .with_speed(body.speed);

    let audio = blocking(&state, move |synth| synth.synthesize(&request)).await?;
    audio_response(&audio, &body.response_format, "voice_clone_prompt")
}

pub async fn generate_stream(
    State(state): State<AppState>,
    Json(body): Json<StreamingGenerateWithPromptRequest>,
) -> Response {
    tracing::info!(
        "Prompt stream request for {}, text length: {}",
        body.prompt_id,
        body.text.chars().count()
    );

    let synthesis = SynthesisRequest::new(body.text, VoiceMode::clone_prompt(body.prompt_id))
        .with_language(body.language)
        .with_speed(body.speed);

    let mut request = StreamRequest::new(synthesis);
    request.chunk_size = body.chunk_size;
    request.seed = body.seed;
    stream_response(&state, request)
}

pub async fn list(State(state): State<AppState>) -> Json<Value> {
    let prompts = state.synthesizer.prompts().list();
    Json(json!({ "count": prompts.len(), "prompts": prompts }))
}

pub async fn cache_stats() -> Json<Value> {
    Json(json!({
        "enabled": false,
        "message": "Voice prompt caching is not implemented by this backend",
    }))
}

pub async fn get_prompt(
    State(state): State<AppState>,
    Path(prompt_id): Path<String>,
) -> ApiResult<Json<PromptDetail>> {
    let prompt = state.synthesizer.prompts().get(&prompt_id)?;
    Ok(Json(prompt.detail()))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(prompt_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = prompt_id.clone();
    blocking(&state, move |synth| synth.prompts().delete(&id)).await?;
    Ok(Json(json!({
        "message": format!("Prompt {prompt_id} deleted successfully")
    })))
}
