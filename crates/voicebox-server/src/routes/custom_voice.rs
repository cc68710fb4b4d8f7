// Preset-speaker generation and catalog listing

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use voicebox_core::{SynthesisRequest, VoiceMode};

use super::{audio_response, blocking, default_language, default_response_format, default_speed};
use crate::error::ApiResult;
use crate::state::AppState;

fn default_speaker() -> String {
    voicebox_core::DEFAULT_SPEAKER.to_string()
}

#[derive(Debug, Deserialize)]
pub struct CustomVoiceRequest {
    text: String,
    #[serde(default = "default_language")]
    language: String,
    #[serde(default = "default_speaker")]
    speaker: String,
    #[serde(default)]
    instruct: String,
    #[serde(default = "default_speed")]
    speed: f32,
    #[serde(default = "default_response_format")]
    response_format: String,
}

pub async fn generate(
    State(state): State<AppState>,
    Json(body): Json<CustomVoiceRequest>,
) -> ApiResult<Response> {
    tracing::info!("Generating custom voice for speaker: {}", body.speaker);

    let request = SynthesisRequest::new(
        body.text,
        VoiceMode::CustomVoice {
            speaker: body.speaker.clone(),
            instruct: Some(body.instruct),
        },
    )
    .with_language(body.language)
    .with_speed(body.speed);

    let audio = blocking(&state, move |synth| synth.synthesize(&request)).await?;
    audio_response(
        &audio,
        &body.response_format,
        &format!("custom_voice_{}", body.speaker),
    )
}

pub async fn speakers(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "speakers": state.synthesizer.catalog().speakers() }))
}

pub async fn languages(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "languages": state.synthesizer.catalog().languages() }))
}
