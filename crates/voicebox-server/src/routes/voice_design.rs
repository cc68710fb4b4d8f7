// Generation from a natural-language voice description

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use voicebox_core::{SynthesisRequest, VoiceMode};

use super::{audio_response, blocking, default_language, default_response_format, default_speed};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VoiceDesignRequest {
    text: String,
    #[serde(default = "default_language")]
    language: String,
    instruct: String,
    #[serde(default = "default_speed")]
    speed: f32,
    #[serde(default = "default_response_format")]
    response_format: String,
}

pub async fn generate(
    State(state): State<AppState>,
    Json(body): Json<VoiceDesignRequest>,
) -> ApiResult<Response> {
    tracing::info!("Generating designed voice: {}", body.instruct);

    let request = SynthesisRequest::new(
        body.text,
        VoiceMode::VoiceDesign {
            instruct: body.instruct,
        },
    )
    .with_language(body.language)
    .with_speed(body.speed);

    let audio = blocking(&state, move |synth| synth.synthesize(&request)).await?;
    audio_response(&audio, &body.response_format, "voice_design")
}
