// Liveness, model availability and service info

use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "backend": &*state.backend,
    }))
}

pub async fn models(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let statuses = super::blocking(&state, |synth| Ok(synth.probe_models())).await?;
    let models: BTreeMap<String, &str> = statuses
        .into_iter()
        .map(|status| {
            let label = if status.is_available() { "available" } else { "not_found" };
            (status.key, label)
        })
        .collect();
    Ok(Json(json!({ "models": models })))
}

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": "Voicebox TTS API Server",
        "version": crate::VERSION,
        "backend": &*state.backend,
        "transcription": state.synthesizer.can_transcribe(),
    }))
}
