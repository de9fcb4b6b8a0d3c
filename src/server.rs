use crate::llm::{CampaignInput, ScriptGenerator};
use crate::pipeline::{SpeechJob, SpeechPipeline};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Reply};

/// Request bodies above this are rejected before parsing.
const MAX_BODY_SIZE: u64 = 1024 * 1024;

/// Shared handler state. A surface whose credential did not resolve is kept
/// as its configuration message so requests can report it.
pub struct AppState {
    pub speech: Result<Arc<SpeechPipeline>, String>,
    pub scripts: Result<Arc<ScriptGenerator>, String>,
    pub output_dir: PathBuf,
}

fn json_reply(status: StatusCode, body: Value) -> Response {
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

fn error_reply(status: StatusCode, message: impl Into<String>) -> Response {
    json_reply(status, json!({ "error": message.into() }))
}

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn json_body() -> impl Filter<Extract = (Value,), Error = warp::Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_SIZE).and(warp::body::json())
}

pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = warp::Rejection> + Clone {
    let script = warp::path!("api" / "generate-script")
        .and(warp::post())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(generate_script);

    let speech = warp::path!("api" / "generate-speech")
        .and(warp::post())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(generate_speech);

    let audio = warp::path!("api" / "audio" / String)
        .and(warp::get())
        .and(with_state(state))
        .and_then(serve_audio);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_headers(vec!["content-type"]);

    script.or(speech).or(audio).with(cors)
}

/// Bind and serve until the process exits.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) {
    tracing::info!("[Server] Listening on http://{}", addr);
    warp::serve(routes(state)).run(addr).await;
}

async fn generate_script(body: Value, state: Arc<AppState>) -> Result<Response, Infallible> {
    let input = match CampaignInput::from_json(&body) {
        Ok(input) => input,
        Err(e) => return Ok(error_reply(StatusCode::BAD_REQUEST, e.to_string())),
    };

    let generator = match &state.scripts {
        Ok(generator) => generator.clone(),
        Err(message) => {
            return Ok(error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to generate script: {}", message),
            ))
        }
    };

    match generator.generate(&input).await {
        Ok(script) => Ok(json_reply(
            StatusCode::OK,
            json!({ "script": script, "inputs": body }),
        )),
        Err(e) => {
            tracing::error!("[Server] Script generation failed: {}", e);
            Ok(error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to generate script: {}", e),
            ))
        }
    }
}

fn field(body: &Value, name: &str, default: &str) -> String {
    body.get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

async fn generate_speech(body: Value, state: Arc<AppState>) -> Result<Response, Infallible> {
    let script = body
        .get("script")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if script.is_empty() {
        return Ok(error_reply(StatusCode::BAD_REQUEST, "Missing required field: script"));
    }

    let pipeline = match &state.speech {
        Ok(pipeline) => pipeline.clone(),
        Err(message) => return Ok(error_reply(StatusCode::INTERNAL_SERVER_ERROR, message.clone())),
    };

    let job = SpeechJob {
        script: script.to_string(),
        tone: Some(field(&body, "tone", "professional")),
        gender: Some(field(&body, "gender", "neutral")),
        background_music: Some(field(&body, "background_music", "none")),
        language: Some(field(&body, "language", "english")),
        ..Default::default()
    };

    match pipeline.run(&job).await {
        Ok(outcome) => {
            let filename = outcome
                .output
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let filepath = state.output_dir.join(&filename);
            Ok(json_reply(
                StatusCode::OK,
                json!({
                    "filename": filename,
                    "filepath": filepath.to_string_lossy(),
                    "message": "Speech generated successfully",
                    "voice_id": outcome.voice_id,
                    "mix_strategy": outcome.mix_strategy,
                }),
            ))
        }
        Err(e) => {
            tracing::error!("[Server] Speech generation failed: {}", e);
            Ok(error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to generate speech: {}", e),
            ))
        }
    }
}

/// Only bare file names from the output directory are served.
async fn serve_audio(filename: String, state: Arc<AppState>) -> Result<Response, Infallible> {
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return Ok(error_reply(StatusCode::BAD_REQUEST, "Invalid filename"));
    }

    let path = state.output_dir.join(&filename);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(_) => return Ok(error_reply(StatusCode::NOT_FOUND, "Audio file not found")),
    };

    let mime = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("wav") => "audio/wav",
        _ => "audio/mpeg",
    };

    let mut response = Response::new(bytes.into());
    response.headers_mut().insert(
        warp::http::header::CONTENT_TYPE,
        warp::http::HeaderValue::from_static(mime),
    );
    response.headers_mut().insert(
        warp::http::header::CACHE_CONTROL,
        warp::http::HeaderValue::from_static("no-store"),
    );
    Ok(response)
}
