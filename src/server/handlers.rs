use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::info;

use crate::credential::Credential;
use crate::data;
use crate::describer::SceneDescriber;
use crate::settings::Settings;
use crate::tts::SpeechSynthesizer;

use super::actions::{self, ActionError};
use super::models::{
    ActionRequest, CapabilitiesResponse, DescribeResponse, ErrorResponse, ExtractResponse,
    NarrateResponse, SpeakResponse,
};
use super::state::ServerState;

const INDEX_HTML: &str = include_str!("../../ui/index.html");

pub async fn run_server(
    settings: Settings,
    credential: Option<Credential>,
    addr: String,
) -> Result<()> {
    let synthesizer = SpeechSynthesizer::new(settings.tts_lang.clone());
    let describer =
        credential.map(|key| SceneDescriber::new(key, settings.assistant_model.clone()));
    let state = Arc::new(ServerState {
        settings,
        describer,
        synthesizer,
    });

    let app = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/capabilities", get(capabilities))
        .route("/v1/describe", post(describe))
        .route("/v1/extract-text", post(extract))
        .route("/v1/speak", post(speak))
        .route("/v1/narrate", post(narrate))
        .with_state(state)
        .layer(axum::middleware::from_fn(cors_middleware));

    info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| "failed to bind server address")?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn capabilities(State(state): State<Arc<ServerState>>) -> Json<CapabilitiesResponse> {
    Json(CapabilitiesResponse {
        assistant_available: state.describer.is_some(),
        assistant_model: state
            .describer
            .as_ref()
            .map(|describer| describer.model().to_string()),
        ocr_languages: state.settings.ocr_languages.clone(),
        tts_lang: state.settings.tts_lang.clone(),
        accepted_mimes: vec![data::JPEG_MIME.to_string(), data::PNG_MIME.to_string()],
    })
}

async fn describe(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<ActionRequest>,
) -> Result<Json<DescribeResponse>, (StatusCode, Json<ErrorResponse>)> {
    actions::describe_scene(state.as_ref(), payload)
        .await
        .map(Json)
        .map_err(reject)
}

async fn extract(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<ActionRequest>,
) -> Result<Json<ExtractResponse>, (StatusCode, Json<ErrorResponse>)> {
    actions::extract_text(state.as_ref(), payload)
        .await
        .map(Json)
        .map_err(reject)
}

async fn speak(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<ActionRequest>,
) -> Result<Json<SpeakResponse>, (StatusCode, Json<ErrorResponse>)> {
    actions::speak_extracted_text(state.as_ref(), payload)
        .await
        .map(Json)
        .map_err(reject)
}

async fn narrate(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<ActionRequest>,
) -> Result<Json<NarrateResponse>, (StatusCode, Json<ErrorResponse>)> {
    actions::narrate_scene(state.as_ref(), payload)
        .await
        .map(Json)
        .map_err(reject)
}

fn reject(err: ActionError) -> (StatusCode, Json<ErrorResponse>) {
    (
        err.status(),
        Json(ErrorResponse {
            kind: err.kind().to_string(),
            error: err.message(),
        }),
    )
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type,authorization"),
    );
}
