//! HTTP server.
//!
//! API endpoints:
//! - GET  /                      - liveness message
//! - GET  /health                - status and compute device
//! - POST /save-reference-audio  - store the default reference sample (multipart)
//! - POST /clone                 - clone from a JSON request
//! - POST /clone/form            - clone from a multipart form
//!
//! Clone failures are reported as HTTP 200 with `success: false`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use voxclone_pipeline::{codec, CloneRequest, Pipeline, ReferenceAudio};

use crate::api::{SaveReferenceResponse, VoiceCloneRequest, VoiceCloneResponse};

/// Uploads and inline base64 references can be large.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

const REFERENCE_FIELD: &str = "reference_audio";

/// Shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
    reference_audio_path: Arc<PathBuf>,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>, reference_audio_path: PathBuf) -> Self {
        Self {
            pipeline,
            reference_audio_path: Arc::new(reference_audio_path),
        }
    }

    /// The persisted reference sample, if one has been uploaded.
    fn saved_reference(&self) -> Option<ReferenceAudio> {
        self.reference_audio_path
            .is_file()
            .then(|| ReferenceAudio::File(self.reference_audio_path.to_path_buf()))
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/save-reference-audio", post(save_reference_audio))
        .route("/clone", post(clone_json))
        .route("/clone/form", post(clone_form))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves until Ctrl-C. In-flight requests finish, so their working files
/// are cleaned up before the process exits.
pub async fn start_server(addr: &str, state: AppState) -> Result<()> {
    let app = router(state);
    let addr = parse_addr(addr)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "cannot listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutting down");
        })
        .await?;

    Ok(())
}

/// Parse address string to SocketAddr. A leading `:` binds all interfaces.
fn parse_addr(addr: &str) -> Result<SocketAddr> {
    let addr = if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    };
    Ok(addr.parse()?)
}

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "voxclone backend is running" }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "device": state.pipeline.device().to_string(),
    }))
}

async fn save_reference_audio(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let bytes = match read_reference_field(&mut multipart).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return save_failure(format!("missing multipart field `{REFERENCE_FIELD}`")),
        Err(e) => return save_failure(format!("invalid upload: {e}")),
    };

    let dest = state.reference_audio_path.to_path_buf();
    match tokio::task::spawn_blocking(move || codec::store(&bytes, &dest)).await {
        Ok(Ok(path)) => {
            info!(path = %path.display(), "reference audio saved");
            Json(SaveReferenceResponse {
                success: true,
                message: "Reference audio saved successfully".to_string(),
                path: Some(path.display().to_string()),
            })
            .into_response()
        }
        Ok(Err(e)) => save_failure(format!("Error saving reference audio: {e}")),
        Err(e) => save_failure(format!("Error saving reference audio: {e}")),
    }
}

fn save_failure(message: String) -> Response {
    warn!(%message, "reference upload rejected");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(SaveReferenceResponse {
            success: false,
            message,
            path: None,
        }),
    )
        .into_response()
}

async fn read_reference_field(multipart: &mut Multipart) -> Result<Option<Vec<u8>>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(REFERENCE_FIELD) {
            return Ok(Some(field.bytes().await?.to_vec()));
        }
    }
    Ok(None)
}

async fn clone_json(State(state): State<AppState>, Json(body): Json<VoiceCloneRequest>) -> Json<VoiceCloneResponse> {
    match body.into_clone_request(state.saved_reference()) {
        Ok(req) => Json(run_clone(&state, req).await),
        Err(message) => Json(VoiceCloneResponse::failure(message)),
    }
}

/// Fields of a `POST /clone/form` body.
#[derive(Debug, Default)]
struct CloneForm {
    text: Option<String>,
    speed: Option<String>,
    language: Option<String>,
    output_filename: Option<String>,
    reference_audio: Option<Vec<u8>>,
}

impl CloneForm {
    async fn read(multipart: &mut Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "text" => form.text = Some(field.text().await?),
                "speed" => form.speed = Some(field.text().await?),
                "language" => form.language = Some(field.text().await?),
                "output_filename" => form.output_filename = Some(field.text().await?),
                REFERENCE_FIELD => form.reference_audio = Some(field.bytes().await?.to_vec()),
                _ => {}
            }
        }
        Ok(form)
    }

    /// Browsers send an empty part for an unselected file input; that
    /// counts as no upload.
    fn into_clone_request(self, saved: Option<ReferenceAudio>) -> Result<CloneRequest, String> {
        let text = self.text.ok_or("missing form field `text`")?;
        let speed = match self.speed.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => s.parse::<f32>().map_err(|_| format!("invalid speed: {s}"))?,
            None => 1.0,
        };
        let reference = match self.reference_audio.filter(|b| !b.is_empty()) {
            Some(bytes) => ReferenceAudio::Bytes(bytes),
            None => saved.ok_or("No reference audio provided and no saved reference audio found")?,
        };

        let mut req = CloneRequest::new(text, reference).with_speed(speed);
        if let Some(language) = self.language.filter(|s| !s.trim().is_empty()) {
            req = req.with_language(language);
        }
        if let Some(name) = self.output_filename.filter(|s| !s.is_empty()) {
            req = req.with_output_name(name);
        }
        Ok(req)
    }
}

async fn clone_form(State(state): State<AppState>, mut multipart: Multipart) -> Json<VoiceCloneResponse> {
    let form = match CloneForm::read(&mut multipart).await {
        Ok(form) => form,
        Err(e) => return Json(VoiceCloneResponse::failure(format!("invalid form: {e}"))),
    };
    match form.into_clone_request(state.saved_reference()) {
        Ok(req) => Json(run_clone(&state, req).await),
        Err(message) => Json(VoiceCloneResponse::failure(message)),
    }
}

async fn run_clone(state: &AppState, req: CloneRequest) -> VoiceCloneResponse {
    state.pipeline.clone_voice_async(req).await.into()
}
