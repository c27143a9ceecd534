use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use axum::Router;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tracing::{Level, error, info};

mod metrics;

use lyrify::{Caption, GeminiClient, Lyrify, Opts, captions, playback};

#[derive(Parser, Debug)]
#[command(name = "lyrify-server")]
#[command(about = "HTTP server that generates synchronized lyric subtitles for songs")]
struct Params {
    /// Gemini API key. Falls back to the GEMINI_API_KEY environment variable.
    #[arg(long = "api-key")]
    api_key: Option<String>,

    /// Gemini model to use for generation.
    #[arg(long = "model", default_value = GeminiClient::DEFAULT_MODEL)]
    model: String,

    /// Host interface to bind to.
    #[arg(long = "host", default_value = "127.0.0.1")]
    host: String,

    /// TCP port to listen on.
    #[arg(long = "port", default_value_t = 8080)]
    port: u16,

    /// Maximum accepted audio size (bytes).
    #[arg(long = "max-audio-bytes", default_value_t = 15 * 1024 * 1024)]
    max_audio_bytes: usize,

    /// How long generated subtitles stay downloadable (seconds).
    #[arg(long = "cache-ttl-seconds", default_value_t = 3600)]
    cache_ttl_seconds: u64,

    /// Maximum number of generated results held at once.
    #[arg(long = "cache-capacity", default_value_t = 256)]
    cache_capacity: usize,

    /// Timeout for each upstream generation request (seconds).
    #[arg(long = "request-timeout-seconds", default_value_t = 120)]
    request_timeout_seconds: u64,
}

#[derive(Clone)]
struct AppState {
    lyrify: Arc<Lyrify<GeminiClient>>,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    subtitles: String,
    file_id: String,
}

#[derive(Debug, Deserialize)]
struct CaptionsQuery {
    /// Elapsed playback time in seconds; selects the active lyric when present.
    #[serde(default)]
    t: Option<f64>,
}

#[derive(Debug, Serialize)]
struct CaptionsResponse {
    captions: Vec<Caption>,
    active_lyric: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<lyrify::Error> for AppError {
    fn from(err: lyrify::Error) -> Self {
        let status = match &err {
            lyrify::Error::MissingAudio => StatusCode::BAD_REQUEST,
            lyrify::Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            lyrify::Error::NotFound => StatusCode::NOT_FOUND,
            lyrify::Error::Generation(_) => StatusCode::BAD_GATEWAY,
            lyrify::Error::Config(_) | lyrify::Error::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[tokio::main]
async fn main() {
    lyrify::logging::init();

    if let Err(err) = run().await {
        error!(error = ?err, "lyrify-server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let params = Params::parse();

    metrics::init();

    let addr: SocketAddr = format!("{}:{}", params.host, params.port)
        .parse()
        .context("invalid host/port bind address")?;

    let api_key = resolve_api_key(params.api_key, std::env::var("GEMINI_API_KEY").ok())?;

    let opts = Opts {
        max_audio_bytes: params.max_audio_bytes,
        cache_ttl: Duration::from_secs(params.cache_ttl_seconds),
        cache_capacity: params.cache_capacity,
        request_timeout: Duration::from_secs(params.request_timeout_seconds),
    };

    let lyrify =
        Lyrify::new(api_key, params.model, opts).context("failed to initialize Gemini client")?;

    let state = AppState {
        lyrify: Arc::new(lyrify),
    };

    // Leave headroom above the audio bound for multipart framing; the precise
    // audio-size check happens in the library.
    let body_limit = params.max_audio_bytes + 64 * 1024;

    let app = Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics::prometheus_metrics))
        .route("/api/generate", post(generate))
        .route("/api/download/{file_id}", get(download))
        .route("/api/captions/{file_id}", get(captions_at))
        .route_layer(from_fn(metrics::track_http_metrics))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        );

    let listener = TcpListener::bind(addr).await.context("bind failed")?;
    info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

fn resolve_api_key(flag: Option<String>, env: Option<String>) -> Result<String> {
    let key = flag.or(env).unwrap_or_default();
    if key.trim().is_empty() {
        bail!("no Gemini API key configured: pass --api-key or set GEMINI_API_KEY");
    }
    Ok(key)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = ?err, "failed to install Ctrl+C handler");
    }
}

async fn root() -> &'static str {
    "lyrify-server: POST /api/generate (multipart fields: audio, api_key [optional])"
}

async fn healthz() -> &'static str {
    "ok"
}

async fn generate(
    State(state): State<AppState>,
    multipart: Multipart,
) -> std::result::Result<Json<GenerateResponse>, AppError> {
    let upload = read_upload(multipart).await?;

    let generated = state
        .lyrify
        .generate(&upload.audio, &upload.mime_type, upload.api_key.as_deref())
        .await
        .inspect(|_| metrics::record_generation("ok"))
        .inspect_err(|err| metrics::record_generation(generation_outcome(err)))?;

    Ok(Json(GenerateResponse {
        subtitles: generated.subtitles,
        file_id: generated.file_id,
    }))
}

async fn download(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> std::result::Result<Response, AppError> {
    let subtitles = state.lyrify.fetch(&file_id)?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/srt; charset=utf-8"),
            ),
            (
                header::CONTENT_DISPOSITION,
                HeaderValue::from_static("attachment; filename=\"subtitles.srt\""),
            ),
        ],
        subtitles,
    )
        .into_response())
}

async fn captions_at(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    Query(query): Query<CaptionsQuery>,
) -> std::result::Result<Json<CaptionsResponse>, AppError> {
    let subtitles = state.lyrify.fetch(&file_id)?;
    let parsed = captions::parse(&subtitles);

    let active_lyric = query
        .t
        .and_then(|t| playback::active_caption(&parsed, t))
        .map(|caption| caption.text.clone());

    Ok(Json(CaptionsResponse {
        captions: parsed,
        active_lyric,
    }))
}

fn generation_outcome(err: &lyrify::Error) -> &'static str {
    match err {
        lyrify::Error::MissingAudio => "missing_audio",
        lyrify::Error::PayloadTooLarge { .. } => "payload_too_large",
        lyrify::Error::Generation(_) => "upstream_failure",
        lyrify::Error::Config(_) | lyrify::Error::NotFound | lyrify::Error::Other(_) => "internal",
    }
}

struct Upload {
    audio: Vec<u8>,
    mime_type: String,
    api_key: Option<String>,
}

/// Pull the `audio` (required) and `api_key` (optional) fields out of the multipart
/// form. Unknown fields are ignored.
async fn read_upload(mut multipart: Multipart) -> std::result::Result<Upload, AppError> {
    let mut audio: Option<(Vec<u8>, String)> = None;
    let mut api_key: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(format!("malformed multipart body: {err}")))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("audio") => {
                let mime_type = field
                    .content_type()
                    .unwrap_or("audio/mpeg")
                    .to_owned();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::bad_request(format!("failed to read audio: {err}")))?;
                audio = Some((bytes.to_vec(), mime_type));
            }
            Some("api_key") => {
                let value = field.text().await.map_err(|err| {
                    AppError::bad_request(format!("failed to read api_key: {err}"))
                })?;
                if !value.trim().is_empty() {
                    api_key = Some(value);
                }
            }
            _ => {}
        }
    }

    let (audio, mime_type) = audio.ok_or_else(|| AppError::from(lyrify::Error::MissingAudio))?;

    Ok(Upload {
        audio,
        mime_type,
        api_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_api_key_prefers_the_flag() -> anyhow::Result<()> {
        let key = resolve_api_key(Some("from-flag".into()), Some("from-env".into()))?;
        assert_eq!(key, "from-flag");
        Ok(())
    }

    #[test]
    fn resolve_api_key_falls_back_to_the_environment() -> anyhow::Result<()> {
        let key = resolve_api_key(None, Some("from-env".into()))?;
        assert_eq!(key, "from-env");
        Ok(())
    }

    #[test]
    fn resolve_api_key_rejects_missing_and_blank_keys() {
        assert!(resolve_api_key(None, None).is_err());
        let err = resolve_api_key(Some("   ".into()), None).unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn error_taxonomy_maps_to_status_classes() {
        let cases = [
            (lyrify::Error::MissingAudio, StatusCode::BAD_REQUEST),
            (
                lyrify::Error::PayloadTooLarge { size: 2, limit: 1 },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (lyrify::Error::NotFound, StatusCode::NOT_FOUND),
            (
                lyrify::Error::Generation("nope".into()),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status, expected);
        }
    }
}
