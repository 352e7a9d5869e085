use std::fs::Metadata;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use axum::{
    Json,
    body::Body,
    extract::{Path, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use super::{
    models::HealthResponse,
    state::AppState,
};
use crate::api::error::ApiError;
use crate::resolver::{DirectoryEntry, PathResolver, ResolveError};

const IMAGES_MOUNT: &str = "/images";
const THUMBNAILS_MOUNT: &str = "/thumbnails";

/// Landing page (GET /)
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let base_url = format!("http://localhost:{}", state.config.port);
    Html(format!(
        "<h1>teamster</h1>\n\
         <p>Set <code>customBGServiceBaseUrl</code> to <code>{base_url}</code> in your Teams config.</p>\n\
         <ul>\n\
         <li><a href=\"/config.json\">config.json</a></li>\n\
         <li><a href=\"{IMAGES_MOUNT}\">images</a></li>\n\
         <li><a href=\"{THUMBNAILS_MOUNT}\">thumbnails</a></li>\n\
         </ul>"
    ))
}

/// Manifest endpoint (GET /config.json)
///
/// Walks the image directory, generating missing thumbnails on the way, and
/// returns the manifest in the configured schema. Any thumbnail failure fails
/// the whole request; no partial manifest is sent.
pub async fn config_json(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let catalog = Arc::clone(&state.catalog);
    let result = tokio::task::spawn_blocking(move || catalog.manifest())
        .await
        .map_err(|e| ApiError::Internal(format!("Manifest task failed: {}", e)))?;

    let manifest = result.inspect_err(|err| {
        state.metrics.manifest_failed();
        tracing::error!(error = %err, "Failed to build manifest");
    })?;

    state.metrics.manifest_served();
    tracing::info!(
        entries = manifest.len(),
        teams_version = u8::from(state.catalog.version()),
        "Serving manifest"
    );

    Ok(Json(manifest))
}

/// Image directory listing (GET /images)
pub async fn list_images(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    list(&state.images, IMAGES_MOUNT, "").await
}

/// Image file or subdirectory (GET /images/{*path})
pub async fn serve_image(
    State(state): State<AppState>,
    Path(path): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    serve(&state, &state.images, IMAGES_MOUNT, &path, request).await
}

/// Thumbnail directory listing (GET /thumbnails)
pub async fn list_thumbnails(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    list(&state.thumbnails, THUMBNAILS_MOUNT, "").await
}

/// Thumbnail file or subdirectory (GET /thumbnails/{*path})
pub async fn serve_thumbnail(
    State(state): State<AppState>,
    Path(path): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    serve(&state, &state.thumbnails, THUMBNAILS_MOUNT, &path, request).await
}

/// Health check endpoint (GET /health)
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        teams_version: u8::from(state.config.teams_version),
        thumbnails_generated: state.catalog.thumbnails().generated(),
        metrics: state.metrics.snapshot(),
    })
}

enum Target {
    Listing(Vec<DirectoryEntry>),
    File {
        path: PathBuf,
        etag: Option<HeaderValue>,
    },
}

/// Streams the file at `path`, or lists it when it is a directory.
///
/// `ServeFile` takes care of content type, `Last-Modified` and
/// `If-Modified-Since`; the `ETag` and `If-None-Match` handling is done here.
async fn serve(
    state: &AppState,
    resolver: &Arc<PathResolver>,
    mount: &str,
    path: &str,
    request: Request,
) -> Result<Response, ApiError> {
    let resolver = Arc::clone(resolver);
    let request_path = path.to_string();
    let target = blocking(move || {
        let resolved = resolver.resolve(&request_path)?;
        if resolved.is_dir() {
            return Ok(Target::Listing(resolver.list(&request_path)?));
        }
        let metadata = std::fs::metadata(&resolved).map_err(ResolveError::from)?;
        Ok(Target::File {
            etag: entity_tag(&metadata),
            path: resolved,
        })
    })
    .await?;

    let (path, etag) = match target {
        Target::Listing(entries) => {
            return Ok(Html(render_listing(mount, &entries)).into_response());
        }
        Target::File { path, etag } => (path, etag),
    };

    if let Some(etag) = etag.as_ref().filter(|etag| etag_matches(request.headers(), etag)) {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag.clone())]).into_response());
    }

    let mut response = ServeFile::new(&path)
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});
    state.metrics.file_served();

    let status = response.status();
    if let Some(etag) = etag.filter(|_| status.is_success() || status == StatusCode::NOT_MODIFIED) {
        response.headers_mut().insert(header::ETAG, etag);
    }

    Ok(response.map(Body::new))
}

async fn list(resolver: &Arc<PathResolver>, mount: &str, path: &str) -> Result<Html<String>, ApiError> {
    let resolver = Arc::clone(resolver);
    let request_path = path.to_string();
    let entries = blocking(move || Ok(resolver.list(&request_path)?)).await?;
    Ok(Html(render_listing(mount, &entries)))
}

/// Runs filesystem work off the async executor.
async fn blocking<T, F>(task: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ApiError::Internal(format!("Filesystem task failed: {}", e)))?
}

/// Strong validator built from the file length and modification time.
fn entity_tag(metadata: &Metadata) -> Option<HeaderValue> {
    let modified = metadata.modified().ok()?.duration_since(UNIX_EPOCH).ok()?;
    let tag = format!(
        "\"{:x}-{:x}{:08x}\"",
        metadata.len(),
        modified.as_secs(),
        modified.subsec_nanos()
    );
    HeaderValue::from_str(&tag).ok()
}

/// Weak comparison against every tag listed in `If-None-Match`.
fn etag_matches(headers: &HeaderMap, etag: &HeaderValue) -> bool {
    let Ok(etag) = etag.to_str() else {
        return false;
    };
    headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .any(|candidate| candidate == "*" || candidate.trim_start_matches("W/") == etag)
}

fn render_listing(mount: &str, entries: &[DirectoryEntry]) -> String {
    let items: Vec<String> = entries
        .iter()
        .map(|entry| {
            let suffix = if entry.is_dir { "/" } else { "" };
            format!(
                "<li><a href=\"{mount}/{}\">{}{suffix}</a></li>",
                escape_html(&entry.path),
                escape_html(&entry.name)
            )
        })
        .collect();
    format!("<ul>{}</ul>", items.join("\n"))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
