use std::fs;

use axum::{
    Router,
    http::{HeaderValue, header},
    routing::get,
};
use tokio::net::TcpListener;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::info;

use super::{
    services::{
        config_json, health, index, list_images, list_thumbnails, serve_image, serve_thumbnail,
    },
    state::AppState,
};
use crate::config::Config;
use crate::manifest::V2_API_PREFIX;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Builds the application router.
///
/// Asset routes are mounted at the root and again below the v2 prefix, so
/// both client versions find them. Every response allows any origin because
/// the client loads the manifest from its own application shell.
pub fn router(state: AppState) -> Router {
    let assets = Router::new()
        .route("/config.json", get(config_json))
        .route("/images", get(list_images))
        .route("/images/{*path}", get(serve_image))
        .route("/thumbnails", get(list_thumbnails))
        .route("/thumbnails/{*path}", get(serve_thumbnail));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .merge(assets.clone())
        .nest(V2_API_PREFIX, assets)
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(TraceLayer::new_for_http())
}

pub async fn run(config: Config) -> Result<(), AnyError> {
    for dir in [&config.image_dir, &config.thumbnail_dir] {
        fs::create_dir_all(dir)
            .map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
    }

    let address = config.bind_addr();
    info!(
        images = %config.image_dir.display(),
        thumbnails = %config.thumbnail_dir.display(),
        teams_version = u8::from(config.teams_version),
        "Serving background images"
    );

    let app = router(AppState::new(config));

    let listener = TcpListener::bind(address).await?;
    info!(%address, "teamster listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())
            .expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
