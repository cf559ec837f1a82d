use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use notify::{Event, RecursiveMode, Watcher};
use tower_livereload::LiveReloadLayer;

use crate::bundle::{
    self, AssetSource, DirAssets, ARCHIVE_NAME, PLAYER_BUNDLE_PATH, PLAYER_HTML_PATH,
};

mod page;

struct PreviewState {
    scene_path: PathBuf,
    assets: DirAssets,
}

/// Serve a live preview of the player bundle for a saved scene, reloading
/// the page whenever the scene file or the player assets change.
pub async fn run_preview_server(
    scene_path: PathBuf,
    assets_dir: PathBuf,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(PreviewState {
        scene_path: scene_path.clone(),
        assets: DirAssets::new(assets_dir.clone()),
    });

    let livereload = LiveReloadLayer::new();
    let reloader = livereload.reloader();

    // File watcher
    let mut watcher = notify::recommended_watcher(move |res: Result<Event, _>| {
        if let Ok(event) = res {
            if event.kind.is_modify() || event.kind.is_create() {
                log::debug!("change detected: {:?}", event.paths);
                reloader.reload();
            }
        }
    })?;
    let scene_dir = scene_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    watcher.watch(scene_dir, RecursiveMode::NonRecursive)?;
    watcher.watch(&assets_dir, RecursiveMode::Recursive)?;

    let app = Router::new()
        .route("/", get(serve_player_page))
        .route("/index.html", get(serve_player_page))
        .route("/player.bundle.js", get(serve_player_bundle))
        .route("/scene.js", get(serve_scene_script))
        .route("/export.zip", get(serve_archive))
        .route("/export", post(serve_export))
        .layer(livereload)
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    eprintln!("jsgen player preview");
    eprintln!("  scene:   {}", scene_path.display());
    eprintln!("  assets:  {}", assets_dir.display());
    eprintln!("  preview: http://localhost:{port}/");
    eprintln!("  bundle:  http://localhost:{port}/{ARCHIVE_NAME}");
    eprintln!("  watching for changes...");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    // Keep watcher alive
    drop(watcher);
    Ok(())
}

async fn read_scene(state: &PreviewState) -> Result<String, String> {
    tokio::fs::read_to_string(&state.scene_path)
        .await
        .map_err(|e| format!("cannot read {}: {e}", state.scene_path.display()))
}

fn unprocessable(message: String) -> Response {
    log::error!("{message}");
    (StatusCode::UNPROCESSABLE_ENTITY, message).into_response()
}

// ── Route handlers ────────────────────────────────────────────────────

/// Serve the player's HTML shell.
async fn serve_player_page(State(state): State<Arc<PreviewState>>) -> Html<String> {
    match state.assets.fetch(PLAYER_HTML_PATH).await {
        Ok(bytes) => Html(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => Html(page::build_error_page(&state.scene_path, &e.to_string())),
    }
}

async fn serve_player_bundle(State(state): State<Arc<PreviewState>>) -> Response {
    match state.assets.fetch(PLAYER_BUNDLE_PATH).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "text/javascript")], bytes).into_response(),
        Err(e) => (StatusCode::NOT_FOUND, e.to_string()).into_response(),
    }
}

/// Serve `scene.js` generated from the scene file.
async fn serve_scene_script(State(state): State<Arc<PreviewState>>) -> Response {
    let text = match read_scene(&state).await {
        Ok(t) => t,
        Err(e) => return unprocessable(e),
    };
    match crate::normalize_scene(&text) {
        Ok(json) => (
            [(header::CONTENT_TYPE, "text/javascript")],
            bundle::scene_script(&json),
        )
            .into_response(),
        Err(e) => {
            // Keep the page alive and report in the browser console.
            let escaped = e.to_string().replace('\\', "\\\\").replace('\'', "\\'");
            (
                [(header::CONTENT_TYPE, "text/javascript")],
                format!("console.error('jsgen: {escaped}');"),
            )
                .into_response()
        }
    }
}

/// Build and download `export.zip` for the scene file.
async fn serve_archive(State(state): State<Arc<PreviewState>>) -> Response {
    let text = match read_scene(&state).await {
        Ok(t) => t,
        Err(e) => return unprocessable(e),
    };
    match crate::bundle_scene(&text, &state.assets).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "application/zip".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{ARCHIVE_NAME}\""),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => unprocessable(format!("cannot build {ARCHIVE_NAME}: {e}")),
    }
}

// ── POST /export: export a posted host state ──────────────────────────

/// Export a host state against the session loaded from the scene file.
async fn serve_export(State(state): State<Arc<PreviewState>>, body: String) -> Response {
    let text = match read_scene(&state).await {
        Ok(t) => t,
        Err(e) => return unprocessable(e),
    };
    let exported = crate::load_scene(&text)
        .and_then(|(mut controller, _)| controller.export_state(&body));
    match exported {
        Ok(json) => ([(header::CONTENT_TYPE, "application/json")], json).into_response(),
        Err(e) => unprocessable(format!("export failed: {e}")),
    }
}
