//! Index Viewer - browse and search a scraped document index as a tree.

mod config;
mod html;
mod index;
mod loader;
mod preview;
mod schema;
mod tree;
mod validate;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, Json},
    routing::get,
    Router,
};
use config::ViewerConfig;
use index::ViewerIndex;
use preview::Selection;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tree::{RenderOptions, VisibleTree};
use validate::ValidationReport;

/// Outcome of the single startup load.
#[derive(Debug)]
enum IndexState {
    Ready(ViewerIndex),
    Failed(String),
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    index: Arc<IndexState>,
    render: RenderOptions,
    preview_base: Arc<str>,
    content_dir: Arc<PathBuf>,
}

impl AppState {
    fn ready(&self) -> Result<&ViewerIndex, (StatusCode, String)> {
        match self.index.as_ref() {
            IndexState::Ready(index) => Ok(index),
            IndexState::Failed(message) => {
                Err((StatusCode::SERVICE_UNAVAILABLE, message.clone()))
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "index_viewer=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ViewerConfig::from_env()?;
    info!(
        "Index source: {}, content dir: {:?}, filter mode: {:?}",
        config.index_source, config.content_dir, config.render.mode
    );

    // One load per process; a failure is shown in place of the tree, not retried
    let source = loader::source_for(&config.index_source, reqwest::Client::new());
    let index = match loader::load(source.as_ref()).await {
        Ok(nodes) => {
            let index = ViewerIndex::new(nodes);
            info!(
                "Index ready: {} nodes, {} roots",
                index.nodes().len(),
                index.roots().len()
            );
            report_missing_content(&index, &config);
            IndexState::Ready(index)
        }
        Err(e) => {
            error!("Index load failed: {}", e);
            IndexState::Failed(format!("Failed to load document index: {}", e))
        }
    };

    let state = AppState {
        index: Arc::new(index),
        render: config.render,
        preview_base: Arc::from(config.preview_base.as_str()),
        content_dir: Arc::new(config.content_dir.clone()),
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server listening on http://{}", config.bind_addr);
    axum::serve(listener, app(state)).await?;

    Ok(())
}

/// Build the router over the loaded index.
fn app(state: AppState) -> Router {
    let content = ServeDir::new(state.content_dir.as_ref());
    Router::new()
        .route("/health", get(health))
        .route("/roots", get(get_roots))
        .route("/tree", get(get_tree))
        .route("/tree.html", get(get_tree_html))
        .route("/preview", get(get_preview))
        .route("/validate", get(get_validation))
        .nest_service("/content", content)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Log pages whose saved HTML is missing and optionally write them out as seeds.
fn report_missing_content(index: &ViewerIndex, config: &ViewerConfig) {
    if !config.content_dir.is_dir() {
        warn!(
            "Content dir {:?} not found, previews will not resolve",
            config.content_dir
        );
        return;
    }

    let report = validate::validate_content(index.nodes(), &config.content_dir);
    info!(
        "Content check: {} pages indexed, {} missing",
        report.total,
        report.missing.len()
    );

    if let Some(path) = &config.missing_seeds_file {
        if !report.missing.is_empty() {
            // The report is advisory; the viewer still serves the tree
            if let Err(e) = validate::write_missing_seeds(&report, path) {
                error!("{:#}", e);
            }
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> &'static str {
    "ok"
}

#[derive(serde::Deserialize)]
struct TreeQuery {
    #[serde(default)]
    q: String,
}

async fn get_roots(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    Ok(Json(state.ready()?.roots().to_vec()))
}

/// Visible tree for the search text in `q`.
async fn get_tree(
    State(state): State<AppState>,
    Query(query): Query<TreeQuery>,
) -> Result<Json<VisibleTree>, (StatusCode, String)> {
    let index = state.ready()?;
    Ok(Json(index.render(&query.q, &state.render)))
}

/// Same as `/tree`, rendered as rows for the tree pane.
async fn get_tree_html(
    State(state): State<AppState>,
    Query(query): Query<TreeQuery>,
) -> (StatusCode, Html<String>) {
    match state.ready() {
        Ok(index) => (
            StatusCode::OK,
            Html(html::render_tree(&index.render(&query.q, &state.render))),
        ),
        Err((status, message)) => (status, Html(html::render_error(&message))),
    }
}

#[derive(serde::Deserialize)]
struct PreviewQuery {
    url: String,
}

async fn get_preview(
    State(state): State<AppState>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<Selection>, (StatusCode, String)> {
    state
        .ready()?
        .select(&query.url, &state.preview_base)
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Unknown node: {}", query.url)))
}

async fn get_validation(
    State(state): State<AppState>,
) -> Result<Json<ValidationReport>, (StatusCode, String)> {
    // One stat per node; keep it off the async workers
    let report = tokio::task::spawn_blocking(move || {
        state
            .ready()
            .map(|index| validate::validate_content(index.nodes(), &state.content_dir))
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Validation failed: {}", e)))??;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    const ALPHA_BETA: &str = r#"{
        "nodes": {
            "http://h/a": {"title": "Alpha", "local_path": "a.html", "children": ["http://h/b"]},
            "http://h/b": {"title": "Beta", "children": []}
        }
    }"#;

    fn state_with(index: IndexState) -> AppState {
        AppState {
            index: Arc::new(index),
            render: RenderOptions::default(),
            preview_base: Arc::from("/content"),
            content_dir: Arc::new(PathBuf::from("db")),
        }
    }

    fn ready_state() -> AppState {
        let nodes = loader::parse_index(ALPHA_BETA).unwrap();
        state_with(IndexState::Ready(ViewerIndex::new(nodes)))
    }

    async fn serve(state: AppState) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app(state)).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_tree_html_rows() {
        let addr = serve(ready_state()).await;
        let response = reqwest::get(format!("http://{}/tree.html?q=beta", addr))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);

        let body = response.text().await.unwrap();
        assert!(body.contains(r#"data-url="http://h/a""#));
        assert!(body.contains(r#"class="tree-row match" data-url="http://h/b""#));
        assert!(body.find("Alpha").unwrap() < body.find("Beta").unwrap());
    }

    #[tokio::test]
    async fn test_failed_load_shows_inline_error() {
        let state = state_with(IndexState::Failed(
            "Failed to load document index: Malformed index JSON".to_string(),
        ));
        let addr = serve(state).await;

        let html = reqwest::get(format!("http://{}/tree.html?q=", addr))
            .await
            .unwrap();
        assert_eq!(html.status().as_u16(), 503);
        let body = html.text().await.unwrap();
        assert!(body.starts_with(r#"<div class="alert alert-danger" role="alert">"#));
        assert!(body.contains("Malformed index JSON"));

        let json = reqwest::get(format!("http://{}/tree", addr)).await.unwrap();
        assert_eq!(json.status().as_u16(), 503);

        let validation = reqwest::get(format!("http://{}/validate", addr))
            .await
            .unwrap();
        assert_eq!(validation.status().as_u16(), 503);
    }

    #[tokio::test]
    async fn test_preview_lookup() {
        let addr = serve(ready_state()).await;
        let client = reqwest::Client::new();

        let found: serde_json::Value = client
            .get(format!("http://{}/preview", addr))
            .query(&[("url", "http://h/a")])
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(found["preview"], "/content/a.html");
        assert_eq!(found["breadcrumb"], "Alpha — http://h/a");

        let no_content: serde_json::Value = client
            .get(format!("http://{}/preview", addr))
            .query(&[("url", "http://h/b")])
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(no_content["preview"].is_null());

        let missing = client
            .get(format!("http://{}/preview", addr))
            .query(&[("url", "missing")])
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status().as_u16(), 404);
    }

    #[tokio::test]
    async fn test_roots_and_validation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.html"), "<html></html>").unwrap();
        let mut state = ready_state();
        state.content_dir = Arc::new(dir.path().to_path_buf());
        let addr = serve(state).await;

        let roots: Vec<String> = reqwest::get(format!("http://{}/roots", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(roots, vec!["http://h/a"]);

        let report: serde_json::Value = reqwest::get(format!("http://{}/validate", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(report["total"], 2);
        assert_eq!(report["missing"], serde_json::json!(["http://h/b"]));
    }

    #[test]
    fn test_seed_write_failure_does_not_abort() {
        let dir = tempfile::tempdir().unwrap();
        let nodes = loader::parse_index(ALPHA_BETA).unwrap();
        let index = ViewerIndex::new(nodes);
        let config = ViewerConfig {
            content_dir: dir.path().to_path_buf(),
            missing_seeds_file: Some(dir.path().join("no_such_dir").join("seeds.txt")),
            ..Default::default()
        };

        report_missing_content(&index, &config);
        assert!(!dir.path().join("no_such_dir").exists());
    }
}
