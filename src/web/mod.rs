//! Embedded web dashboard.
//!
//! A lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A single-page dashboard: stats, activity chart, skip table, predictions
//! - JSON API endpoints backing each section
//!
//! Launched via `tunedash serve` (default: `http://127.0.0.1:9747`).

mod api;
mod frontend;

use std::io::Cursor;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::api::BackendClient;
use crate::config::schema::TunedashConfig;
use crate::diagnostics::Diagnostics;
use crate::predict::Orchestrator;

pub use api::Reply;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Everything a handler needs. One instance per server, shared by all
/// request threads.
pub struct AppState {
    pub config: TunedashConfig,
    pub client: BackendClient,
    pub orchestrator: Orchestrator<BackendClient>,
    pub diagnostics: Diagnostics,
}

impl AppState {
    pub fn new(config: TunedashConfig, diagnostics: Diagnostics) -> Self {
        let client = BackendClient::from_config(&config.backend);
        let orchestrator = Orchestrator::new(client.clone()).with_diagnostics(diagnostics.clone());
        Self {
            config,
            client,
            orchestrator,
            diagnostics,
        }
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the dashboard server on `addr`.
///
/// Blocks the current thread. Each request is handled on its own thread so
/// a slow backend call never holds up the rest of the page; overlapping
/// prediction submissions are settled by the orchestrator.
pub fn serve(state: AppState, addr: &str, open: bool) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("tunedash dashboard running at http://{addr}");
    println!("Backend: {}", state.client.base_url());
    println!("Press Ctrl+C to stop.\n");

    if open {
        let url = format!("http://{addr}");
        if let Err(e) = open_browser(&url) {
            state.diagnostics.warn("web", &format!("{e:#}"));
        }
    }

    let state = Arc::new(state);
    for request in server.incoming_requests() {
        let state = Arc::clone(&state);
        thread::spawn(move || handle(&state, request));
    }

    Ok(())
}

fn handle(state: &AppState, mut request: Request) {
    let method = request.method().clone();
    let url = request.url().to_string();

    // Read body up-front for methods that carry one
    let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
        let mut buf = String::new();
        let _ = request.as_reader().read_to_string(&mut buf);
        Some(buf)
    } else {
        None
    };

    let resp = match dispatch(state, &method, &url, body.as_deref()) {
        Ok(resp) => resp,
        Err(e) => {
            state
                .diagnostics
                .error("web", &format!("{method} {url} failed: {e:#}"));
            Reply::error(500, &format!("{e:#}")).into_response()
        }
    };
    let _ = request.respond(resp);

    // Brief access log
    println!(
        "{} {} {}",
        method,
        url,
        chrono::Local::now().format("%H:%M:%S")
    );
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
fn dispatch(
    state: &AppState,
    method: &Method,
    url: &str,
    body: Option<&str>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(url);

    let reply = match (method, path) {
        // Frontend
        (&Method::Get, "/") | (&Method::Get, "/index.html") => return Ok(serve_frontend()),

        // API: display
        (&Method::Get, "/api/overview") => api::get_overview(state),
        (&Method::Get, "/api/activity") => api::get_activity(state),
        (&Method::Get, "/api/skips") => api::get_skips(state),

        // API: predictions
        (&Method::Post, "/api/predict") => api::post_predict(state, body.unwrap_or("")),
        (&Method::Get, "/api/predict/latest") => api::get_predict_latest(state),

        // API: health
        (&Method::Get, "/api/health") => api::get_health(state),

        _ => Ok(Reply::error(404, "not found")),
    }
    .context("handler failed")?;

    Ok(reply.into_response())
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn serve_frontend() -> Response<Cursor<Vec<u8>>> {
    let html = frontend::INDEX_HTML;
    Response::from_data(html.as_bytes().to_vec())
        .with_header(content_type_html())
        .with_status_code(StatusCode(200))
}

/// JSON content type header.
pub(crate) fn content_type_json() -> Header {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8").unwrap()
}

/// HTML content type header.
fn content_type_html() -> Header {
    Header::from_bytes("Content-Type", "text/html; charset=utf-8").unwrap()
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}
