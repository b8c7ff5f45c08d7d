use std::io::Cursor;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::state::SharedContext;
use crate::handlers;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

pub fn html_response(body: String) -> Response<Cursor<Vec<u8>>> {
    Response::from_data(body.into_bytes())
        .with_status_code(StatusCode(200))
        .with_header_opt(header("Content-Type", "text/html; charset=utf-8"))
}

pub fn redirect(location: &str) -> Response<Cursor<Vec<u8>>> {
    Response::from_data(Vec::new())
        .with_status_code(StatusCode(303))
        .with_header_opt(header("Location", location))
}

/// Serves the current image. Never cached: the URL stays the same across
/// uploads and captures.
pub fn image_response(bytes: Vec<u8>, mime: &str) -> Response<Cursor<Vec<u8>>> {
    Response::from_data(bytes)
        .with_status_code(StatusCode(200))
        .with_header_opt(header("Content-Type", mime))
        .with_header_opt(header("Cache-Control", "no-store"))
}

pub fn not_found() -> Response<Cursor<Vec<u8>>> {
    Response::from_data(b"404 Not Found".to_vec())
        .with_status_code(StatusCode(404))
        .with_header_opt(header("Content-Type", "text/plain"))
}

trait WithHeaderOpt {
    fn with_header_opt(self, header: Option<Header>) -> Self;
}

impl WithHeaderOpt for Response<Cursor<Vec<u8>>> {
    fn with_header_opt(self, header: Option<Header>) -> Self {
        match header {
            Some(h) => self.with_header(h),
            None => self,
        }
    }
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Dispatches incoming requests to the appropriate handler.
///
/// Handlers receive a `&mut Request` so that the dispatcher retains ownership
/// and can call `request.respond(response)` at the end.
pub fn dispatch(mut request: Request, ctx: SharedContext) {
    let method = request.method().clone();
    let url    = request.url().to_owned();
    let path   = url.split('?').next().unwrap_or("").to_owned();

    log::debug!("{} {}", method, path);

    let response = match (method, path.as_str()) {
        // ── Page ─────────────────────────────────────────────────────────
        (Method::Get, "/")      => handlers::home::handle_get(&ctx),
        (Method::Get, "/image") => handlers::home::handle_image(&ctx),

        // ── Acquisition ──────────────────────────────────────────────────
        (Method::Post, "/upload")         => handlers::upload::handle_upload(&mut request, &ctx),
        (Method::Post, "/camera/start")   => handlers::camera::handle_start(&ctx),
        (Method::Post, "/camera/capture") => handlers::camera::handle_capture(&ctx),
        (Method::Post, "/camera/stop")    => handlers::camera::handle_stop(&ctx),

        // ── Prediction ───────────────────────────────────────────────────
        (Method::Post, "/predict") => handlers::predict::handle_predict(&mut request, &ctx),

        // ── 404 ──────────────────────────────────────────────────────────
        _ => not_found(),
    };

    if let Err(e) = request.respond(response) {
        log::warn!("failed to send response: {}", e);
    }
}
