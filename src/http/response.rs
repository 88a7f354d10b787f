//! HTTP response building module
//!
//! Provides builders for each status the server emits. CORS headers are not
//! added here; the router attaches them to every response in one place.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

/// Body of a successful document write
pub const WRITE_OK_BODY: &str = r#"{"success": true}"#;

/// Body returned for a document that has never been written
pub const EMPTY_DOCUMENT_BODY: &str = "[]";

/// Build 200 response for a preflight request
pub fn build_options_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(200)
        .header("Content-Length", 0)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 200 `application/json` response
pub fn build_json_response(body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let body = body.into();
    Response::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .header("Content-Length", body.len())
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("JSON", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 200 response carrying file contents
pub fn build_file_response(
    data: Vec<u8>,
    content_type: &str,
    last_modified: Option<&str>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(data)
    };

    let mut builder = Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length);
    if let Some(stamp) = last_modified {
        builder = builder.header("Last-Modified", stamp);
    }

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error("200", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build 301 redirect response
pub fn build_redirect_response(location: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(301)
        .header("Location", location)
        .header("Content-Length", 0)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("301", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 304 Not Modified response
pub fn build_304_response(last_modified: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(304)
        .header("Last-Modified", last_modified)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 403 Forbidden response
pub fn build_403_response() -> Response<Full<Bytes>> {
    plain_text(403, "403 Forbidden".to_string())
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    plain_text(404, "404 Not Found".to_string())
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    plain_text(413, "413 Payload Too Large".to_string())
}

/// Build 500 response echoing the underlying failure
pub fn build_500_response(message: &str) -> Response<Full<Bytes>> {
    plain_text(500, format!("500 Internal Server Error: {message}"))
}

/// Build 501 Not Implemented response for unsupported methods
pub fn build_501_response(method: &str) -> Response<Full<Bytes>> {
    plain_text(501, format!("501 Unsupported method ({method})"))
}

fn plain_text(status: u16, text: String) -> Response<Full<Bytes>> {
    let fallback = text.clone();
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Length", text.len())
        .body(Full::new(Bytes::from(text)))
        .unwrap_or_else(|e| {
            log_build_error(&status.to_string(), &e);
            Response::new(Full::new(Bytes::from(fallback)))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
