//! Request routing dispatch module
//!
//! Entry point for HTTP request processing. Routing is a pure function of
//! method and path (`resolve`); executing a route touches the store; the
//! transport wrapper (`handle_request`) adds CORS headers and the access log
//! line to whatever comes back.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, SERVER};
use hyper::http::request::Parts;
use hyper::{HeaderMap, Method, Request, Response};

use crate::config::AppState;
use crate::handler::{documents, paths, static_files};
use crate::http;
use crate::logger::{self, AccessLogEntry};

/// Suffix that sends a path to the document API
const JSON_SUFFIX: &str = ".json";

/// What a request resolves to before anything is read or written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// CORS preflight
    Preflight,
    Static { path: String, is_head: bool },
    JsonRead { path: String },
    JsonWrite { path: String },
    NotFound,
    /// Method the server does not implement
    Unsupported,
}

/// Request context encapsulating information needed for request processing
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub if_modified_since: Option<String>,
}

impl RequestContext {
    fn from_parts(parts: &Parts) -> Self {
        Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(ToString::to_string),
            if_modified_since: header_string(&parts.headers, "if-modified-since"),
        }
    }
}

/// Map method and path to a route
///
/// `/` is rewritten to the index document before the `.json` check, so GET
/// and HEAD of `/` behave exactly like a request for `/<index_file>`.
pub fn resolve(method: &Method, path: &str, index_file: &str) -> Route {
    let path = if path == "/" {
        format!("/{index_file}")
    } else {
        path.to_string()
    };

    match *method {
        Method::OPTIONS => Route::Preflight,
        Method::GET if path.ends_with(JSON_SUFFIX) => Route::JsonRead { path },
        Method::GET => Route::Static {
            path,
            is_head: false,
        },
        Method::HEAD => Route::Static {
            path,
            is_head: true,
        },
        Method::POST if path.ends_with(JSON_SUFFIX) => Route::JsonWrite { path },
        Method::POST => Route::NotFound,
        _ => Route::Unsupported,
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let ctx = RequestContext::from_parts(&parts);
    let route = resolve(&parts.method, &ctx.path, &state.config.http.index_file);

    let mut response = match route {
        Route::JsonWrite { path } => match read_body(&parts.headers, body, &state).await {
            Ok(bytes) => write_json(&path, &bytes, &state).await,
            Err(resp) => resp,
        },
        other => execute(other, &ctx, &state).await,
    };

    http::apply_cors_headers(&mut response);
    if let Ok(name) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, name);
    }

    if state.config.logging.access_log {
        log_access(&parts, &ctx, peer_addr, &response, started, &state);
    }
    Ok(response)
}

/// Run every route except `JsonWrite`, which needs the request body
async fn execute(route: Route, ctx: &RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    match route {
        Route::Preflight => http::build_options_response(),
        Route::Static { path, is_head } => static_files::serve(ctx, &path, is_head, state).await,
        Route::JsonRead { path } => read_json(&path, state).await,
        Route::JsonWrite { .. } | Route::NotFound => http::build_404_response(),
        Route::Unsupported => http::build_501_response(ctx.method.as_str()),
    }
}

async fn read_json(path: &str, state: &AppState) -> Response<Full<Bytes>> {
    let result = match paths::storage_path(path, state.config.server.confine_paths) {
        Ok(relative) => documents::read_document(state.store.as_ref(), &relative).await,
        Err(e) => Err(e),
    };

    match result.and_then(documents::DocumentRead::into_body) {
        Ok(body) => {
            logger::log_debug(&format!("Read document {path}"));
            http::build_json_response(body)
        }
        Err(e) => document_error_response(path, &e),
    }
}

async fn write_json(path: &str, body: &[u8], state: &AppState) -> Response<Full<Bytes>> {
    let result = match paths::storage_path(path, state.config.server.confine_paths) {
        Ok(relative) => documents::write_document(state.store.as_ref(), &relative, body).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            logger::log_debug(&format!("Wrote document {path} ({} bytes)", body.len()));
            http::build_json_response(http::response::WRITE_OK_BODY)
        }
        Err(e) => document_error_response(path, &e),
    }
}

fn document_error_response(
    path: &str,
    err: &crate::error::DocumentError,
) -> Response<Full<Bytes>> {
    match err.status() {
        403 => {
            logger::log_warning(&format!("Path traversal attempt blocked: {err}"));
            http::build_403_response()
        }
        _ => {
            logger::log_error(&format!("Document {path}: {err}"));
            http::build_500_response(&err.to_string())
        }
    }
}

/// Collect the request body, enforcing `http.max_body_size`
async fn read_body<B>(
    headers: &HeaderMap,
    body: B,
    state: &AppState,
) -> Result<Bytes, Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let max_body_size = state.config.http.max_body_size;
    if let Some(resp) = check_body_size(headers, max_body_size) {
        return Err(resp);
    }

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<http_body_util::LengthLimitError>() => {
            logger::log_error(&format!(
                "Request body too large (max: {max_body_size} bytes)"
            ));
            Err(http::build_413_response())
        }
        Err(e) => {
            logger::log_error(&format!("Failed to read request body: {e}"));
            Err(http::build_500_response(&e.to_string()))
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = headers.get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            _ => None,
        },
    )
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn log_access(
    parts: &Parts,
    ctx: &RequestContext,
    peer_addr: SocketAddr,
    response: &Response<Full<Bytes>>,
    started: Instant,
    state: &AppState,
) {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        parts.method.to_string(),
        ctx.path.clone(),
    );
    entry.query.clone_from(&ctx.query);
    entry.http_version = match parts.version {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
    entry.referer = header_string(&parts.headers, "referer");
    entry.user_agent = header_string(&parts.headers, "user-agent");
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.config.logging.access_log_format);
}
