//! Static file serving module
//!
//! Any path that is not routed to the document API ends up here. Files are
//! looked up through the same store as documents.

use std::path::Path;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use percent_encoding::percent_decode_str;

use crate::config::AppState;
use crate::handler::paths;
use crate::handler::router::RequestContext;
use crate::http::{self, date, mime};
use crate::logger;
use crate::storage::{DocumentStore, EntryKind};

/// Serve the file or directory index at `path`
pub async fn serve(
    ctx: &RequestContext,
    path: &str,
    is_head: bool,
    state: &AppState,
) -> Response<Full<Bytes>> {
    // Static paths are percent-decoded before lookup; document paths are not
    let decoded = match percent_decode_str(path).decode_utf8() {
        Ok(decoded) => decoded,
        Err(e) => {
            logger::log_warning(&format!("Undecodable request path {path}: {e}"));
            return http::build_404_response();
        }
    };

    let relative = match paths::storage_path(&decoded, state.config.server.confine_paths) {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!("Path traversal attempt blocked: {e}"));
            return http::build_403_response();
        }
    };

    let store = state.store.as_ref();
    let entry = match store.stat(&relative).await {
        Ok(Some(entry)) => entry,
        Ok(None) => return http::build_404_response(),
        Err(e) => {
            logger::log_warning(&format!("Cannot stat {path}: {e}"));
            return http::build_404_response();
        }
    };

    match entry.kind {
        EntryKind::Directory if !decoded.ends_with('/') => {
            http::build_redirect_response(&directory_location(path, ctx.query.as_deref()))
        }
        EntryKind::Directory => {
            let index = relative.join(&state.config.http.index_file);
            match store.stat(&index).await {
                Ok(Some(e)) if !e.is_dir() => {
                    serve_file(store, &index, e.modified, ctx, is_head).await
                }
                _ => http::build_404_response(),
            }
        }
        // "file/" names a directory that is not there
        EntryKind::File if decoded.ends_with('/') => http::build_404_response(),
        EntryKind::File => serve_file(store, &relative, entry.modified, ctx, is_head).await,
    }
}

async fn serve_file(
    store: &dyn DocumentStore,
    relative: &Path,
    modified: Option<chrono::DateTime<chrono::Utc>>,
    ctx: &RequestContext,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let last_modified = modified.map(date::format_http_date);

    if let (Some(stamp), Some(time)) = (&last_modified, modified) {
        if date::is_not_modified(ctx.if_modified_since.as_deref(), time) {
            return http::build_304_response(stamp);
        }
    }

    match store.read(relative).await {
        Ok(Some(data)) => http::build_file_response(
            data,
            mime::content_type_for(relative),
            last_modified.as_deref(),
            is_head,
        ),
        Ok(None) => http::build_404_response(),
        Err(e) => {
            logger::log_warning(&format!("Cannot read {}: {e}", relative.display()));
            http::build_404_response()
        }
    }
}

/// `Location` for a directory requested without its trailing slash
fn directory_location(path: &str, query: Option<&str>) -> String {
    match query {
        Some(q) => format!("{path}/?{q}"),
        None => format!("{path}/"),
    }
}
