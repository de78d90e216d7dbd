//! Static file serving module
//!
//! Resolves request paths against the served root, infers MIME types,
//! and builds responses with `ETag` and Range support. The router makes
//! the fallback decision before any request reaches this layer.

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, range::ParsedRange};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::Path;
use tokio::fs;

/// Serve a static resource resolved from the request path.
pub async fn serve(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    match load(&state.served_root, &state.config.site.index, ctx.path).await {
        Some((content, content_type)) => build_file_response(&content, content_type, ctx),
        None => http::build_404_response(),
    }
}

/// Serve the entry document, the stand-in for every unresolved path.
pub async fn serve_entry_document(
    ctx: &RequestContext<'_>,
    state: &AppState,
) -> Response<Full<Bytes>> {
    match fs::read(&state.entry_document).await {
        Ok(content) => {
            let content_type = mime::get_content_type(
                state.entry_document.extension().and_then(|e| e.to_str()),
            );
            build_file_response(&content, content_type, ctx)
        }
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read entry document '{}': {e}",
                state.entry_document.display()
            ));
            http::build_404_response()
        }
    }
}

/// Strip the leading slash and drop empty, `.` and `..` segments.
pub fn sanitize_request_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .collect::<Vec<_>>()
        .join("/")
}

/// Resolve and read a file under the served root.
///
/// Directory paths resolve to the index document inside them. Returns
/// None when nothing readable resolves there, or when the resolved path
/// escapes the served root.
async fn load(root: &Path, index: &str, path: &str) -> Option<(Vec<u8>, &'static str)> {
    let relative = sanitize_request_path(path);
    let mut file_path = root.join(&relative);

    let root_canonical = match root.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Served root not found or inaccessible '{}': {e}",
                root.display()
            ));
            return None;
        }
    };

    // Directory paths get the index document appended
    if file_path.is_dir() {
        file_path = file_path.join(index);
    }

    // Unresolvable paths are the common 404 case, not worth logging
    let Ok(file_path_canonical) = file_path.canonicalize() else {
        return None;
    };
    if !file_path_canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path escape blocked: {} -> {}",
            path,
            file_path_canonical.display()
        ));
        return None;
    }
    if file_path_canonical.is_dir() {
        // Directory without an index document
        return None;
    }

    let content = match fs::read(&file_path_canonical).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                file_path_canonical.display()
            ));
            return None;
        }
    };

    let content_type =
        mime::get_content_type(file_path_canonical.extension().and_then(|e| e.to_str()));

    Some((content, content_type))
}

/// Build a file response with `ETag` and Range support.
fn build_file_response(
    data: &[u8],
    content_type: &'static str,
    ctx: &RequestContext<'_>,
) -> Response<Full<Bytes>> {
    let etag = cache::generate_etag(data);
    let total_size = data.len();

    // Check if client has a current cached copy
    if cache::check_etag_match(ctx.if_none_match.as_deref(), &etag) {
        return http::build_304_response(&etag);
    }

    match http::parse_range_header(ctx.range_header.as_deref(), total_size) {
        ParsedRange::Partial(range) => {
            let body = if ctx.is_head {
                Bytes::new()
            } else {
                Bytes::from(data[range.start..=range.end].to_vec())
            };
            http::response::build_partial_response(
                body,
                content_type,
                &etag,
                range,
                total_size,
                ctx.is_head,
            )
        }
        ParsedRange::Unsatisfiable => http::build_416_response(total_size),
        ParsedRange::Full => {
            let body = if ctx.is_head {
                Bytes::new()
            } else {
                Bytes::from(data.to_owned())
            };
            http::response::build_cached_response(body, content_type, &etag, ctx.is_head)
        }
    }
}
