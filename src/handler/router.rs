//! Request routing dispatch module
//!
//! Entry point for HTTP request processing. Implements the single-page-
//! application fallback rule: the root path and any path that does not
//! open under the served root are answered with the entry document;
//! every other request is delegated to the static file layer.

use crate::config::AppState;
use crate::handler::static_files;
use crate::http;
use crate::logger;
use http_body_util::Full;
use hyper::body::{Body as _, Bytes, Incoming};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub range_header: Option<String>,
}

/// Where a request goes after the fallback decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    /// Serve the entry document (root path or unresolved path)
    EntryDocument,
    /// Delegate to the static file layer
    StaticFiles,
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<Incoming>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();

    let method = req.method().clone();
    let uri = req.uri().clone();
    let http_version = version_label(req.version());
    let referer = header_string(&req, "referer");
    let user_agent = header_string(&req, "user-agent");

    let ctx = RequestContext {
        path: uri.path(),
        is_head: method == Method::HEAD,
        if_none_match: header_string(&req, "if-none-match"),
        range_header: header_string(&req, "range"),
    };

    let response = match check_http_method(&method, state.config.http.enable_cors) {
        Some(resp) => resp,
        None => match check_body_size(&req, state.config.http.max_body_size) {
            Some(resp) => resp,
            None => route_request(&ctx, &state).await,
        },
    };

    if state.config.logging.access_log {
        let mut entry = logger::AccessLogEntry::new(
            peer_addr.ip().to_string(),
            method.to_string(),
            uri.path().to_string(),
        );
        entry.query = uri.query().map(ToString::to_string);
        entry.http_version = http_version.to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes =
            usize::try_from(response.body().size_hint().exact().unwrap_or(0)).unwrap_or(usize::MAX);
        entry.referer = referer;
        entry.user_agent = user_agent;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Dispatch a request according to the fallback decision
async fn route_request(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    match route_decision(&state.served_root, ctx.path).await {
        RouteTarget::EntryDocument => static_files::serve_entry_document(ctx, state).await,
        RouteTarget::StaticFiles => static_files::serve(ctx, state).await,
    }
}

/// Decide between the entry document and static delegation.
///
/// The root path always takes the entry document, without probing the
/// filesystem. Any other path is probed under the served root: if it
/// opens (file or directory alike) the request is delegated, otherwise
/// the entry document stands in for it.
pub async fn route_decision(root: &Path, path: &str) -> RouteTarget {
    if path == "/" {
        return RouteTarget::EntryDocument;
    }
    if probe_path(root, path).await {
        RouteTarget::StaticFiles
    } else {
        RouteTarget::EntryDocument
    }
}

/// Existence probe: attempt to open the candidate path.
///
/// The handle is dropped right away; only the open result matters.
/// Every failure kind counts as "does not exist" for routing purposes,
/// since unresolved paths are assumed to be client-side routes.
async fn probe_path(root: &Path, path: &str) -> bool {
    let candidate = root.join(static_files::sanitize_request_path(path));
    match fs::File::open(&candidate).await {
        Ok(file) => {
            drop(file);
            true
        }
        Err(e) => {
            if e.kind() == ErrorKind::PermissionDenied {
                logger::log_warning(&format!(
                    "Permission denied probing '{}', serving entry document",
                    candidate.display()
                ));
            }
            false
        }
    }
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method, enable_cors: bool) -> Option<Response<Full<Bytes>>> {
    match method {
        &Method::GET | &Method::HEAD => None,
        &Method::OPTIONS => Some(http::build_options_response(enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(req: &Request<Incoming>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
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
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

fn header_string(req: &Request<Incoming>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn version_label(version: Version) -> &'static str {
    if version == Version::HTTP_10 {
        "1.0"
    } else if version == Version::HTTP_2 {
        "2"
    } else {
        "1.1"
    }
}
