//! Request dispatch module
//!
//! Entry point for HTTP request processing: method check, file serving, then
//! the fixed CORS/no-cache headers on whatever response came out.

use hyper::body::Body as _;
use hyper::header::{HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH, REFERER, USER_AGENT};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppState;
use crate::handler::static_files;
use crate::http::{self, ResponseBody};
use crate::logger::{self, AccessLogEntry};

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    /// Raw (still percent-encoded) path
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub if_modified_since: Option<String>,
    pub has_if_none_match: bool,
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible> {
    let started = Instant::now();
    // Request bodies are never read
    let (parts, _) = req.into_parts();

    let mut response = dispatch(&parts, &state).await;
    http::apply_fixed_headers(&mut response);

    if state.access_log() {
        log_access(&parts, &response, &state, peer_addr, started);
    }
    Ok(response)
}

async fn dispatch(req: &Parts, state: &AppState) -> Response<ResponseBody> {
    let method = &req.method;
    if let Some(resp) = check_http_method(method) {
        return resp;
    }

    let headers = &req.headers;
    let ctx = RequestContext {
        path: req.uri.path(),
        query: req.uri.query(),
        is_head: *method == Method::HEAD,
        if_modified_since: headers
            .get(IF_MODIFIED_SINCE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string),
        has_if_none_match: headers.contains_key(IF_NONE_MATCH),
    };

    static_files::serve(&ctx, state).await
}

/// Check HTTP method and return the response for anything but GET/HEAD
fn check_http_method(method: &Method) -> Option<Response<ResponseBody>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response()),
        _ => Some(http::build_405_response()),
    }
}

fn log_access(
    req: &Parts,
    response: &Response<ResponseBody>,
    state: &AppState,
    peer_addr: SocketAddr,
    started: Instant,
) {
    let target = req
        .uri
        .path_and_query()
        .map_or_else(|| req.uri.path().to_string(), ToString::to_string);
    let header = |name: HeaderName| {
        req.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method.to_string(),
        target,
    );
    entry.http_version = version_label(req.version).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response.body().size_hint().exact().unwrap_or_default();
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, state.config.logging.access_log_format);
}

fn version_label(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        _ => "1.1",
    }
}
