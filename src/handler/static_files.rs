//! Static file serving module
//!
//! Resolves the request path below the document root and builds the file,
//! listing, redirect or error response for it.

use hyper::Response;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::listing;
use super::path::to_relative_path;
use super::router::RequestContext;
use crate::config::AppState;
use crate::http::body::{self, FileBody};
use crate::http::{self, cache, mime, ResponseBody};
use crate::logger;

/// Why a path could not be served
#[derive(Debug)]
pub enum ServeError {
    NotFound,
    Forbidden,
    Io(io::Error),
}

impl From<io::Error> for ServeError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => Self::NotFound,
            io::ErrorKind::PermissionDenied => Self::Forbidden,
            _ => Self::Io(err),
        }
    }
}

impl ServeError {
    fn into_response(self, request_path: &str) -> Response<ResponseBody> {
        match self {
            Self::NotFound => http::build_404_response(),
            Self::Forbidden => http::build_403_response(),
            Self::Io(e) => {
                logger::log_error(&format!("Failed to serve '{request_path}': {e}"));
                http::build_500_response()
            }
        }
    }
}

/// Serve the request path from the document root
pub async fn serve(ctx: &RequestContext<'_>, state: &AppState) -> Response<ResponseBody> {
    match serve_path(ctx, state).await {
        Ok(response) => response,
        Err(e) => e.into_response(ctx.path),
    }
}

async fn serve_path(
    ctx: &RequestContext<'_>,
    state: &AppState,
) -> Result<Response<ResponseBody>, ServeError> {
    let relative = to_relative_path(ctx.path).ok_or(ServeError::NotFound)?;
    let mut target = state.root.join(relative);

    if fs::metadata(&target).await?.is_dir() {
        if !ctx.path.ends_with('/') {
            return Ok(http::build_redirect_response(&directory_location(ctx)));
        }
        match find_index(&target, &state.config.http.index_files).await {
            Some(index) => target = index,
            None if state.config.http.directory_listing => {
                let dir = ensure_within_root(&state.root, &target).await?;
                let html = listing::render(&dir, ctx.path).await?;
                return Ok(http::build_html_response(html, ctx.is_head));
            }
            None => return Err(ServeError::NotFound),
        }
    } else if ctx.path.ends_with('/') {
        // A trailing slash names a directory, never a file
        return Err(ServeError::NotFound);
    }

    let resolved = ensure_within_root(&state.root, &target).await?;
    let file = fs::File::open(&resolved).await?;
    let metadata = file.metadata().await?;
    if !metadata.is_file() {
        return Err(ServeError::NotFound);
    }

    let modified = metadata.modified().ok();
    let last_modified = modified.map(cache::format_last_modified);
    if let (Some(modified), Some(last_modified)) = (modified, last_modified.as_deref()) {
        if cache::is_not_modified(
            ctx.if_modified_since.as_deref(),
            ctx.has_if_none_match,
            modified,
        ) {
            return Ok(http::build_304_response(last_modified));
        }
    }

    let length = metadata.len();
    let body = if ctx.is_head {
        body::empty()
    } else {
        FileBody::new(file, length).boxed()
    };
    // Type comes from the requested name, not the symlink target
    let content_type = mime::resolve_content_type(&target);

    Ok(http::build_file_response(
        body,
        length,
        content_type,
        last_modified.as_deref(),
    ))
}

/// Canonicalize `target` and require it to stay below `root`
async fn ensure_within_root(root: &Path, target: &Path) -> Result<PathBuf, ServeError> {
    let resolved = fs::canonicalize(target).await?;
    if resolved.starts_with(root) {
        Ok(resolved)
    } else {
        Err(ServeError::NotFound)
    }
}

async fn find_index(dir: &Path, index_files: &[String]) -> Option<PathBuf> {
    for name in index_files {
        let candidate = dir.join(name);
        if fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) {
            return Some(candidate);
        }
    }
    None
}

/// `Location` for a directory requested without its trailing slash
fn directory_location(ctx: &RequestContext<'_>) -> String {
    match ctx.query {
        Some(query) => format!("{}/?{query}", ctx.path),
        None => format!("{}/", ctx.path),
    }
}
