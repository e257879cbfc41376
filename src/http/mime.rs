//! MIME type detection module
//!
//! Default inference comes from the `mime_guess` table applied to the full
//! file name, so `dump.tar.gz` is `application/gzip`. Only `*.js` is
//! overridden.

use std::path::Path;

/// Content type forced for every `*.js` file
pub const JAVASCRIPT: &str = "application/javascript";

const OCTET_STREAM: &str = "application/octet-stream";

/// Default inference, without any override
pub fn guess_type(path: &Path) -> &'static str {
    mime_guess::from_path(path).first_raw().unwrap_or(OCTET_STREAM)
}

/// Content type used for responses: `*.js` is always `application/javascript`,
/// everything else keeps the default inference.
pub fn resolve_content_type(path: &Path) -> &'static str {
    let is_js = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".js"));
    if is_js {
        JAVASCRIPT
    } else {
        guess_type(path)
    }
}
