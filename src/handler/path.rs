//! Request path translation
//!
//! Turns the raw request path into a relative filesystem path below the
//! document root, or rejects it.

use percent_encoding::percent_decode_str;
use std::path::{Component, Path, PathBuf};

/// Translate a request path (`/css/site.css`) into a relative path.
///
/// The path is percent-decoded and split on `/`. Empty and `.` segments are
/// dropped and `..` removes the previous segment. Returns `None` when `..`
/// would climb above the root, for invalid UTF-8, NUL bytes, and any segment
/// the platform would read as more than one path component (separators,
/// drive prefixes, roots).
pub fn to_relative_path(request_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;

    let mut relative = PathBuf::new();
    for segment in decoded.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." {
            if !relative.pop() {
                return None;
            }
            continue;
        }
        if segment.contains('\0') {
            return None;
        }
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) => relative.push(part),
            _ => return None,
        }
    }
    Some(relative)
}
