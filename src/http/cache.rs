//! HTTP conditional request module
//!
//! `Last-Modified` formatting and `If-Modified-Since` evaluation.

use std::time::{SystemTime, UNIX_EPOCH};

/// Format a modification time as an HTTP-date
pub fn format_last_modified(modified: SystemTime) -> String {
    httpdate::fmt_http_date(modified)
}

/// Check whether the client's copy is still current
///
/// Comparison is done at whole-second precision, which is all an HTTP-date
/// carries. An unparsable `If-Modified-Since` is ignored, as is any
/// `If-Modified-Since` sent together with `If-None-Match`.
pub fn is_not_modified(
    if_modified_since: Option<&str>,
    has_if_none_match: bool,
    modified: SystemTime,
) -> bool {
    if has_if_none_match {
        return false;
    }
    let Some(since) = if_modified_since.and_then(|v| httpdate::parse_http_date(v).ok()) else {
        return false;
    };
    unix_secs(modified) <= unix_secs(since)
}

fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
