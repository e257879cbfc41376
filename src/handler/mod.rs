//! Request handler module
//!
//! Serves files below the document root. The fixed CORS and no-cache headers
//! are applied here, after the file response has been built.

mod listing;
mod path;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
