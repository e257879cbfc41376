//! HTTP protocol layer module
//!
//! Content-type inference, conditional requests, the fixed response headers
//! and response builders, decoupled from filesystem access.

pub mod body;
pub mod cache;
pub mod headers;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use body::ResponseBody;
pub use headers::apply_fixed_headers;
pub use response::{
    build_304_response, build_403_response, build_404_response, build_405_response,
    build_500_response, build_file_response, build_html_response, build_options_response,
    build_redirect_response,
};
