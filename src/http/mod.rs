//! HTTP protocol layer module
//!
//! Response builders, CORS headers, content types and HTTP dates, kept free
//! of routing and storage concerns.

pub mod cors;
pub mod date;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use cors::apply_cors_headers;
pub use response::{
    build_304_response, build_403_response, build_404_response, build_413_response,
    build_500_response, build_501_response, build_file_response, build_json_response,
    build_options_response, build_redirect_response,
};
