//! Request handler module
//!
//! Routes each request to the preflight answer, the static file responder,
//! or the JSON document API.

pub mod documents;
pub mod paths;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
