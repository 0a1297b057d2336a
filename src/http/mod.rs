//! HTTP protocol layer module
//!
//! Content type lookup and response construction, decoupled from path
//! resolution and routing.

pub mod mime;
pub mod response;

// Re-export commonly used types
pub use mime::MimeTable;
pub use response::{
    build_error_response, build_file_response, build_options_response, Body,
};
