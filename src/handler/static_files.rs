//! Static file serving module
//!
//! Handles static file loading, MIME type detection, and response building.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::Path;
use tokio::fs;

use crate::config::AppState;
use crate::error::ServeError;
use crate::handler::resolve;
use crate::http;

/// Serve the file a request path resolves to
pub async fn serve_path(
    state: &AppState,
    request_path: &str,
) -> Result<Response<Full<Bytes>>, ServeError> {
    let file_path =
        resolve::resolve_request_path(&state.root, request_path, &state.config.server.root_document)
            .await?;
    serve_resolved(state, &file_path, request_path).await
}

/// Serve the root document, used for `/` and the SPA fallback
pub async fn serve_root_document(state: &AppState) -> Result<Response<Full<Bytes>>, ServeError> {
    serve_path(state, "/").await
}

async fn serve_resolved(
    state: &AppState,
    file_path: &Path,
    request_path: &str,
) -> Result<Response<Full<Bytes>>, ServeError> {
    let content = load_file(file_path, request_path).await?;
    let content_type = state.mime.content_type(file_path);

    Ok(http::build_file_response(
        Bytes::from(content),
        content_type,
        &state.config.http.allow_headers,
    ))
}

/// Read a resolved file fully into memory
async fn load_file(file_path: &Path, request_path: &str) -> Result<Vec<u8>, ServeError> {
    fs::read(file_path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            // Removed between resolution and read
            ServeError::NotFound {
                path: request_path.to_string(),
            }
        } else {
            ServeError::Read {
                path: request_path.to_string(),
                source: e,
            }
        }
    })
}
