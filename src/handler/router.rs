//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for method validation,
//! the not-found policy, and turning every failure into a response.

use hyper::body::Body as _;
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{AppState, NotFoundPolicy};
use crate::error::ServeError;
use crate::handler::static_files;
use crate::http::{self, Body};
use crate::logger::{self, AccessLogEntry};

/// Main entry point for HTTP request handling
///
/// Never fails: every outcome, including I/O errors, becomes a response.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Body>, Infallible> {
    let started = Instant::now();
    let (parts, _) = req.into_parts();

    let response = dispatch(&parts.method, parts.uri.path(), &state).await;

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::new(
            peer_addr.ip().to_string(),
            parts.method.to_string(),
            parts.uri.path().to_string(),
        );
        entry.query = parts.uri.query().map(ToString::to_string);
        entry.http_version = version_label(parts.version).to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.referer = header_value(&parts.headers, "referer");
        entry.user_agent = header_value(&parts.headers, "user-agent");
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging);
    }

    Ok(response)
}

/// Route by method, then resolve and serve
async fn dispatch(method: &Method, path: &str, state: &AppState) -> Response<Body> {
    let allow_headers = state.config.http.allow_headers.as_str();

    let result = match *method {
        Method::OPTIONS => return http::build_options_response(allow_headers),
        Method::GET => serve_with_policy(state, path).await,
        _ => Err(ServeError::MethodNotAllowed {
            method: method.to_string(),
        }),
    };

    result.unwrap_or_else(|error| {
        log_serve_error(&error);
        http::build_error_response(&error, allow_headers)
    })
}

/// Serve a path, applying the configured not-found policy
async fn serve_with_policy(state: &AppState, path: &str) -> Result<Response<Body>, ServeError> {
    match static_files::serve_path(state, path).await {
        Err(ServeError::NotFound { path })
            if state.config.server.not_found == NotFoundPolicy::SpaFallback =>
        {
            match static_files::serve_root_document(state).await {
                // Report the path the client asked for, not the root document
                Err(ServeError::NotFound { .. }) => Err(ServeError::NotFound { path }),
                other => other,
            }
        }
        other => other,
    }
}

fn log_serve_error(error: &ServeError) {
    match error {
        // Missing files are routine during development
        ServeError::NotFound { .. } => {}
        ServeError::Read { .. } => logger::log_error(&error.to_string()),
        ServeError::Forbidden { .. }
        | ServeError::MethodNotAllowed { .. }
        | ServeError::BadRequest { .. } => logger::log_warning(&error.to_string()),
    }
}

fn header_value(headers: &hyper::HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

/// Request versions seen here are HTTP/1.x only
const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_10 => "1.0",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::BodyExt;
    use hyper::StatusCode;

    struct Fixture {
        _dir: tempfile::TempDir,
        state: Arc<AppState>,
    }

    /// Project with a 200-byte `index.html` and a 50-byte `styles/app.css`
    fn fixture(policy: NotFoundPolicy) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("project");
        std::fs::create_dir_all(root.join("styles")).unwrap();
        std::fs::write(root.join("index.html"), vec![b'h'; 200]).unwrap();
        std::fs::write(root.join("styles/app.css"), vec![b'c'; 50]).unwrap();
        std::fs::write(dir.path().join("secrets.txt"), "secret").unwrap();

        let mut config = Config::with_root(&root);
        config.server.not_found = policy;
        config.logging.access_log = false;
        let state = Arc::new(AppState::new(config).unwrap());
        Fixture { _dir: dir, state }
    }

    async fn send(fx: &Fixture, method: Method, uri: &str) -> (StatusCode, hyper::HeaderMap, Vec<u8>) {
        let req = Request::builder().method(method).uri(uri).body(()).unwrap();
        let peer: SocketAddr = "127.0.0.1:50000".parse().unwrap();
        let response = handle_request(req, Arc::clone(&fx.state), peer).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
        (status, headers, body)
    }

    fn content_type(headers: &hyper::HeaderMap) -> &str {
        headers.get("content-type").unwrap().to_str().unwrap()
    }

    #[tokio::test]
    async fn test_scenario() {
        let fx = fixture(NotFoundPolicy::NotFound);

        let (status, headers, body) = send(&fx, Method::GET, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type(&headers), "text/html");
        assert_eq!(body.len(), 200);
        assert_eq!(headers.get("content-length").unwrap(), "200");

        let (status, headers, body) = send(&fx, Method::GET, "/styles/app.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type(&headers), "text/css");
        assert_eq!(body.len(), 50);

        let (status, _, _) = send(&fx, Method::GET, "/styles/missing.css").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, body) = send(&fx, Method::GET, "/../secrets.txt").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_ne!(body, b"secret");

        let (status, _, _) = send(&fx, Method::DELETE, "/index.html").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_root_and_index_identical() {
        let fx = fixture(NotFoundPolicy::NotFound);
        let (_, _, root) = send(&fx, Method::GET, "/").await;
        let (_, _, index) = send(&fx, Method::GET, "/index.html").await;
        assert_eq!(root, index);
    }

    #[tokio::test]
    async fn test_query_string_ignored() {
        let fx = fixture(NotFoundPolicy::NotFound);
        let (status, headers, body) = send(&fx, Method::GET, "/styles/app.css?v=42").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type(&headers), "text/css");
        assert_eq!(body.len(), 50);
    }

    #[tokio::test]
    async fn test_options_preflight() {
        let fx = fixture(NotFoundPolicy::NotFound);
        for uri in ["/", "/styles/app.css", "/does-not-exist.xyz"] {
            let (status, headers, body) = send(&fx, Method::OPTIONS, uri).await;
            assert_eq!(status, StatusCode::OK);
            assert!(body.is_empty());
            assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
            assert_eq!(
                headers.get("access-control-allow-methods").unwrap(),
                "GET, POST, OPTIONS"
            );
            assert!(headers.contains_key("access-control-allow-headers"));
        }
    }

    #[tokio::test]
    async fn test_other_methods_rejected() {
        let fx = fixture(NotFoundPolicy::NotFound);
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::HEAD, Method::PATCH] {
            let (status, headers, _) = send(&fx, method, "/index.html").await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(headers.get("allow").unwrap(), "GET, OPTIONS");
        }
    }

    #[tokio::test]
    async fn test_not_found_page() {
        let fx = fixture(NotFoundPolicy::NotFound);
        let (status, headers, body) = send(&fx, Method::GET, "/does-not-exist.xyz").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(content_type(&headers).starts_with("text/html"));
        let body = String::from_utf8(body).unwrap();
        assert!(body.contains("/does-not-exist.xyz"));
        assert!(body.contains(r#"href="/""#));

        // Same answer every time
        let (again, _, _) = send(&fx, Method::GET, "/does-not-exist.xyz").await;
        assert_eq!(again, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_spa_fallback() {
        let fx = fixture(NotFoundPolicy::SpaFallback);
        let (_, _, index) = send(&fx, Method::GET, "/").await;

        for _ in 0..2 {
            let (status, headers, body) = send(&fx, Method::GET, "/does-not-exist.xyz").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(content_type(&headers), "text/html");
            assert_eq!(body, index);
        }
    }

    #[tokio::test]
    async fn test_spa_fallback_keeps_forbidden() {
        let fx = fixture(NotFoundPolicy::SpaFallback);
        let (status, _, _) = send(&fx, Method::GET, "/../secrets.txt").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_spa_fallback_without_root_document() {
        let fx = fixture(NotFoundPolicy::SpaFallback);
        std::fs::remove_file(fx.state.root.join("index.html")).unwrap();

        let (status, _, body) = send(&fx, Method::GET, "/app/route").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(String::from_utf8(body).unwrap().contains("/app/route"));
    }

    #[tokio::test]
    async fn test_bad_encoding() {
        let fx = fixture(NotFoundPolicy::NotFound);
        let (status, _, _) = send(&fx, Method::GET, "/%ff.css").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_does_not_modify_files() {
        let fx = fixture(NotFoundPolicy::NotFound);
        let css = fx.state.root.join("styles/app.css");
        let before = std::fs::read(&css).unwrap();
        for _ in 0..3 {
            let (_, _, body) = send(&fx, Method::GET, "/styles/app.css").await;
            assert_eq!(body, before);
        }
        assert_eq!(std::fs::read(&css).unwrap(), before);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_loop_is_server_error() {
        let fx = fixture(NotFoundPolicy::SpaFallback);
        let root = &fx.state.root;
        std::os::unix::fs::symlink(root.join("b.css"), root.join("a.css")).unwrap();
        std::os::unix::fs::symlink(root.join("a.css"), root.join("b.css")).unwrap();

        let (status, headers, body) = send(&fx, Method::GET, "/a.css").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(content_type(&headers).starts_with("text/html"));
        assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
        assert!(String::from_utf8(body).unwrap().contains("500 - Server Error"));
    }

    #[test]
    fn test_version_label() {
        assert_eq!(version_label(Version::HTTP_10), "1.0");
        assert_eq!(version_label(Version::HTTP_11), "1.1");
    }
}
