//! HTTP response building module
//!
//! Every response the server emits goes through `builder`, so the CORS and
//! no-cache header set is identical across status codes.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, EXPIRES,
    PRAGMA,
};
use hyper::{Response, StatusCode};

use crate::error::ServeError;

/// Response body type used throughout the server
pub type Body = Full<Bytes>;

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
const ACCEPTED_METHODS: &str = "GET, OPTIONS";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const TEXT_HTML: &str = "text/html; charset=utf-8";

/// Response builder carrying the fixed CORS and cache headers
fn builder(
    status: StatusCode,
    content_type: &str,
    content_length: usize,
    allow_headers: &str,
) -> hyper::http::response::Builder {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, content_length)
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS)
        .header(ACCESS_CONTROL_ALLOW_HEADERS, allow_headers)
        .header(CACHE_CONTROL, "no-cache, no-store, must-revalidate")
        .header(PRAGMA, "no-cache")
        .header(EXPIRES, "0")
}

/// Build 200 response carrying file contents
pub fn build_file_response(data: Bytes, content_type: &str, allow_headers: &str) -> Response<Body> {
    builder(StatusCode::OK, content_type, data.len(), allow_headers)
        .body(Full::new(data.clone()))
        .unwrap_or_else(|e| fallback(StatusCode::OK, data, &e))
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(allow_headers: &str) -> Response<Body> {
    builder(StatusCode::OK, TEXT_PLAIN, 0, allow_headers)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| fallback(StatusCode::OK, Bytes::new(), &e))
}

/// Render a request error as the response its status calls for
pub fn build_error_response(error: &ServeError, allow_headers: &str) -> Response<Body> {
    match error {
        ServeError::NotFound { path } => build_404_response(path, allow_headers),
        ServeError::Forbidden { path } => build_403_response(path, allow_headers),
        ServeError::MethodNotAllowed { method } => build_405_response(method, allow_headers),
        ServeError::BadRequest { path } => build_400_response(path, allow_headers),
        ServeError::Read { source, .. } => build_500_response(&source.to_string(), allow_headers),
    }
}

/// Build 404 Not Found page with a link back to `/`
pub fn build_404_response(path: &str, allow_headers: &str) -> Response<Body> {
    let html = error_page(
        "404 - File Not Found",
        &format!(
            "The file <code>{}</code> does not exist.",
            escape_html(path)
        ),
    );
    html_response(StatusCode::NOT_FOUND, html, allow_headers)
}

/// Build 500 page carrying the I/O error message
pub fn build_500_response(message: &str, allow_headers: &str) -> Response<Body> {
    let html = error_page(
        "500 - Server Error",
        &format!("Failed to load the file: {}", escape_html(message)),
    );
    html_response(StatusCode::INTERNAL_SERVER_ERROR, html, allow_headers)
}

/// Build 403 Forbidden response
pub fn build_403_response(path: &str, allow_headers: &str) -> Response<Body> {
    text_response(
        StatusCode::FORBIDDEN,
        format!("403 Forbidden: access denied to {path}"),
        allow_headers,
    )
}

/// Build 400 Bad Request response
pub fn build_400_response(path: &str, allow_headers: &str) -> Response<Body> {
    text_response(
        StatusCode::BAD_REQUEST,
        format!("400 Bad Request: malformed path {path}"),
        allow_headers,
    )
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(method: &str, allow_headers: &str) -> Response<Body> {
    let mut response = text_response(
        StatusCode::METHOD_NOT_ALLOWED,
        format!("405 Method Not Allowed: {method}"),
        allow_headers,
    );
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(ACCEPTED_METHODS));
    response
}

fn text_response(status: StatusCode, body: String, allow_headers: &str) -> Response<Body> {
    let body = Bytes::from(body);
    builder(status, TEXT_PLAIN, body.len(), allow_headers)
        .body(Full::new(body.clone()))
        .unwrap_or_else(|e| fallback(status, body, &e))
}

fn html_response(status: StatusCode, html: String, allow_headers: &str) -> Response<Body> {
    let body = Bytes::from(html);
    builder(status, TEXT_HTML, body.len(), allow_headers)
        .body(Full::new(body.clone()))
        .unwrap_or_else(|e| fallback(status, body, &e))
}

fn error_page(title: &str, message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title}</title>
</head>
<body style="font-family: Arial, sans-serif; text-align: center; margin-top: 50px;">
    <h1>{title}</h1>
    <p>{message}</p>
    <a href="/">&larr; Back to the home page</a>
</body>
</html>
"#
    )
}

/// Escape text for inclusion in an HTML body
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Bare response used when the builder rejects a header value
fn fallback(status: StatusCode, body: Bytes, error: &hyper::http::Error) -> Response<Body> {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
}
