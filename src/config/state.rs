// Application state module
// Immutable per-process state shared by every connection

use hyper::header::HeaderValue;
use std::path::PathBuf;

use super::types::Config;
use crate::error::StartupError;
use crate::http::mime::MimeTable;

/// Application state
///
/// Built once before the listener binds and shared behind an `Arc`;
/// nothing in here changes while the server is running.
pub struct AppState {
    pub config: Config,
    /// Canonical project root, used for containment checks
    pub root: PathBuf,
    pub mime: MimeTable,
}

impl AppState {
    /// Validate the project root and build the lookup tables
    ///
    /// Fails when the root cannot be canonicalized, the root document
    /// is not a regular file inside it, or a configured header value
    /// does not parse.
    pub fn new(config: Config) -> Result<Self, StartupError> {
        let root = config
            .server
            .root
            .canonicalize()
            .map_err(|source| StartupError::RootDirectory {
                path: config.server.root.clone(),
                source,
            })?;

        let root_document = root.join(&config.server.root_document);
        if !root_document.is_file() {
            return Err(StartupError::MissingRootDocument {
                path: root_document,
            });
        }

        check_header_value("http.allow_headers", &config.http.allow_headers)?;
        for (ext, content_type) in &config.http.mime_types {
            check_header_value(&format!("http.mime_types.{ext}"), content_type)?;
        }
        let mime = MimeTable::with_overrides(&config.http.mime_types);

        Ok(Self { config, root, mime })
    }
}

/// Reject configured values that cannot be sent as a header
fn check_header_value(setting: &str, value: &str) -> Result<(), StartupError> {
    HeaderValue::from_str(value)
        .map(|_| ())
        .map_err(|_| StartupError::InvalidHeaderValue {
            setting: setting.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_root_document() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppState::new(Config::with_root(dir.path()));
        assert!(matches!(
            result,
            Err(StartupError::MissingRootDocument { .. })
        ));
    }

    #[test]
    fn test_missing_root_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppState::new(Config::with_root(dir.path().join("nope")));
        assert!(matches!(result, Err(StartupError::RootDirectory { .. })));
    }

    #[test]
    fn test_invalid_allow_headers_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();

        let mut config = Config::with_root(dir.path());
        config.http.allow_headers = "bad\nvalue".to_string();
        let result = AppState::new(config);
        assert!(matches!(
            result,
            Err(StartupError::InvalidHeaderValue { ref setting, .. }) if setting == "http.allow_headers"
        ));
    }

    #[test]
    fn test_invalid_mime_override_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();

        let mut config = Config::with_root(dir.path());
        config
            .http
            .mime_types
            .insert("log".to_string(), "text/plain\r\nX-Injected: 1".to_string());
        let result = AppState::new(config);
        assert!(matches!(
            result,
            Err(StartupError::InvalidHeaderValue { ref setting, .. }) if setting == "http.mime_types.log"
        ));
    }

    #[test]
    fn test_root_is_canonical() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let state = AppState::new(Config::with_root(dir.path().join("sub").join(".."))).unwrap();
        assert_eq!(state.root, dir.path().canonicalize().unwrap());
    }
}
