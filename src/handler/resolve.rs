//! Request path resolution
//!
//! Turns the path component of a request URI into a canonical file path that
//! is guaranteed to live under the project root.

use percent_encoding::percent_decode_str;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::error::ServeError;
use crate::logger;

/// Percent-decode a request path
///
/// Anything after `?` is dropped. The decoded path must be valid UTF-8 and
/// must not contain NUL bytes.
pub fn decode_request_path(raw_path: &str) -> Result<String, ServeError> {
    let path = raw_path.split('?').next().unwrap_or_default();
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map_err(|_| ServeError::BadRequest {
            path: raw_path.to_string(),
        })?;

    if decoded.contains('\0') {
        return Err(ServeError::BadRequest {
            path: raw_path.to_string(),
        });
    }

    Ok(decoded.into_owned())
}

/// Lexically normalize a decoded path relative to the project root
///
/// `.` segments are dropped and `..` removes the previous segment. Climbing
/// above the root, or any absolute/prefix component left after stripping
/// the leading separators, is reported as `Forbidden`.
pub fn normalize_path(decoded: &str, raw_path: &str) -> Result<PathBuf, ServeError> {
    let forbidden = || ServeError::Forbidden {
        path: raw_path.to_string(),
    };

    let mut normalized = PathBuf::new();
    for component in Path::new(decoded.trim_start_matches('/')).components() {
        match component {
            Component::CurDir => {}
            Component::Normal(segment) => normalized.push(segment),
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(forbidden());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(forbidden()),
        }
    }

    Ok(normalized)
}

/// Resolve a raw request path to a canonical file under `root`
///
/// `root` must already be canonical. An empty path maps to `root_document`,
/// and so does a directory (`<dir>/<root_document>`).
pub async fn resolve_request_path(
    root: &Path,
    raw_path: &str,
    root_document: &str,
) -> Result<PathBuf, ServeError> {
    let decoded = decode_request_path(raw_path)?;
    let mut relative = normalize_path(&decoded, raw_path)?;
    if relative.as_os_str().is_empty() {
        relative = PathBuf::from(root_document);
    }

    let mut resolved = canonicalize_within(root, &root.join(&relative), raw_path).await?;

    if is_dir(&resolved).await {
        resolved = canonicalize_within(root, &resolved.join(root_document), raw_path).await?;
        if is_dir(&resolved).await {
            return Err(ServeError::NotFound {
                path: raw_path.to_string(),
            });
        }
    }

    Ok(resolved)
}

/// Canonicalize `candidate` and require the result to stay under `root`
async fn canonicalize_within(
    root: &Path,
    candidate: &Path,
    raw_path: &str,
) -> Result<PathBuf, ServeError> {
    let canonical = match fs::canonicalize(candidate).await {
        Ok(p) => p,
        Err(e) if is_missing(&e) => {
            return Err(ServeError::NotFound {
                path: raw_path.to_string(),
            })
        }
        Err(e) => {
            return Err(ServeError::Read {
                path: raw_path.to_string(),
                source: e,
            })
        }
    };

    if !canonical.starts_with(root) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            raw_path,
            canonical.display()
        ));
        return Err(ServeError::Forbidden {
            path: raw_path.to_string(),
        });
    }

    Ok(canonical)
}

fn is_missing(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        _dir: tempfile::TempDir,
        root: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("project");
        std::fs::create_dir_all(root.join("styles")).unwrap();
        std::fs::create_dir_all(root.join("docs")).unwrap();
        std::fs::create_dir_all(root.join("empty")).unwrap();
        std::fs::write(root.join("index.html"), "<html></html>").unwrap();
        std::fs::write(root.join("styles/app.css"), "body {}").unwrap();
        std::fs::write(root.join("docs/index.html"), "docs").unwrap();
        std::fs::write(root.join("a b.txt"), "spaced").unwrap();
        std::fs::write(dir.path().join("secrets.txt"), "secret").unwrap();
        let root = root.canonicalize().unwrap();
        Fixture { _dir: dir, root }
    }

    #[test]
    fn test_decode_strips_query() {
        assert_eq!(decode_request_path("/app.js?v=3").unwrap(), "/app.js");
        assert_eq!(decode_request_path("/a%20b.txt").unwrap(), "/a b.txt");
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert!(matches!(
            decode_request_path("/%ff%fe"),
            Err(ServeError::BadRequest { .. })
        ));
        assert!(matches!(
            decode_request_path("/index.html%00.css"),
            Err(ServeError::BadRequest { .. })
        ));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize_path("/styles/./app.css", "").unwrap(),
            PathBuf::from("styles/app.css")
        );
        assert_eq!(
            normalize_path("/styles/../index.html", "").unwrap(),
            PathBuf::from("index.html")
        );
        assert_eq!(normalize_path("/", "").unwrap(), PathBuf::new());
        assert_eq!(
            normalize_path("//etc//passwd", "").unwrap(),
            PathBuf::from("etc/passwd")
        );
    }

    #[test]
    fn test_normalize_rejects_escape() {
        assert!(matches!(
            normalize_path("/../secrets.txt", "/../secrets.txt"),
            Err(ServeError::Forbidden { .. })
        ));
        assert!(matches!(
            normalize_path("/styles/../../etc/passwd", ""),
            Err(ServeError::Forbidden { .. })
        ));
    }

    #[tokio::test]
    async fn test_resolve_existing_files() {
        let fx = fixture();
        assert_eq!(
            resolve_request_path(&fx.root, "/", "index.html").await.unwrap(),
            fx.root.join("index.html")
        );
        assert_eq!(
            resolve_request_path(&fx.root, "/styles/app.css", "index.html")
                .await
                .unwrap(),
            fx.root.join("styles/app.css")
        );
        assert_eq!(
            resolve_request_path(&fx.root, "/a%20b.txt", "index.html")
                .await
                .unwrap(),
            fx.root.join("a b.txt")
        );
    }

    #[tokio::test]
    async fn test_resolve_directory_index() {
        let fx = fixture();
        assert_eq!(
            resolve_request_path(&fx.root, "/docs/", "index.html")
                .await
                .unwrap(),
            fx.root.join("docs/index.html")
        );
        assert!(matches!(
            resolve_request_path(&fx.root, "/empty", "index.html").await,
            Err(ServeError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_resolve_missing() {
        let fx = fixture();
        assert!(matches!(
            resolve_request_path(&fx.root, "/styles/missing.css", "index.html").await,
            Err(ServeError::NotFound { .. })
        ));
        // A file used as a directory is just as missing
        assert!(matches!(
            resolve_request_path(&fx.root, "/index.html/child", "index.html").await,
            Err(ServeError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_resolve_traversal() {
        let fx = fixture();
        for path in ["/../secrets.txt", "/%2e%2e/secrets.txt", "/styles/../../secrets.txt"] {
            assert!(
                matches!(
                    resolve_request_path(&fx.root, path, "index.html").await,
                    Err(ServeError::Forbidden { .. })
                ),
                "expected 403 for {path}"
            );
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_symlink_escape() {
        let fx = fixture();
        let outside = fx.root.parent().unwrap().join("secrets.txt");
        std::os::unix::fs::symlink(outside, fx.root.join("leak.txt")).unwrap();

        assert!(matches!(
            resolve_request_path(&fx.root, "/leak.txt", "index.html").await,
            Err(ServeError::Forbidden { .. })
        ));
    }
}
