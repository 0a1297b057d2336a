//! MIME type detection module
//!
//! Returns the corresponding Content-Type based on file extension.

use std::collections::HashMap;
use std::path::Path;

/// Content type for extensions the table does not know
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const BUILTIN_TYPES: &[(&str, &str)] = &[
    // Text
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("txt", "text/plain"),
    // JavaScript/WASM
    ("js", "application/javascript"),
    ("mjs", "application/javascript"),
    ("json", "application/json"),
    ("map", "application/json"),
    ("wasm", "application/wasm"),
    // Images
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("ico", "image/x-icon"),
    ("svg", "image/svg+xml"),
    ("webp", "image/webp"),
    // Fonts
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("eot", "application/vnd.ms-fontobject"),
];

/// Extension to Content-Type lookup table
///
/// Keys are stored lowercased and without the leading dot.
#[derive(Debug, Clone)]
pub struct MimeTable {
    types: HashMap<String, String>,
}

impl MimeTable {
    /// Table with the built-in entries only
    pub fn new() -> Self {
        let types = BUILTIN_TYPES
            .iter()
            .map(|(ext, content_type)| ((*ext).to_string(), (*content_type).to_string()))
            .collect();
        Self { types }
    }

    /// Built-in entries plus configured ones; configured entries win
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
        let mut table = Self::new();
        for (ext, content_type) in overrides {
            table
                .types
                .insert(normalize_extension(ext), content_type.clone());
        }
        table
    }

    /// Look up an extension, with or without the leading dot
    pub fn get(&self, extension: &str) -> Option<&str> {
        self.types
            .get(&normalize_extension(extension))
            .map(String::as_str)
    }

    /// Content type for a file path, falling back to `DEFAULT_CONTENT_TYPE`
    ///
    /// # Examples
    /// ```
    /// use magician_serve::http::mime::MimeTable;
    /// use std::path::Path;
    ///
    /// let table = MimeTable::new();
    /// assert_eq!(table.content_type(Path::new("styles/app.CSS")), "text/css");
    /// assert_eq!(table.content_type(Path::new("README")), "application/octet-stream");
    /// ```
    pub fn content_type(&self, path: &Path) -> &str {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| self.get(e))
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

impl Default for MimeTable {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}
