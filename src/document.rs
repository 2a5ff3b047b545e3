//! The unit of work flowing through the render pipeline.

use serde_json::Value;
use std::path::PathBuf;

/// A single source document.
///
/// Created by the build walker, consumed and mutated exactly once by
/// [`crate::render::Renderer::render_document`], then written to disk.
/// `contents` holds raw source (front matter + body) on the way in and
/// rendered HTML (or an error page) on the way out.
#[derive(Debug, Clone)]
pub struct Document {
    /// Source path relative to the content root (e.g. `posts/hello.hbs`).
    pub path: PathBuf,
    /// Raw source before rendering, final output after.
    pub contents: String,
    /// Optional upstream-injected per-document data (context layer b).
    pub data: Option<Value>,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
            data: None,
        }
    }

    /// Attach upstream per-document data.
    #[allow(dead_code)] // Used by pipeline embedders, exercised in tests
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}
