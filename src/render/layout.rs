//! Layout name resolution.
//!
//! Which layout wraps a page is decided by, in order:
//! 1. an explicit `layout` key in the page's front matter,
//! 2. the `[build.page_layouts]` folder map keyed by the document's
//!    directory relative to the content root,
//! 3. the literal name `default`.
//!
//! Resolution is a pure function over names; the orchestrator maps the
//! resolved name to a compiled template and raises when it is missing.

use crate::utils::paths::folder_key;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

/// Fallback layout name; its absence is a fatal configuration error.
pub const DEFAULT_LAYOUT: &str = "default";

/// Resolve the layout name for a document.
pub fn resolve(
    relative: &Path,
    attributes: &Map<String, Value>,
    page_layouts: &HashMap<String, String>,
) -> String {
    if let Some(name) = attributes.get("layout").and_then(Value::as_str) {
        return name.to_owned();
    }
    if let Some(name) = page_layouts.get(&folder_key(relative)) {
        return name.clone();
    }
    DEFAULT_LAYOUT.to_owned()
}
