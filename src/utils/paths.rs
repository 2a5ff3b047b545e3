//! Path helpers for content-relative source paths.
//!
//! Every document carries its path *relative to the content root*
//! (e.g. `posts/hello.hbs`). These helpers derive the values the render
//! pipeline needs from that relative path: the page name, the folder key
//! used for layout-by-folder lookup, and the `../` prefix back to the
//! site root.

use std::path::{Path, PathBuf};

/// Base filename without extension (`posts/hello.hbs` → `hello`).
pub fn page_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Directory portion with forward slashes (`posts/2024/a.hbs` → `posts/2024`).
///
/// Returns an empty string for documents at the content root. This is the
/// key used against the `[build.page_layouts]` folder map.
pub fn folder_key(path: &Path) -> String {
    path.parent()
        .map(|dir| dir.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default()
}

/// Relative prefix from the document's directory back to the site root.
///
/// Empty at the root, otherwise one `../` per directory level, so that
/// templates can reference site-absolute assets via `{{root}}style.css`.
pub fn root_prefix(path: &Path) -> String {
    let depth = path
        .parent()
        .map(|dir| dir.components().count())
        .unwrap_or(0);
    "../".repeat(depth)
}

/// Output path for a rendered document: same relative location, `.html`.
pub fn output_path(path: &Path) -> PathBuf {
    path.with_extension("html")
}
