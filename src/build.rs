//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── load templates/layouts/*.hbs  ──► Renderer layouts
//!     ├── load templates/partials/*.hbs ──► permanent partials
//!     │
//!     └── for each content page (sequential):
//!             render_document() ──► write HTML (success or error page)
//! ```
//!
//! Pages are rendered strictly one at a time: the renderer's fragment
//! registry carries document-scoped state (`layout-*` fragments, the
//! `body` partial, page helpers) that is reset per document. Every page
//! is written exactly once; failed pages get fallback output and the
//! build fails at the end with the failure count (or immediately, with
//! `fail_fast`).

use crate::{
    config::SiteConfig,
    document::Document,
    log,
    render::Renderer,
    utils::paths,
};
use anyhow::{Context, Result, bail};
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Build the entire site. Returns the number of pages rendered.
///
/// If `config.build.clean` is true, clears the output directory first.
pub fn build_site(config: &SiteConfig) -> Result<usize> {
    let content = &config.build.content;
    let output = &config.build.output;
    let templates = &config.build.templates;

    if config.build.clean && output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clear output directory: {}", output.display()))?;
    }
    fs::create_dir_all(output)?;

    let mut renderer = Renderer::new(config.build.page_layouts.clone(), config.global_data());

    let layouts = load_templates(&templates.join("layouts"))?;
    if layouts.is_empty() {
        log!("warn"; "no layouts in {}", templates.join("layouts").display());
    }
    for (name, source) in &layouts {
        renderer
            .register_layout(name, source)
            .with_context(|| format!("Failed to compile layout `{name}`"))?;
    }
    for (name, source) in load_templates(&templates.join("partials"))? {
        renderer
            .register_partial(&name, &source)
            .with_context(|| format!("Failed to compile partial `{name}`"))?;
    }

    let sources = collect_page_files(content);
    log!("build"; "rendering {} pages", sources.len());

    let mut failures = 0usize;
    for source in &sources {
        let relative = source.strip_prefix(content)?.to_path_buf();
        let raw = fs::read_to_string(source)
            .with_context(|| format!("Failed to read {}", source.display()))?;

        let mut document = Document::new(relative.clone(), raw);
        let rendered = renderer.render_document(&mut document);

        // Output emission happens exactly once, success or fallback
        let dest = output.join(paths::output_path(&relative));
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dest, &document.contents)
            .with_context(|| format!("Failed to write {}", dest.display()))?;

        if let Err(err) = rendered {
            failures += 1;
            log!("error"; "{}: {}", relative.display(), err);
            if config.build.fail_fast {
                bail!("Build failed at {}", relative.display());
            }
        }
    }

    if failures > 0 {
        bail!("{failures} page(s) failed to render");
    }

    log_build_result(sources.len());
    Ok(sources.len())
}

/// Load every `.hbs` file in a directory as a (stem, source) pair.
///
/// A missing directory is not an error; it just contributes nothing.
fn load_templates(dir: &Path) -> Result<Vec<(String, String)>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut templates = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file()
            || entry.path().extension().is_none_or(|ext| ext != "hbs")
        {
            continue;
        }
        let name = paths::page_name(entry.path());
        let source = fs::read_to_string(entry.path())
            .with_context(|| format!("Failed to read {}", entry.path().display()))?;
        templates.push((name, source));
    }
    Ok(templates)
}

/// Collect renderable page sources (`.hbs` and `.html`) under a directory.
fn collect_page_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|ext| ext == "hbs" || ext == "html")
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Log build result based on the page count
fn log_build_result(page_count: usize) {
    if page_count == 0 {
        log!("warn"; "output is empty, check if content has .hbs files");
    } else {
        log!("build"; "done");
    }
}
