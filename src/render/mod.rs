//! The page render pipeline.
//!
//! # Architecture
//!
//! ```text
//! render_document()
//!     │
//!     ├── matter::split()        front matter ⇄ body
//!     ├── purge_transient()      drop layout-* fragments from prior docs
//!     ├── fragments::extract()   lift {{#*inline "layout-…"}} blocks
//!     ├── layout::resolve()      front matter → folder map → "default"
//!     ├── register `body`        the page template becomes a partial
//!     ├── context::compose()     global ← doc data ← front matter ← constants
//!     ├── page helpers           ifpage / unlesspage for this page
//!     └── render layout          {{> body}} embeds the page
//! ```
//!
//! Every failure is converted into *some* output before being re-raised:
//! if a layout was already resolved, the same layout is re-rendered with
//! an error fragment in place of `body` so the page shell survives
//! (Tier 1); otherwise a minimal self-contained error document is emitted
//! without touching the engine (Tier 2). The document always leaves the
//! pipeline with content, exactly once.

pub mod context;
mod error;
pub mod fragments;
pub mod helpers;
pub mod layout;
pub mod matter;

pub use error::PageError;

use crate::document::Document;
use crate::utils::{html_escape, paths};
use fragments::TRANSIENT_PREFIX;
use handlebars::Handlebars;
use helpers::PageGuard;
use serde_json::{Value, json};
use std::collections::{BTreeSet, HashMap};

/// Reserved fragment name the layout embeds the page body under.
const BODY_FRAGMENT: &str = "body";

/// Tier-1 replacement for `body`: renders inside the resolved layout.
const ERROR_BODY: &str = "<pre class=\"render-error\">{{error}}</pre>";

/// How far the pipeline got before failing.
///
/// The fallback decision is made on this explicit record, not on which
/// locals happened to be assigned when an exception fired.
enum Failure {
    /// Failed before any layout template was resolved (Tier 2 applies).
    BeforeLayout(PageError),
    /// Failed after resolution; the layout can still frame the error.
    AfterLayout { layout: String, error: PageError },
}

/// The render orchestrator.
///
/// Owns the fragment registry (a `handlebars` template registry: layouts,
/// permanent partials, transient `layout-*` fragments, the per-document
/// `body` partial and page helpers all live there) plus the folder map
/// and global data. Documents are rendered strictly one at a time;
/// transient state is reset at the start of each render.
pub struct Renderer {
    registry: Handlebars<'static>,
    layouts: BTreeSet<String>,
    page_layouts: HashMap<String, String>,
    global: Value,
}

impl Renderer {
    pub fn new(page_layouts: HashMap<String, String>, global: Value) -> Self {
        Self {
            registry: Handlebars::new(),
            layouts: BTreeSet::new(),
            page_layouts,
            global,
        }
    }

    /// Register a named layout template. Setup-time only.
    pub fn register_layout(&mut self, name: &str, source: &str) -> Result<(), PageError> {
        self.registry.register_template_string(name, source)?;
        self.layouts.insert(name.to_owned());
        Ok(())
    }

    /// Register a permanent partial, visible to all documents.
    pub fn register_partial(&mut self, name: &str, source: &str) -> Result<(), PageError> {
        self.registry.register_template_string(name, source)?;
        Ok(())
    }

    /// Render one document in place.
    ///
    /// `document.contents` is replaced with rendered HTML on success, or
    /// with a fallback error page on failure; the error is still returned
    /// so the caller can count or abort.
    pub fn render_document(&mut self, document: &mut Document) -> Result<(), PageError> {
        match self.render_page(document) {
            Ok(html) => {
                document.contents = html;
                Ok(())
            }
            Err(Failure::AfterLayout { layout, error }) => {
                document.contents = self.layout_error_page(&layout, &error);
                Err(error)
            }
            Err(Failure::BeforeLayout(error)) => {
                document.contents = raw_error_page(&error);
                Err(error)
            }
        }
    }

    /// The primary render path, recording how far it progressed.
    fn render_page(&mut self, document: &Document) -> Result<String, Failure> {
        let parsed =
            matter::split(&document.contents).map_err(|e| Failure::BeforeLayout(e.into()))?;

        self.purge_transient();

        let (body, inline_fragments) = fragments::extract(&parsed.body);
        for fragment in inline_fragments {
            self.registry
                .register_template_string(&fragment.name, &fragment.source)
                .map_err(|e| Failure::BeforeLayout(e.into()))?;
        }

        let layout = layout::resolve(&document.path, &parsed.attributes, &self.page_layouts);
        if !self.layouts.contains(&layout) {
            let error = if layout == layout::DEFAULT_LAYOUT {
                PageError::MissingDefaultLayout
            } else {
                PageError::MissingLayout(layout)
            };
            return Err(Failure::BeforeLayout(error));
        }

        // From here on a layout exists to frame any failure
        let fail = |error: PageError| Failure::AfterLayout {
            layout: layout.clone(),
            error,
        };

        self.registry
            .register_template_string(BODY_FRAGMENT, body.as_ref())
            .map_err(|e| fail(e.into()))?;

        let page = paths::page_name(&document.path);
        let root = paths::root_prefix(&document.path);
        let ctx = context::compose(
            &self.global,
            document.data.as_ref(),
            &parsed.attributes,
            &page,
            &layout,
            &root,
        );

        // These close over the page name, so every document re-registers them
        self.registry
            .register_helper("ifpage", Box::new(PageGuard::ifpage(&page)));
        self.registry
            .register_helper("unlesspage", Box::new(PageGuard::unlesspage(&page)));

        self.registry
            .render(&layout, &ctx)
            .map_err(|e| fail(e.into()))
    }

    /// Tier 1: re-render the resolved layout around an error fragment.
    ///
    /// Only `body` is replaced; helpers and other fragments keep whatever
    /// state existed at failure time. Falls through to the raw page when
    /// even the framed render fails.
    fn layout_error_page(&mut self, layout: &str, error: &PageError) -> String {
        let framed = self
            .registry
            .register_template_string(BODY_FRAGMENT, ERROR_BODY)
            .map_err(PageError::from)
            .and_then(|()| {
                self.registry
                    .render(layout, &json!({ "error": error.to_string() }))
                    .map_err(PageError::from)
            });

        framed.unwrap_or_else(|_| raw_error_page(error))
    }

    /// Drop all transient `layout-*` fragments from the registry.
    ///
    /// Runs at the start of every document so fragments declared by one
    /// page are never visible while rendering the next.
    fn purge_transient(&mut self) {
        let transient: Vec<String> = self
            .registry
            .get_templates()
            .keys()
            .filter(|name| name.starts_with(TRANSIENT_PREFIX))
            .cloned()
            .collect();
        for name in transient {
            self.registry.unregister_template(&name);
        }
    }
}

/// Tier 2: a self-contained error document, no engine involved.
fn raw_error_page(error: &PageError) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Render error</title></head>\n\
         <body>\n<pre class=\"render-error\">{}</pre>\n</body>\n</html>\n",
        html_escape(&error.to_string())
    )
}
