//! Page-scoped template helpers.
//!
//! `{{#ifpage "index"}}…{{/ifpage}}` renders its block only on the named
//! page; `unlesspage` is the negation. Both close over the current
//! document's page name, so the orchestrator re-registers them for every
//! document it renders.

use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext, Renderable,
};

/// Block helper comparing its argument against the current page name.
pub struct PageGuard {
    page: String,
    negate: bool,
}

impl PageGuard {
    /// `ifpage`: render the block when the argument equals the page name.
    pub fn ifpage(page: &str) -> Self {
        Self {
            page: page.to_owned(),
            negate: false,
        }
    }

    /// `unlesspage`: render the block when the argument differs.
    pub fn unlesspage(page: &str) -> Self {
        Self {
            page: page.to_owned(),
            negate: true,
        }
    }
}

impl HelperDef for PageGuard {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'reg, 'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let requested = h.param(0).and_then(|p| p.value().as_str()).unwrap_or("");
        let matched = (requested == self.page) != self.negate;

        let branch = if matched { h.template() } else { h.inverse() };
        if let Some(template) = branch {
            template.render(r, ctx, rc, out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry_for(page: &str) -> Handlebars<'static> {
        let mut registry = Handlebars::new();
        registry.register_helper("ifpage", Box::new(PageGuard::ifpage(page)));
        registry.register_helper("unlesspage", Box::new(PageGuard::unlesspage(page)));
        registry
    }

    #[test]
    fn test_ifpage_matches() {
        let registry = registry_for("index");
        let out = registry
            .render_template("{{#ifpage \"index\"}}home{{/ifpage}}", &json!({}))
            .unwrap();
        assert_eq!(out, "home");
    }

    #[test]
    fn test_ifpage_no_match() {
        let registry = registry_for("about");
        let out = registry
            .render_template("{{#ifpage \"index\"}}home{{/ifpage}}", &json!({}))
            .unwrap();
        assert_eq!(out, "");
    }

    #[test]
    fn test_ifpage_else_branch() {
        let registry = registry_for("about");
        let out = registry
            .render_template(
                "{{#ifpage \"index\"}}home{{else}}elsewhere{{/ifpage}}",
                &json!({}),
            )
            .unwrap();
        assert_eq!(out, "elsewhere");
    }

    #[test]
    fn test_unlesspage_negates() {
        let registry = registry_for("about");
        let out = registry
            .render_template("{{#unlesspage \"index\"}}not home{{/unlesspage}}", &json!({}))
            .unwrap();
        assert_eq!(out, "not home");
    }

    #[test]
    fn test_unlesspage_suppressed_on_named_page() {
        let registry = registry_for("index");
        let out = registry
            .render_template("{{#unlesspage \"index\"}}not home{{/unlesspage}}", &json!({}))
            .unwrap();
        assert_eq!(out, "");
    }

    #[test]
    fn test_ifpage_missing_argument_never_matches() {
        let registry = registry_for("index");
        let out = registry
            .render_template("{{#ifpage}}x{{else}}y{{/ifpage}}", &json!({}))
            .unwrap();
        assert_eq!(out, "y");
    }
}
