//! Render pipeline error types.

use crate::render::matter::MatterError;
use thiserror::Error;

/// Everything that can go wrong while rendering one document.
///
/// Every variant triggers the orchestrator's fallback tiers; none of them
/// leaves a document without output.
#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Matter(#[from] MatterError),

    #[error("no `default` layout is defined")]
    MissingDefaultLayout,

    #[error("no such layout `{0}`")]
    MissingLayout(String),

    #[error("template compile error: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("render error: {0}")]
    Render(#[from] handlebars::RenderError),
}
