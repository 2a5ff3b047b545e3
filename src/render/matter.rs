//! Front matter splitting.
//!
//! A document may open with a TOML front matter block fenced by `+++`
//! lines:
//!
//! ```text
//! +++
//! title = "Hello"
//! layout = "post"
//! +++
//! <h1>{{title}}</h1>
//! ```
//!
//! Everything between the fences is TOML; everything after the closing
//! fence is the template body. A document without an opening fence has
//! empty attributes and its full text as body. A UTF-8 BOM is stripped
//! before the fence check.

use crate::utils::toml_to_json;
use serde_json::{Map, Value};
use thiserror::Error;

/// Front matter fence line.
const FENCE: &str = "+++";

/// Result of splitting a document into metadata and body.
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// Front matter attributes, page-local and immutable once parsed.
    pub attributes: Map<String, Value>,
    /// Template source; fragment extraction rewrites this before compile.
    pub body: String,
}

/// Front matter errors.
///
/// Any failure here is total: no partial attributes or body survive.
#[derive(Debug, Error)]
pub enum MatterError {
    #[error("front matter fence `+++` is never closed")]
    UnclosedFence,

    #[error("front matter parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Split raw document text into front matter attributes and body.
pub fn split(raw: &str) -> Result<ParsedPage, MatterError> {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    // The opening fence must be the very first line
    let Some(first) = text.split_inclusive('\n').next() else {
        return Ok(ParsedPage {
            attributes: Map::new(),
            body: String::new(),
        });
    };
    if first.trim_end() != FENCE {
        return Ok(ParsedPage {
            attributes: Map::new(),
            body: text.to_owned(),
        });
    }

    // Find the closing fence at the start of a subsequent line
    let matter_start = first.len();
    let mut idx = matter_start;
    let mut close: Option<(usize, usize)> = None;
    for line in text[matter_start..].split_inclusive('\n') {
        if line.trim_end() == FENCE {
            close = Some((idx, idx + line.len()));
            break;
        }
        idx += line.len();
    }
    let Some((matter_end, body_start)) = close else {
        return Err(MatterError::UnclosedFence);
    };

    let table: toml::Table = toml::from_str(&text[matter_start..matter_end])?;
    let attributes = match toml_to_json(table.into()) {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    Ok(ParsedPage {
        attributes,
        body: text[body_start..].to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_no_front_matter() {
        let page = split("<p>plain body</p>").unwrap();
        assert!(page.attributes.is_empty());
        assert_eq!(page.body, "<p>plain body</p>");
    }

    #[test]
    fn test_split_basic() {
        let page = split("+++\ntitle = \"Hi\"\n+++\n<p>body</p>").unwrap();
        assert_eq!(page.attributes.get("title"), Some(&json!("Hi")));
        assert_eq!(page.body, "<p>body</p>");
    }

    #[test]
    fn test_split_empty_front_matter() {
        let page = split("+++\n+++\nbody").unwrap();
        assert!(page.attributes.is_empty());
        assert_eq!(page.body, "body");
    }

    #[test]
    fn test_split_nested_table() {
        let page = split("+++\n[author]\nname = \"A\"\n+++\n").unwrap();
        assert_eq!(page.attributes.get("author"), Some(&json!({"name": "A"})));
    }

    #[test]
    fn test_split_strips_bom() {
        let page = split("\u{feff}+++\ntitle = \"Hi\"\n+++\nbody").unwrap();
        assert_eq!(page.attributes.get("title"), Some(&json!("Hi")));
        assert_eq!(page.body, "body");
    }

    #[test]
    fn test_split_crlf_fences() {
        let page = split("+++\r\ntitle = \"Hi\"\r\n+++\r\nbody").unwrap();
        assert_eq!(page.attributes.get("title"), Some(&json!("Hi")));
        assert_eq!(page.body, "body");
    }

    #[test]
    fn test_split_unclosed_fence() {
        assert!(matches!(
            split("+++\ntitle = \"Hi\"\nbody"),
            Err(MatterError::UnclosedFence)
        ));
    }

    #[test]
    fn test_split_malformed_toml() {
        assert!(matches!(
            split("+++\ntitle =\n+++\nbody"),
            Err(MatterError::Toml(_))
        ));
    }

    #[test]
    fn test_split_fence_not_first_line_is_body() {
        let page = split("intro\n+++\ntitle = \"Hi\"\n+++\n").unwrap();
        assert!(page.attributes.is_empty());
        assert!(page.body.starts_with("intro"));
    }

    #[test]
    fn test_split_closing_fence_at_eof() {
        let page = split("+++\ntitle = \"Hi\"\n+++").unwrap();
        assert_eq!(page.attributes.get("title"), Some(&json!("Hi")));
        assert_eq!(page.body, "");
    }

    #[test]
    fn test_split_empty_input() {
        let page = split("").unwrap();
        assert!(page.attributes.is_empty());
        assert_eq!(page.body, "");
    }
}
