//! Inline fragment extraction.
//!
//! Pages may declare reusable template fragments inline:
//!
//! ```text
//! {{#*inline "layout-nav"}}<nav>…</nav>{{/inline}}
//! ```
//!
//! Before the page body is compiled, every such declaration is lifted out
//! of the body and handed back as a named fragment so the layout can embed
//! it with `{{> layout-nav}}`. Only names carrying the `layout-` prefix
//! are lifted; the prefix marks the fragment as transient, scoped to the
//! declaring document's render.
//!
//! The scan is a small hand-rolled state machine rather than a regex:
//! comment regions (`{{!-- … --}}` and `{{! … }}`) are computed first and
//! excluded, quote characters must pair exactly, `~` trim markers are
//! accepted on both tags, and nested opens are depth-counted. Malformed
//! or unterminated declarations simply fail to match and stay in the body
//! verbatim; they surface later as template syntax errors.

use std::borrow::Cow;
use std::ops::Range;

/// Registry names with this prefix are transient, purged per document.
pub const TRANSIENT_PREFIX: &str = "layout-";

/// Opening marker, plain and whitespace-trim variants.
const OPEN: &str = "{{#*inline";
const OPEN_TRIM: &str = "{{~#*inline";

/// An inline declaration lifted out of a page body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineFragment {
    /// Full fragment name including the `layout-` prefix.
    pub name: String,
    /// Template text between the opening and closing tags.
    pub source: String,
}

/// Scan a page body for inline fragment declarations.
///
/// Returns the body with every matched declaration removed (borrowing the
/// input when nothing matched) plus the extracted fragments in source
/// order. Declarations inside template comments are neither extracted nor
/// removed.
pub fn extract(body: &str) -> (Cow<'_, str>, Vec<InlineFragment>) {
    // Fast path: no opening marker at all, skip the full scan
    if !body.contains(OPEN) && !body.contains(OPEN_TRIM) {
        return (Cow::Borrowed(body), Vec::new());
    }

    let comments = comment_spans(body);
    let mut fragments = Vec::new();
    let mut removed: Vec<Range<usize>> = Vec::new();

    let mut cursor = 0;
    while let Some((start, after_marker)) = find_open(body, cursor) {
        if in_comment(&comments, start) {
            cursor = after_marker;
            continue;
        }

        let Some((name, body_start)) = parse_header(body, after_marker) else {
            // Malformed header: leave verbatim, keep scanning after it
            cursor = after_marker;
            continue;
        };
        if !name.starts_with(TRANSIENT_PREFIX) {
            cursor = after_marker;
            continue;
        }

        let Some((body_end, close_end)) = find_close(body, body_start, &comments) else {
            // Unterminated: leave verbatim
            cursor = after_marker;
            continue;
        };

        let end = consume_trailing_newline(body, close_end);
        fragments.push(InlineFragment {
            name: name.to_owned(),
            source: body[body_start..body_end].to_owned(),
        });
        removed.push(start..end);
        cursor = close_end;
    }

    if removed.is_empty() {
        return (Cow::Borrowed(body), fragments);
    }

    // Replacements apply to the original text, left to right
    let mut out = String::with_capacity(body.len());
    let mut last = 0;
    for range in &removed {
        out.push_str(&body[last..range.start]);
        last = range.end;
    }
    out.push_str(&body[last..]);
    (Cow::Owned(out), fragments)
}

/// Find the next opening marker at or after `from`.
///
/// Returns `(marker_start, after_marker)` for whichever of the plain and
/// trim variants occurs first.
fn find_open(text: &str, from: usize) -> Option<(usize, usize)> {
    let plain = text[from..].find(OPEN).map(|p| (from + p, OPEN.len()));
    let trim = text[from..]
        .find(OPEN_TRIM)
        .map(|p| (from + p, OPEN_TRIM.len()));

    match (plain, trim) {
        (Some((a, al)), Some((b, bl))) => {
            if a <= b {
                Some((a, a + al))
            } else {
                Some((b, b + bl))
            }
        }
        (Some((a, al)), None) => Some((a, a + al)),
        (None, Some((b, bl))) => Some((b, b + bl)),
        (None, None) => None,
    }
}

/// Parse the remainder of an opening tag after the `#*inline` marker.
///
/// Expects whitespace, a quoted name (`"` or `'`, same character on both
/// ends, `[A-Za-z0-9_-]+` inside), optional whitespace, an optional `~`
/// trim marker, then `}}`. Returns the name and the index just past the
/// closing braces, or `None` when anything is off.
fn parse_header(text: &str, mut i: usize) -> Option<(&str, usize)> {
    let bytes = text.as_bytes();

    let ws_start = i;
    while bytes.get(i).is_some_and(|b| b.is_ascii_whitespace()) {
        i += 1;
    }
    if i == ws_start {
        return None;
    }

    let quote = *bytes.get(i)?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    i += 1;

    let name_start = i;
    while bytes
        .get(i)
        .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_' || *b == b'-')
    {
        i += 1;
    }
    if i == name_start {
        return None;
    }
    // The closing quote must match the opening one exactly
    if bytes.get(i) != Some(&quote) {
        return None;
    }
    let name = &text[name_start..i];
    i += 1;

    while bytes.get(i).is_some_and(|b| *b == b' ' || *b == b'\t') {
        i += 1;
    }
    if bytes.get(i) == Some(&b'~') {
        i += 1;
    }
    if !text[i..].starts_with("}}") {
        return None;
    }

    Some((name, i + 2))
}

/// Parse a closing tag (`{{/inline}}`, `~` accepted after `{{` and before
/// `}}`) at position `i`. Returns the index past the tag.
fn parse_close(text: &str, mut i: usize) -> Option<usize> {
    if !text[i..].starts_with("{{") {
        return None;
    }
    i += 2;
    if text[i..].starts_with('~') {
        i += 1;
    }
    if !text[i..].starts_with("/inline") {
        return None;
    }
    i += "/inline".len();

    let bytes = text.as_bytes();
    while bytes.get(i).is_some_and(|b| *b == b' ' || *b == b'\t') {
        i += 1;
    }
    if bytes.get(i) == Some(&b'~') {
        i += 1;
    }
    if !text[i..].starts_with("}}") {
        return None;
    }
    Some(i + 2)
}

/// Find the closing tag matching an already-parsed open, depth-counting
/// nested opens. Tags inside comment regions do not count.
///
/// Returns `(body_end, close_end)`: the index where the fragment body
/// stops and the index just past the closing tag.
fn find_close(text: &str, from: usize, comments: &[Range<usize>]) -> Option<(usize, usize)> {
    let mut depth = 1usize;
    let mut i = from;

    while let Some(pos) = text[i..].find("{{") {
        let at = i + pos;
        if in_comment(comments, at) {
            i = at + 2;
            continue;
        }

        if let Some((_, after)) = find_open(text, at).filter(|(start, _)| *start == at) {
            // Only a well-formed header opens a nested block; bare marker
            // text in prose stays part of the body
            if let Some((_, body_start)) = parse_header(text, after) {
                depth += 1;
                i = body_start;
            } else {
                i = after;
            }
            continue;
        }
        if let Some(after) = parse_close(text, at) {
            depth -= 1;
            if depth == 0 {
                return Some((at, after));
            }
            i = after;
            continue;
        }
        i = at + 2;
    }
    None
}

/// Compute the comment regions of a template.
///
/// Handlebars has two comment forms: `{{!-- … --}}`, which may contain
/// `}}`, and `{{! … }}`, which may not. An unterminated comment runs to
/// the end of the text.
fn comment_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut i = 0;

    while let Some(pos) = text[i..].find("{{!") {
        let start = i + pos;
        let (skip, closer) = if text[start..].starts_with("{{!--") {
            ("{{!--".len(), "--}}")
        } else {
            ("{{!".len(), "}}")
        };

        match text[start + skip..].find(closer) {
            Some(rel) => {
                let end = start + skip + rel + closer.len();
                spans.push(start..end);
                i = end;
            }
            None => {
                spans.push(start..text.len());
                break;
            }
        }
    }
    spans
}

fn in_comment(spans: &[Range<usize>], idx: usize) -> bool {
    spans.iter().any(|span| span.contains(&idx))
}

/// Swallow trailing spaces/tabs and at most one newline after a match.
fn consume_trailing_newline(text: &str, mut i: usize) -> usize {
    let bytes = text.as_bytes();
    while bytes.get(i).is_some_and(|b| *b == b' ' || *b == b'\t') {
        i += 1;
    }
    if bytes.get(i) == Some(&b'\r') && bytes.get(i + 1) == Some(&b'\n') {
        i += 2;
    } else if bytes.get(i) == Some(&b'\n') {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(fragments: &[InlineFragment]) -> Vec<&str> {
        fragments.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_extract_basic() {
        let (body, frags) =
            extract("{{#*inline \"layout-nav\"}}Hi{{/inline}}\n<p>rest</p>");
        assert_eq!(body, "<p>rest</p>");
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].name, "layout-nav");
        assert_eq!(frags[0].source, "Hi");
    }

    #[test]
    fn test_extract_fast_path_borrows() {
        let (body, frags) = extract("<p>no declarations here</p>");
        assert!(matches!(body, Cow::Borrowed(_)));
        assert!(frags.is_empty());
    }

    #[test]
    fn test_extract_single_quotes() {
        let (body, frags) = extract("{{#*inline 'layout-aside'}}x{{/inline}}rest");
        assert_eq!(body, "rest");
        assert_eq!(names(&frags), ["layout-aside"]);
    }

    #[test]
    fn test_extract_mismatched_quotes_left_untouched() {
        let input = "{{#*inline \"layout-nav'}}Hi{{/inline}}";
        let (body, frags) = extract(input);
        assert_eq!(body, input);
        assert!(frags.is_empty());
    }

    #[test]
    fn test_extract_trim_markers() {
        let (body, frags) =
            extract("{{~#*inline \"layout-nav\" ~}}Hi{{~/inline ~}}\nrest");
        assert_eq!(body, "rest");
        assert_eq!(frags[0].source, "Hi");
    }

    #[test]
    fn test_extract_commented_out_declaration_kept() {
        let input = "{{!-- {{#*inline \"layout-nav\"}}Hi{{/inline}} --}}\nvisible";
        let (body, frags) = extract(input);
        assert_eq!(body, input);
        assert!(frags.is_empty());
    }

    #[test]
    fn test_extract_short_comment_form() {
        let input = "{{! {{#*inline \"layout-x\"}} }}text";
        let (body, frags) = extract(input);
        assert_eq!(body, input);
        assert!(frags.is_empty());
    }

    #[test]
    fn test_extract_comment_then_real_declaration() {
        let input = "{{!-- {{#*inline \"layout-a\"}}no{{/inline}} --}}\n\
                     {{#*inline \"layout-b\"}}yes{{/inline}}\nrest";
        let (body, frags) = extract(input);
        assert_eq!(names(&frags), ["layout-b"]);
        assert!(body.contains("layout-a"));
        assert!(!body.contains("layout-b"));
    }

    #[test]
    fn test_extract_multiple_declarations() {
        let (body, frags) = extract(
            "{{#*inline \"layout-a\"}}A{{/inline}}\n\
             middle\n\
             {{#*inline \"layout-b\"}}B{{/inline}}\n\
             end",
        );
        assert_eq!(body, "middle\nend");
        assert_eq!(names(&frags), ["layout-a", "layout-b"]);
    }

    #[test]
    fn test_extract_unterminated_left_verbatim() {
        let input = "{{#*inline \"layout-nav\"}}never closed";
        let (body, frags) = extract(input);
        assert_eq!(body, input);
        assert!(frags.is_empty());
    }

    #[test]
    fn test_extract_invalid_name_chars_left_verbatim() {
        let input = "{{#*inline \"layout-na v\"}}Hi{{/inline}}";
        let (body, frags) = extract(input);
        assert_eq!(body, input);
        assert!(frags.is_empty());
    }

    #[test]
    fn test_extract_non_transient_name_left_verbatim() {
        // Inline blocks without the layout- prefix are not ours to lift
        let input = "{{#*inline \"sidebar\"}}Hi{{/inline}}";
        let (body, frags) = extract(input);
        assert_eq!(body, input);
        assert!(frags.is_empty());
    }

    #[test]
    fn test_extract_nested_inline_depth_counted() {
        let (body, frags) = extract(
            "{{#*inline \"layout-outer\"}}a{{#*inline \"layout-inner\"}}b{{/inline}}c{{/inline}}rest",
        );
        assert_eq!(body, "rest");
        assert_eq!(names(&frags), ["layout-outer"]);
        assert_eq!(
            frags[0].source,
            "a{{#*inline \"layout-inner\"}}b{{/inline}}c"
        );
    }

    #[test]
    fn test_extract_literal_marker_text_in_fragment_body() {
        // A bare opening marker in prose has no valid header; it must not
        // count as a nested block and swallow the real closing tag
        let (body, frags) =
            extract("{{#*inline \"layout-a\"}}say {{#*inline literally{{/inline}}rest");
        assert_eq!(body, "rest");
        assert_eq!(names(&frags), ["layout-a"]);
        assert_eq!(frags[0].source, "say {{#*inline literally");
    }

    #[test]
    fn test_extract_removes_trailing_newline_only_once() {
        let (body, _) = extract("{{#*inline \"layout-a\"}}A{{/inline}}\n\nrest");
        assert_eq!(body, "\nrest");
    }

    #[test]
    fn test_extract_crlf_trailing() {
        let (body, _) = extract("{{#*inline \"layout-a\"}}A{{/inline}}\r\nrest");
        assert_eq!(body, "rest");
    }

    #[test]
    fn test_extract_fragment_body_with_expressions() {
        let (_, frags) =
            extract("{{#*inline \"layout-nav\"}}<a href=\"{{root}}\">{{title}}</a>{{/inline}}");
        assert_eq!(frags[0].source, "<a href=\"{{root}}\">{{title}}</a>");
    }

    #[test]
    fn test_comment_spans_unterminated() {
        let spans = comment_spans("before {{!-- never closed");
        assert_eq!(spans, vec![7..25]);
    }

    #[test]
    fn test_comment_spans_both_forms() {
        let text = "{{! a }} mid {{!-- b --}}";
        let spans = comment_spans(text);
        assert_eq!(spans.len(), 2);
        assert_eq!(&text[spans[0].clone()], "{{! a }}");
        assert_eq!(&text[spans[1].clone()], "{{!-- b --}}");
    }
}
