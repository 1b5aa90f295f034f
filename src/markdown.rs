//! Markdown helpers using pulldown-cmark
//!
//! Only the pieces the store needs: finding code spans so rewrites leave
//! them alone, and turning `[[wiki links]]` into plain relative links.

use std::ops::Range;

use once_cell::sync::Lazy;
use pulldown_cmark::{Event, Parser, Tag};
use regex::{Captures, Regex};

/// `[[target]]`, `[[target#anchor]]`, `[[target|label]]`
static WIKI_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[([^\[\]|#]+)(#[^\[\]|]*)?(?:\|([^\[\]]+))?\]\]").expect("valid wiki link regex")
});

/// A wiki link found in markdown content
#[derive(Debug, Clone, PartialEq)]
pub struct WikiLink {
    /// Link target as written (note title or id)
    pub target: String,
    /// Anchor including the leading `#`, if any
    pub anchor: Option<String>,
    /// Display text after `|`, if any
    pub label: Option<String>,
    /// Byte range of the whole `[[...]]` in the content
    pub range: Range<usize>,
}

/// Byte ranges of fenced/indented code blocks and inline code spans
pub fn code_ranges(content: &str) -> Vec<Range<usize>> {
    Parser::new(content)
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Start(Tag::CodeBlock(_)) | Event::Code(_) => Some(range),
            _ => None,
        })
        .collect()
}

/// Extract wiki links outside of code
pub fn extract_wiki_links(content: &str) -> Vec<WikiLink> {
    let code = code_ranges(content);
    WIKI_LINK
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if in_code(&code, whole.start()) {
                return None;
            }
            Some(WikiLink {
                target: caps[1].trim().to_string(),
                anchor: caps.get(2).map(|m| m.as_str().to_string()),
                label: caps.get(3).map(|m| m.as_str().trim().to_string()),
                range: whole.range(),
            })
        })
        .collect()
}

/// Replace every wiki link outside code with `[label](<resolve(target)>#anchor)`
pub fn rewrite_wiki_links(content: &str, resolve: impl Fn(&str) -> String) -> String {
    let code = code_ranges(content);
    WIKI_LINK
        .replace_all(content, |caps: &Captures<'_>| {
            let whole = &caps[0];
            let start = caps.get(0).map(|m| m.start()).unwrap_or_default();
            if in_code(&code, start) {
                return whole.to_string();
            }
            let target = caps[1].trim();
            let label = caps.get(3).map(|m| m.as_str().trim()).unwrap_or(target);
            let anchor = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            format!("[{}]({}{})", label, resolve(target), anchor)
        })
        .into_owned()
}

fn in_code(code: &[Range<usize>], offset: usize) -> bool {
    code.iter().any(|r| r.contains(&offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_wiki_links() {
        let content = "See [[Graph Theory]] and [[rust#ownership|the book]].";
        let links = extract_wiki_links(content);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].target, "Graph Theory");
        assert_eq!(links[0].label, None);
        assert_eq!(links[1].target, "rust");
        assert_eq!(links[1].anchor.as_deref(), Some("#ownership"));
        assert_eq!(links[1].label.as_deref(), Some("the book"));
        assert_eq!(&content[links[0].range.clone()], "[[Graph Theory]]");
    }

    #[test]
    fn test_rewrite_wiki_links() {
        let content = "Read [[Graph Theory]] or [[Rust Lang#traits|traits]].";
        let out = rewrite_wiki_links(content, |t| format!("{}.md", t.to_lowercase().replace(' ', "-")));
        assert_eq!(
            out,
            "Read [Graph Theory](graph-theory.md) or [traits](rust-lang.md#traits)."
        );
    }

    #[test]
    fn test_rewrite_skips_code() {
        let content = "Inline `[[keep]]` here.\n\n```\n[[also keep]]\n```\n\n[[change]]\n";
        let out = rewrite_wiki_links(content, |t| format!("{t}.md"));
        assert!(out.contains("`[[keep]]`"));
        assert!(out.contains("[[also keep]]"));
        assert!(out.contains("[change](change.md)"));
    }

    #[test]
    fn test_code_ranges() {
        let content = "text `code` text";
        let ranges = code_ranges(content);
        assert_eq!(ranges.len(), 1);
        assert_eq!(&content[ranges[0].clone()], "`code`");
    }
}
