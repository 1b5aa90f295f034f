//! Excerpts with marked matches
//!
//! Context widths count characters, not bytes. Windows that overlap or touch
//! are merged into one excerpt.

use std::iter;
use std::ops::Range;

use crate::constants as C;

const ELLIPSIS: &str = "…";

/// Excerpts of `text` around each byte span in `spans`, matches wrapped in
/// `<mark>`/`</mark>`, `width` characters of context on each side
pub fn highlight(text: &str, spans: &[Range<usize>], width: usize) -> Vec<String> {
    let spans = merge(spans.to_vec());
    if spans.is_empty() {
        return Vec::new();
    }

    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(iter::once(text.len()))
        .collect();
    let char_count = offsets.len() - 1;
    let to_char = |byte: usize| offsets.partition_point(|&o| o < byte);

    // (char window, spans inside it)
    let mut windows: Vec<(Range<usize>, Vec<Range<usize>>)> = Vec::new();
    for span in spans {
        let start = to_char(span.start).saturating_sub(width);
        let end = to_char(span.end).saturating_add(width).min(char_count);
        match windows.last_mut() {
            Some((window, inside)) if start <= window.end => {
                window.end = window.end.max(end);
                inside.push(span);
            }
            _ => windows.push((start..end, vec![span])),
        }
    }

    windows
        .into_iter()
        .map(|(window, inside)| {
            let (from, to) = (offsets[window.start], offsets[window.end]);
            let mut out = String::new();
            if window.start > 0 {
                out.push_str(ELLIPSIS);
            }
            let mut cursor = from;
            for span in inside {
                out.push_str(&text[cursor..span.start]);
                out.push_str(C::MARK_START);
                out.push_str(&text[span.clone()]);
                out.push_str(C::MARK_END);
                cursor = span.end;
            }
            out.push_str(&text[cursor..to]);
            if window.end < char_count {
                out.push_str(ELLIPSIS);
            }
            out
        })
        .collect()
}

/// Sort spans and fuse the ones that overlap or touch
fn merge(mut spans: Vec<Range<usize>>) -> Vec<Range<usize>> {
    spans.retain(|s| !s.is_empty());
    spans.sort_by_key(|s| (s.start, s.end));
    let mut out: Vec<Range<usize>> = Vec::with_capacity(spans.len());
    for span in spans {
        match out.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => out.push(span),
        }
    }
    out
}
