//! Full-text search
//!
//! The engine marks matches with `<mark>`; here they become bold yellow on a
//! terminal and are dropped otherwise.

use std::io::IsTerminal;

use kg_note::constants as C;
use kg_note::search::Query;
use kg_note::{Context, Result, SearchIndex};

const EMPHASIS_START: &str = "\x1b[1;33m";
const EMPHASIS_END: &str = "\x1b[0m";

pub fn run(ctx: &Context, query: Vec<String>, context: usize, limit: Option<usize>) -> Result<()> {
    let query = Query::parse(&query.join(" "))?;
    let index = SearchIndex::new(&ctx.root);
    let snapshot = index.ensure_ready()?;
    super::resolve::report_errors(&snapshot.errors);

    let mut hits = snapshot.search(&query, context);
    if let Some(limit) = limit {
        hits.truncate(limit);
    }

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No matches");
        return Ok(());
    }

    let color = std::io::stdout().is_terminal();
    for hit in &hits {
        println!("{} ({}) score {:.3}", hit.title, hit.id, hit.score);
        for excerpt in &hit.excerpts {
            println!("  {:?}: {}", excerpt.field, render_marks(&excerpt.text, color));
        }
    }
    Ok(())
}

fn render_marks(text: &str, color: bool) -> String {
    let (start, end) = if color { (EMPHASIS_START, EMPHASIS_END) } else { ("", "") };
    text.replace(C::MARK_START, start).replace(C::MARK_END, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_marks() {
        assert_eq!(render_marks("a <mark>b</mark> c", false), "a b c");
        assert_eq!(render_marks("<mark>b</mark>", true), "\x1b[1;33mb\x1b[0m");
    }
}
