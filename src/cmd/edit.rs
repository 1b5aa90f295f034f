//! Replace a note's full text
//!
//! The new text comes from `--file` or stdin. The note keeps its id even if
//! the title changes.

use kg_note::{ConnectionGraph, Context, Result, display_path};

pub fn run(ctx: &Context, note: String, file: Option<String>) -> Result<()> {
    let corpus = super::resolve::load_corpus(ctx)?;
    let current = super::resolve::resolve_note(&corpus, &note)?;
    let text = super::resolve::read_input(file.as_deref())?;

    let updated = ctx.store().edit(current, &text)?;
    println!("Note '{}' updated: {}", updated.title(), display_path(&updated.path));

    if updated.title() != current.title() {
        let graph = ConnectionGraph::from_corpus(&corpus);
        let backlinks = graph.backlinks(&updated.id);
        if !backlinks.is_empty() {
            println!("Id '{}' kept; still linked from: {}", updated.id, backlinks.join(", "));
        }
    }
    Ok(())
}
