//! Report dangling and one-sided connections, optionally repairing the latter.
//! Wiki links in note bodies that match no note are listed too.

use kg_note::markdown;
use kg_note::{ConnectionGraph, Context, Resolved, Result};

pub fn run(ctx: &Context, repair: bool) -> Result<()> {
    let corpus = super::resolve::load_corpus(ctx)?;
    let mut graph = ConnectionGraph::from_corpus(&corpus);

    let dangling = graph.dangling_edges();
    let asymmetric = graph.asymmetric_edges();

    println!("Dangling connections: {}", dangling.len());
    for edge in &dangling {
        println!("  {} -> {} (missing)", edge.source, edge.target);
    }
    println!("One-sided connections: {}", asymmetric.len());
    for edge in &asymmetric {
        println!("  {} -> {} (no reverse edge)", edge.source, edge.target);
    }

    let duplicates = graph.clone().dedupe();
    println!("Repeated connections: {}", duplicates);

    let broken: Vec<(&str, String)> = corpus
        .iter()
        .flat_map(|note| {
            markdown::extract_wiki_links(&note.body)
                .into_iter()
                .map(move |link| (note.id.as_str(), link.target))
        })
        .filter(|(_, target)| matches!(corpus.resolve(target), Resolved::NotFound))
        .collect();
    println!("Broken wiki links: {}", broken.len());
    for (id, target) in &broken {
        println!("  {}: [[{}]]", id, target);
    }

    if repair && !asymmetric.is_empty() {
        let report = graph.reconcile(&ctx.store());
        for edge in &report.repaired {
            println!("Repaired {} -> {}", edge.source, edge.target);
        }
        super::resolve::report_errors(&report.errors);
    }
    Ok(())
}
