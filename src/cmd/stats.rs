//! Display knowledge graph metrics

use kg_note::{ConnectionGraph, Context, CorpusStats, Result};

pub fn run(ctx: &Context) -> Result<()> {
    let corpus = super::resolve::load_corpus(ctx)?;
    let graph = ConnectionGraph::from_corpus(&corpus);
    let stats = CorpusStats::compute(&corpus, &graph);

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Total number of notes: {}\n", stats.total_notes);

    println!("Tag distribution:");
    for (tag, count) in &stats.tag_distribution {
        println!("  {}: {}", tag, count);
    }
    println!();

    println!("Most connected notes:");
    for note in &stats.most_connected {
        println!("  {}: {} connections", note.title, note.connections);
    }
    println!();

    println!("Notes per month:");
    for (month, count) in &stats.notes_per_month {
        println!("  {}: {}", month, count);
    }
    println!();

    println!("Average note length: {:.2} characters", stats.average_length);
    Ok(())
}
