//! Generate a DOT or HTML graph description

use std::fs;

use kg_note::{ConnectionGraph, Context, GraphFormat, Result};

pub fn run(
    ctx: &Context,
    output: Option<String>,
    format: GraphFormat,
    layout: String,
    filter: Vec<String>,
) -> Result<()> {
    let corpus = super::resolve::load_corpus(ctx)?;
    let graph = ConnectionGraph::from_corpus(&corpus);
    let description = graph.to_graph_description(&filter, &layout)?;

    let (text, default_file) = match format {
        GraphFormat::Dot => (description.to_dot(), "knowledge_graph.dot"),
        GraphFormat::Html => (description.to_html()?, "knowledge_graph.html"),
    };
    let output = output.unwrap_or_else(|| default_file.to_string());

    if output == "-" {
        print!("{}", text);
        return Ok(());
    }
    fs::write(&output, text)?;
    println!(
        "Graph with {} nodes and {} edges saved to {}",
        description.nodes.len(),
        description.edges.len(),
        output
    );
    Ok(())
}
