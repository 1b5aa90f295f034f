//! Export notes to JSON or CSV files

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use kg_note::export;
use kg_note::{ConnectionGraph, Context, ExportFormat, Result, display_path};

const JSON_FILE: &str = "knowledge_graph_export.json";
const NODES_FILE: &str = "knowledge_graph_nodes.csv";
const EDGES_FILE: &str = "knowledge_graph_edges.csv";

pub fn run(ctx: &Context, format: ExportFormat, output: String) -> Result<()> {
    let corpus = super::resolve::load_corpus(ctx)?;
    let dir = Path::new(&output);
    fs::create_dir_all(dir)?;

    match format {
        ExportFormat::Json => {
            let path = dir.join(JSON_FILE);
            export::write_json(&corpus, BufWriter::new(File::create(&path)?))?;
            println!("Exported {} notes to {}", corpus.len(), display_path(&path));
        }
        ExportFormat::Csv => {
            let nodes = dir.join(NODES_FILE);
            let edges = dir.join(EDGES_FILE);
            export::write_nodes_csv(&corpus, File::create(&nodes)?)?;
            let graph = ConnectionGraph::from_corpus(&corpus);
            export::write_edges_csv(&graph, File::create(&edges)?)?;
            println!(
                "Exported {} notes to {} and {}",
                corpus.len(),
                display_path(&nodes),
                display_path(&edges)
            );
        }
    }
    Ok(())
}
