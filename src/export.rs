//! JSON and CSV export
//!
//! Writers are generic so the CLI can target files while tests use buffers.

use std::io::Write;

use serde::Serialize;

use crate::constants as C;
use crate::corpus::Corpus;
use crate::error::Result;
use crate::frontmatter::Frontmatter;
use crate::graph::ConnectionGraph;
use crate::note::Note;

/// One note in the JSON export
#[derive(Debug, Serialize)]
pub struct NoteRecord<'a> {
    pub title: &'a str,
    pub filename: String,
    pub frontmatter: &'a Frontmatter,
    pub content: &'a str,
    pub connections: &'a [String],
    pub tags: &'a [String],
    pub date: Option<&'a str>,
}

impl<'a> From<&'a Note> for NoteRecord<'a> {
    fn from(note: &'a Note) -> Self {
        Self {
            title: note.title(),
            filename: note.filename(),
            frontmatter: &note.frontmatter,
            content: &note.body,
            connections: note.connections(),
            tags: note.tags(),
            date: note.frontmatter.date.as_deref(),
        }
    }
}

/// Pretty-printed JSON array of every note
pub fn write_json<W: Write>(corpus: &Corpus, mut writer: W) -> Result<()> {
    let records: Vec<NoteRecord<'_>> = corpus.iter().map(NoteRecord::from).collect();
    serde_json::to_writer_pretty(&mut writer, &records)?;
    writeln!(writer)?;
    Ok(())
}

/// `ID,Title,Filename,Tags,Date,LastMod`, tags joined with `|`
pub fn write_nodes_csv<W: Write>(corpus: &Corpus, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(C::CSV_NODE_HEADER)?;
    for note in corpus.iter() {
        let tags = note.tags().join(C::CSV_TAG_SEPARATOR);
        let filename = note.filename();
        let fm = &note.frontmatter;
        csv.write_record([
            note.id.as_str(),
            note.title(),
            filename.as_str(),
            tags.as_str(),
            fm.date.as_deref().unwrap_or_default(),
            fm.last_modified.as_deref().unwrap_or_default(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// `Source,Target`, one row per declared edge
pub fn write_edges_csv<W: Write>(graph: &ConnectionGraph, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(C::CSV_EDGE_HEADER)?;
    for edge in graph.export_edges() {
        csv.write_record([&edge.source, &edge.target])?;
    }
    csv.flush()?;
    Ok(())
}
