pub mod cli;
pub mod config;
pub mod constants;
pub mod corpus;
pub mod error;
pub mod export;
pub mod frontmatter;
pub mod graph;
pub mod markdown;
pub mod note;
pub mod search;
pub mod stats;
pub mod store;

pub use cli::{Cli, Command, FrontmatterCommand, ExportFormat, GraphFormat};
pub use config::{Context, display_path, notes_path};
pub use corpus::{Corpus, Resolved, SortKey};
pub use error::{Error, FileError, Result};
pub use frontmatter::{Document, Frontmatter};
pub use graph::{ConnectionGraph, Edge, GraphDescription};
pub use note::Note;
pub use search::{SearchHit, SearchIndex};
pub use stats::CorpusStats;
pub use store::{LoadReport, NoteStore};
