//! Constants for kg-note
//!
//! This module contains the magic strings, field names and defaults shared by
//! the codec, the store, the graph and the search engine.

// === File and Directory Names ===

/// File extension for notes (without the dot)
pub const NOTE_EXTENSION: &str = "md";

/// Default notes directory name under the user's home
pub const DEFAULT_NOTES_DIR: &str = ".kg-notes";

/// Environment variable overriding the notes directory
pub const ENV_NOTES_DIR: &str = "KG_NOTES_DIR";

// === Document Format ===

/// Metadata block delimiter line
pub const DELIMITER: &str = "---";

/// Maximum size of frontmatter to parse (prevents DoS on malformed files)
pub const MAX_FRONTMATTER_SIZE: usize = 64 * 1024; // 64KB

// === Frontmatter Keys ===

pub const KEY_TITLE: &str = "title";
pub const KEY_DATE: &str = "date";
pub const KEY_LASTMOD: &str = "lastmod";
pub const KEY_CONNECTED_TO: &str = "connected_to";

// === Date Formats ===

/// Canonical date format stored in frontmatter: %Y-%m-%d
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Month bucket format used by statistics: %Y-%m
pub const MONTH_FORMAT: &str = "%Y-%m";

/// Date formats accepted (and rewritten to DATE_FORMAT) by normalization
pub const ACCEPTED_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%Y%m%d"];

// === Search ===

/// Characters of context shown on each side of a highlighted match
pub const DEFAULT_CONTEXT_WIDTH: usize = 50;

/// Opening highlight marker emitted around matched spans
pub const MARK_START: &str = "<mark>";

/// Closing highlight marker emitted around matched spans
pub const MARK_END: &str = "</mark>";

/// Field boost applied to title matches
pub const TITLE_BOOST: f64 = 2.0;

/// Field boost applied to tag matches
pub const TAGS_BOOST: f64 = 1.5;

/// Field boost applied to body matches
pub const CONTENT_BOOST: f64 = 1.0;

// === Graph ===

/// Name of the generated directed graph
pub const GRAPH_NAME: &str = "KnowledgeGraph";

/// Default Graphviz layout engine
pub const DEFAULT_LAYOUT: &str = "dot";

/// Layout engines accepted by the graph description
pub const LAYOUTS: &[&str] = &["dot", "neato", "fdp", "sfdp", "twopi", "circo"];

/// Number of entries in the "most connected" statistics section
pub const TOP_CONNECTED: usize = 5;

// === Export ===

/// Header row of the CSV node export
pub const CSV_NODE_HEADER: &[&str] = &["ID", "Title", "Filename", "Tags", "Date", "LastMod"];

/// Header row of the CSV edge export
pub const CSV_EDGE_HEADER: &[&str] = &["Source", "Target"];

/// Separator for tags inside a single CSV cell
pub const CSV_TAG_SEPARATOR: &str = "|";
