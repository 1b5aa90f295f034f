use clap::{Parser, Subcommand, ValueEnum};

use crate::constants as C;
use crate::corpus::SortKey;

/// kg - A knowledge-graph note tool
///
/// # Quick Reference
///
/// ```bash
/// kg add "Graph Theory" -t math -t graphs     # Create a note (body from stdin)
/// kg import ~/Downloads/idea.md                # Copy an external note in
/// kg connect "Graph Theory" rust               # Link two notes both ways
/// kg edit graph-theory < new.md                # Replace a note's full text
/// kg list --sort date --reverse --tag math     # List notes
/// kg search "+graph -draft theory"             # Full-text search
/// kg stats                                     # Corpus metrics
/// kg export csv -o out/                        # JSON or CSV export
/// kg visualize -f html -o graph.html           # DOT or HTML graph
/// kg frontmatter normalize                     # Canonical dates and tags
/// kg check --repair                            # Report/fix graph problems
/// ```
///
/// ## Notes Directory
///
/// `--dir` > `$KG_NOTES_DIR` > `~/.kg-notes`
///
/// ## Note References
///
/// Notes can be referenced by id (`graph-theory`), title (`"Graph Theory"`,
/// case-insensitive) or a unique id prefix (`graph-t`).
#[derive(Parser, Debug)]
#[command(name = "kg")]
#[command(version)]
#[command(about = "A knowledge-graph note tool")]
pub struct Cli {
    /// Notes directory (default: ~/.kg-notes or $KG_NOTES_DIR)
    #[arg(long, global = true, value_name = "PATH")]
    pub dir: Option<String>,

    /// Output in JSON format (for scripting)
    #[arg(short = 'j', long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new note
    Add {
        /// Note title
        title: String,

        /// Tag to attach (repeatable)
        #[arg(short, long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Body text (read from stdin when omitted)
        #[arg(short, long)]
        content: Option<String>,
    },

    /// Copy an external markdown file into the notes directory
    Import {
        /// File to import
        file: String,
    },

    /// Connect two notes in both directions
    Connect {
        /// First note reference
        first: String,

        /// Second note reference
        second: String,
    },

    /// Replace a note's full text (read from stdin or --file)
    Edit {
        /// Note reference
        note: String,

        /// Read the new text from this file instead of stdin
        #[arg(short, long)]
        file: Option<String>,
    },

    /// List notes
    #[command(alias = "ls")]
    List {
        /// Sort field
        #[arg(short, long, value_enum, default_value_t = SortKey::Title)]
        sort: SortKey,

        /// Reverse sort order
        #[arg(short, long)]
        reverse: bool,

        /// Only notes with this tag
        #[arg(short = 't', long)]
        tag: Option<String>,
    },

    /// Full-text search: +must -must_not should
    Search {
        /// Query terms
        #[arg(required = true, allow_hyphen_values = true, trailing_var_arg = true)]
        query: Vec<String>,

        /// Characters of context around each match
        #[arg(short, long, default_value_t = C::DEFAULT_CONTEXT_WIDTH)]
        context: usize,

        /// Maximum number of hits to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show corpus statistics
    Stats,

    /// Export notes to JSON or CSV
    Export {
        /// Output format
        #[arg(value_enum)]
        format: ExportFormat,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: String,
    },

    /// Generate a graph description
    Visualize {
        /// Output file
        #[arg(short, long)]
        output: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = GraphFormat::Dot)]
        format: GraphFormat,

        /// Graph layout algorithm (dot, neato, fdp, sfdp, twopi, circo)
        #[arg(short, long, default_value = C::DEFAULT_LAYOUT)]
        layout: String,

        /// Only include notes with any of these tags
        #[arg(short = 't', long = "filter", value_delimiter = ',')]
        filter: Vec<String>,
    },

    /// Update and normalize frontmatter
    #[command(subcommand)]
    Frontmatter(FrontmatterCommand),

    /// Report dangling and one-sided connections
    Check {
        /// Write the missing reverse edges
        #[arg(long)]
        repair: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum FrontmatterCommand {
    /// Normalize dates and tags across all notes
    Normalize,

    /// Set a field to a value (YAML scalar or list)
    Set {
        /// Note reference
        note: String,
        /// Field name
        key: String,
        /// New value, parsed as YAML
        value: String,
    },

    /// Append a value to a list field
    Append {
        /// Note reference
        note: String,
        /// Field name
        key: String,
        /// Value to append
        value: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Dot,
    Html,
}
