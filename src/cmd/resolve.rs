//! Shared helpers for commands: loading the corpus and reading input

use std::fs;
use std::io::{self, Read};

use kg_note::{Context, Corpus, FileError, Note, Result, display_path};

/// Load the corpus, reporting unreadable notes on stderr
pub fn load_corpus(ctx: &Context) -> Result<Corpus> {
    let report = ctx.store().load()?;
    report_errors(&report.errors);
    Ok(report.corpus)
}

/// Resolve a note reference against a loaded corpus
pub fn resolve_note<'a>(corpus: &'a Corpus, reference: &str) -> Result<&'a Note> {
    corpus.resolve_or_error(reference)
}

/// Print collected per-file errors, one per line
pub fn report_errors(errors: &[FileError]) {
    if errors.is_empty() {
        return;
    }
    eprintln!("Skipped {} file(s):", errors.len());
    for e in errors {
        eprintln!("  {}: {}", display_path(&e.path), e.error);
    }
}

/// Read from a file when given, otherwise from stdin (empty if no data)
pub fn read_input(file: Option<&str>) -> Result<String> {
    if let Some(path) = file {
        return Ok(fs::read_to_string(path)?);
    }
    let mut buffer = String::new();
    match io::stdin().read_to_string(&mut buffer) {
        Ok(_) => Ok(buffer),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}
