//! Note store: the notes directory on disk
//!
//! Loading walks the directory and parses every note in parallel. A broken
//! file never aborts a load; it is reported as a [`FileError`] next to the
//! notes that did parse. Single-note writes (create, import, edit, field
//! updates) fail fast and touch at most one file each.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde_yaml::Value;
use walkdir::{DirEntry, WalkDir};

use crate::constants as C;
use crate::corpus::Corpus;
use crate::error::{Error, FileError, Result};
use crate::frontmatter::{self, Frontmatter};
use crate::markdown;
use crate::note::{self, Note};

/// Result of loading a directory
#[derive(Debug, Default)]
pub struct LoadReport {
    pub corpus: Corpus,
    pub errors: Vec<FileError>,
}

/// Result of a bulk normalization pass
#[derive(Debug, Default)]
pub struct NormalizeReport {
    pub changed: Vec<PathBuf>,
    pub unchanged: usize,
    pub errors: Vec<FileError>,
}

/// Handle on a notes directory
#[derive(Debug, Clone)]
pub struct NoteStore {
    root: PathBuf,
}

impl NoteStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where a note with this id lives (top level of the directory)
    pub fn note_path(&self, id: &str) -> PathBuf {
        self.root.join(note::file_name_for(id))
    }

    /// Find every note file, skipping hidden directories.
    ///
    /// Entries are visited in file-name order so repeated loads agree.
    pub fn discover(&self) -> Result<(Vec<PathBuf>, Vec<FileError>)> {
        if !self.root.is_dir() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("notes directory not found: {}", self.root.display()),
            )));
        }

        let mut paths = Vec::new();
        let mut errors = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && note::is_note_file(entry.path()) {
                        paths.push(entry.into_path());
                    }
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
                    warn!("skipping unreadable entry {}: {}", path.display(), e);
                    errors.push(FileError::new(path, e));
                }
            }
        }

        Ok((paths, errors))
    }

    /// Load every note, collecting per-file failures
    pub fn load(&self) -> Result<LoadReport> {
        let (paths, mut errors) = self.discover()?;
        debug!("loading {} note files from {}", paths.len(), self.root.display());

        let parsed: Vec<std::result::Result<Note, FileError>> = paths
            .par_iter()
            .map(|path| self.read_note(path).map_err(|e| FileError::new(path, e)))
            .collect();

        let mut notes = Vec::with_capacity(parsed.len());
        for result in parsed {
            match result {
                Ok(note) => notes.push(note),
                Err(e) => errors.push(e),
            }
        }

        let (corpus, duplicates) = Corpus::new(notes);
        for dup in duplicates {
            errors.push(FileError::new(dup.path.clone(), Error::Conflict(dup.id)));
        }

        for e in &errors {
            warn!("{}", e);
        }
        info!("loaded {} notes ({} errors)", corpus.len(), errors.len());

        Ok(LoadReport { corpus, errors })
    }

    /// Read and parse one note file
    pub fn read_note(&self, path: &Path) -> Result<Note> {
        let text = fs::read_to_string(path)?;
        Note::parse(path, &text)
    }

    /// Create a new note and return its id.
    ///
    /// Tags and body are accepted as plain strings whatever their origin;
    /// suggested tags go through the same checks as typed ones.
    pub fn create(&self, title: &str, tags: &[String], body: &str) -> Result<String> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::Validation("title must not be empty".to_string()));
        }
        if title.contains('\n') {
            return Err(Error::Validation("title must be a single line".to_string()));
        }
        let tags = clean_tags(tags)?;
        let id = note::note_id(title);
        note::validate_id(&id)?;

        let metadata = Frontmatter::new(title, tags, today());
        let text = frontmatter::serialize(&metadata, title, body)?;

        self.ensure_id_free(&id)?;
        fs::create_dir_all(&self.root)?;
        write_new(&self.note_path(&id), &id, &text)?;
        info!("created note {}", id);
        Ok(id)
    }

    /// Copy an external markdown file into the corpus.
    ///
    /// The file must parse and carry `title` and `date`. Wiki links in its
    /// body are rewritten to relative links into the notes directory. Nothing
    /// is written unless every check passes.
    pub fn import_external(&self, source: &Path) -> Result<String> {
        let text = fs::read_to_string(source)?;
        let doc = frontmatter::parse(&text)?;
        doc.frontmatter.validate()?;

        let title = doc.frontmatter.title().unwrap_or_default().to_string();
        let id = note::note_id(&title);
        note::validate_id(&id)?;

        if self.is_inside(source) {
            return Err(Error::Conflict(id));
        }
        self.ensure_id_free(&id)?;
        let dest = self.note_path(&id);

        let body = markdown::rewrite_wiki_links(&doc.body, |target| {
            note::file_name_for(&note::note_id(target))
        });
        let out = frontmatter::serialize(&doc.frontmatter, &title, &body)?;

        fs::create_dir_all(&self.root)?;
        write_new(&dest, &id, &out)?;
        info!("imported {} as {}", source.display(), id);
        Ok(id)
    }

    /// Replace a note with new full text.
    ///
    /// The id (and file) never change, even when the title does. `lastmod`
    /// is set to today.
    pub fn edit(&self, note: &Note, text: &str) -> Result<Note> {
        let doc = frontmatter::parse(text)?;
        doc.frontmatter.validate()?;

        let stamp = today().format(C::DATE_FORMAT).to_string();
        let updated = frontmatter::set_field(text, C::KEY_LASTMOD, Value::String(stamp))?;
        fs::write(&note.path, &updated)?;

        if doc.frontmatter.title() != Some(note.title()) {
            info!("note {} retitled; id kept", note.id);
        }
        info!("edited note {}", note.id);
        Note::parse(&note.path, &updated)
    }

    /// Append `value` under `key` in one note file
    pub fn update_field(&self, path: &Path, key: &str, value: &str) -> Result<()> {
        let text = fs::read_to_string(path)?;
        let updated = frontmatter::update_field(&text, key, value)?;
        fs::write(path, updated)?;
        debug!("appended {}={} in {}", key, value, path.display());
        Ok(())
    }

    /// Replace the value under `key` in one note file
    pub fn set_field(&self, path: &Path, key: &str, value: Value) -> Result<()> {
        let text = fs::read_to_string(path)?;
        let updated = frontmatter::set_field(&text, key, value)?;
        fs::write(path, updated)?;
        debug!("set {} in {}", key, path.display());
        Ok(())
    }

    /// Record a connection to `target` in the note at `path`.
    ///
    /// Returns `false` without writing when the file already lists it.
    pub fn append_connection(&self, path: &Path, target: &str) -> Result<bool> {
        let text = fs::read_to_string(path)?;
        let doc = frontmatter::parse(&text)?;
        if doc.frontmatter.connections().iter().any(|c| c == target) {
            return Ok(false);
        }
        let updated = frontmatter::update_field(&text, C::KEY_CONNECTED_TO, target)?;
        fs::write(path, updated)?;
        Ok(true)
    }

    /// Normalize the metadata of every note, collecting per-file failures
    pub fn normalize_all(&self) -> Result<NormalizeReport> {
        let (paths, errors) = self.discover()?;
        let mut report = NormalizeReport {
            errors,
            ..Default::default()
        };

        for path in paths {
            match normalize_file(&path) {
                Ok(true) => report.changed.push(path),
                Ok(false) => report.unchanged += 1,
                Err(e) => {
                    warn!("failed to normalize {}: {}", path.display(), e);
                    report.errors.push(FileError::new(path, e));
                }
            }
        }

        info!(
            "normalized {} notes ({} unchanged, {} errors)",
            report.changed.len(),
            report.unchanged,
            report.errors.len()
        );
        Ok(report)
    }

    /// `Conflict` if any note file anywhere under the root already has stem `id`
    fn ensure_id_free(&self, id: &str) -> Result<()> {
        if !self.root.is_dir() {
            return Ok(());
        }
        let (paths, _) = self.discover()?;
        let taken = paths
            .iter()
            .any(|p| p.file_stem().is_some_and(|stem| stem.to_string_lossy() == id));
        if taken {
            return Err(Error::Conflict(id.to_string()));
        }
        Ok(())
    }

    fn is_inside(&self, path: &Path) -> bool {
        match (dunce::canonicalize(path), dunce::canonicalize(&self.root)) {
            (Ok(path), Ok(root)) => path.starts_with(root),
            _ => false,
        }
    }
}

/// Current local date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn normalize_file(path: &Path) -> Result<bool> {
    let text = fs::read_to_string(path)?;
    let normalized = frontmatter::normalize(&text)?;
    if normalized == text {
        return Ok(false);
    }
    fs::write(path, normalized)?;
    Ok(true)
}

fn clean_tags(tags: &[String]) -> Result<Vec<String>> {
    tags.iter()
        .map(|t| {
            let t = t.trim();
            if t.is_empty() {
                Err(Error::Validation("tags must not be empty".to_string()))
            } else if t.contains('\n') {
                Err(Error::Validation(format!("tag '{}' must be a single line", t.escape_debug())))
            } else {
                Ok(t.to_string())
            }
        })
        .collect()
}

/// Write a file that must not exist yet
fn write_new(path: &Path, id: &str, text: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => Error::Conflict(id.to_string()),
            _ => Error::Io(e),
        })?;
    file.write_all(text.as_bytes())?;
    Ok(())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}
