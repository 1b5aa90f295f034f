//! The note model
//!
//! A [`Note`] is one parsed file of the corpus. Its id is the file stem,
//! which [`note_id`] derives from the title when the note is created and
//! which never changes afterwards, even if the title is edited.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::constants as C;
use crate::error::{Error, Result};
use crate::frontmatter::{self, Document, Frontmatter};

/// A note loaded from the corpus
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// File stem; graph node key
    pub id: String,
    /// Where the note was read from
    pub path: PathBuf,
    pub frontmatter: Frontmatter,
    pub body: String,
}

impl Note {
    /// Build a note from a parsed document; the title must be present
    pub fn from_document(path: impl Into<PathBuf>, doc: Document) -> Result<Self> {
        let path = path.into();
        doc.frontmatter.required_title()?;
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| Error::Validation(format!("no file name in {}", path.display())))?;

        Ok(Self {
            id,
            path,
            frontmatter: doc.frontmatter,
            body: doc.body,
        })
    }

    /// Parse note text read from `path`
    pub fn parse(path: impl Into<PathBuf>, text: &str) -> Result<Self> {
        Self::from_document(path, frontmatter::parse(text)?)
    }

    pub fn title(&self) -> &str {
        self.frontmatter.title().unwrap_or(&self.id)
    }

    pub fn tags(&self) -> &[String] {
        self.frontmatter.tags()
    }

    /// Ids this note declares a link to, in file order
    pub fn connections(&self) -> &[String] {
        self.frontmatter.connections()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.frontmatter.parsed_date()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().iter().any(|t| t == tag)
    }

    /// File name including extension
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file_name_for(&self.id))
    }

    /// Serialize back to note text
    pub fn render(&self) -> Result<String> {
        frontmatter::serialize(&self.frontmatter, self.title(), &self.body)
    }
}

/// Derive a note id from a title: lower-case, whitespace runs become `-`
pub fn note_id(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Reject ids that cannot be used as a file stem inside the notes directory
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::Validation("title produces an empty note id".to_string()));
    }
    if id.starts_with('.') {
        return Err(Error::Validation(format!("note id '{}' cannot start with '.'", id)));
    }
    if id.contains(['/', '\\']) || id.chars().any(char::is_control) {
        return Err(Error::Validation(format!(
            "note id '{}' contains path separators or control characters",
            id
        )));
    }
    Ok(())
}

/// `<id>.md`
pub fn file_name_for(id: &str) -> String {
    format!("{}.{}", id, C::NOTE_EXTENSION)
}

/// Whether `path` has the note extension
pub fn is_note_file(path: &Path) -> bool {
    path.extension().map(|e| e == C::NOTE_EXTENSION).unwrap_or(false)
}
