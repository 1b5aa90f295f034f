//! The in-memory corpus
//!
//! A [`Corpus`] is a snapshot of every note loaded from one directory. It is
//! never refreshed behind the caller's back: after a write the caller reloads.
//!
//! Note references given on the command line are resolved in order:
//! 1. Exact id
//! 2. Id derived from the reference as a title (`"Graph Theory"` → `graph-theory`)
//! 3. Case-insensitive title match
//! 4. Unique id prefix

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::note::{self, Note};

/// Sort order for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortKey {
    #[default]
    Title,
    Date,
    Lastmod,
}

/// Resolution result
#[derive(Debug, Clone)]
pub enum Resolved<'a> {
    /// Single note found
    Found(&'a Note),
    /// Multiple candidates (ambiguous)
    Ambiguous(Vec<&'a Note>),
    /// Not found
    NotFound,
}

/// All notes loaded from one directory, in walk order
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    notes: Vec<Note>,
    by_id: HashMap<String, usize>,
}

impl Corpus {
    /// Build a corpus; later notes with an already-seen id are returned as rejects
    pub fn new(notes: Vec<Note>) -> (Self, Vec<Note>) {
        let mut corpus = Corpus::default();
        let mut rejected = Vec::new();
        for note in notes {
            if corpus.by_id.contains_key(&note.id) {
                rejected.push(note);
                continue;
            }
            corpus.by_id.insert(note.id.clone(), corpus.notes.len());
            corpus.notes.push(note);
        }
        (corpus, rejected)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Note> {
        self.notes.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.by_id.get(id).map(|&i| &self.notes[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Resolve a user-supplied reference (id, title or id prefix)
    pub fn resolve(&self, reference: &str) -> Resolved<'_> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Resolved::NotFound;
        }

        // Rule 1: exact id
        if let Some(found) = self.get(reference) {
            return Resolved::Found(found);
        }

        // Rule 2: id derived from a title
        let derived = note::note_id(reference);
        if let Some(found) = self.get(&derived) {
            return Resolved::Found(found);
        }

        // Rule 3: title, ignoring case
        let lowered = reference.to_lowercase();
        let by_title: Vec<&Note> = self
            .notes
            .iter()
            .filter(|n| n.title().to_lowercase() == lowered)
            .collect();
        match by_title.len() {
            0 => {}
            1 => return Resolved::Found(by_title[0]),
            _ => return Resolved::Ambiguous(by_title),
        }

        // Rule 4: id prefix
        let by_prefix: Vec<&Note> = self
            .notes
            .iter()
            .filter(|n| n.id.starts_with(&derived))
            .collect();
        match by_prefix.len() {
            0 => Resolved::NotFound,
            1 => Resolved::Found(by_prefix[0]),
            _ => Resolved::Ambiguous(by_prefix),
        }
    }

    /// Resolve a reference, turning misses into `UnknownNote` and ties into
    /// a validation error listing the candidates
    pub fn resolve_or_error(&self, reference: &str) -> Result<&Note> {
        match self.resolve(reference) {
            Resolved::Found(note) => Ok(note),
            Resolved::NotFound => Err(Error::UnknownNote(reference.to_string())),
            Resolved::Ambiguous(candidates) => {
                let ids: Vec<&str> = candidates.iter().map(|n| n.id.as_str()).collect();
                Err(Error::Validation(format!(
                    "'{}' is ambiguous: {}",
                    reference,
                    ids.join(", ")
                )))
            }
        }
    }

    /// Notes carrying `tag` (all notes when `tag` is `None`), sorted
    pub fn listing(&self, sort: SortKey, reverse: bool, tag: Option<&str>) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self
            .notes
            .iter()
            .filter(|n| tag.map(|t| n.has_tag(t)).unwrap_or(true))
            .collect();

        notes.sort_by(|a, b| match sort {
            SortKey::Title => a.title().cmp(b.title()),
            SortKey::Date => a.date().cmp(&b.date()),
            SortKey::Lastmod => a
                .frontmatter
                .parsed_last_modified()
                .cmp(&b.frontmatter.parsed_last_modified()),
        });
        if reverse {
            notes.reverse();
        }
        notes
    }
}
