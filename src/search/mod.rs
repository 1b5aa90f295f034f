//! Full-text search over a notes directory
//!
//! [`SearchIndex`] is a handle that owns the lifecycle of one in-memory
//! index: `Empty -> Building -> Ready`. The first caller of
//! [`SearchIndex::ensure_ready`] builds it; concurrent callers block on a
//! condition variable until that build finishes. A failed build drops back
//! to `Empty` so a later call can retry.

pub mod highlight;
pub mod index;
pub mod query;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::{Condvar, Mutex};
use serde::Serialize;

use crate::constants as C;
use crate::error::{Error, FileError, Result};
use crate::store::NoteStore;

pub use index::{Field, InvertedIndex, SearchDocument};
pub use query::{Occur, Query};

/// A highlighted piece of one field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Excerpt {
    pub field: Field,
    pub text: String,
}

/// One ranked result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub score: f64,
    pub excerpts: Vec<Excerpt>,
}

/// A built index plus the files that could not be indexed
#[derive(Debug)]
pub struct Snapshot {
    pub index: InvertedIndex,
    pub errors: Vec<FileError>,
}

impl Snapshot {
    /// Rank documents for `query` and attach excerpts
    pub fn search(&self, query: &Query, context_width: usize) -> Vec<SearchHit> {
        self.index
            .evaluate(query)
            .into_iter()
            .map(|scored| {
                let indexed = self.index.doc(scored.doc);
                SearchHit {
                    id: indexed.doc.id.clone(),
                    title: indexed.doc.title.clone(),
                    score: scored.score,
                    excerpts: excerpts(indexed, query, context_width),
                }
            })
            .collect()
    }
}

fn excerpts(indexed: &index::IndexedDoc, query: &Query, width: usize) -> Vec<Excerpt> {
    let words: Vec<&str> = query
        .positive()
        .flat_map(|c| c.tokens.iter().map(String::as_str))
        .collect();
    let terms: Vec<&str> = query.positive().map(|c| c.term.as_str()).collect();
    let doc = &indexed.doc;

    let mut out = Vec::new();
    let mut push = |field: Field, text: &str, spans: Vec<std::ops::Range<usize>>| {
        for text in highlight::highlight(text, &spans, width) {
            out.push(Excerpt { field, text });
        }
    };

    let matching = |tokens: &[index::Token]| -> Vec<std::ops::Range<usize>> {
        tokens
            .iter()
            .filter(|t| words.contains(&t.text.as_str()))
            .map(|t| t.span.clone())
            .collect()
    };
    push(Field::Title, &doc.title, matching(&indexed.title_tokens));

    let joined = doc.tags.join(", ");
    let mut offset = 0;
    let mut tag_spans = Vec::new();
    for tag in &doc.tags {
        if terms.contains(&tag.trim().to_lowercase().as_str()) {
            tag_spans.push(offset..offset + tag.len());
        }
        offset += tag.len() + 2;
    }
    push(Field::Tags, &joined, tag_spans);

    push(Field::Content, &doc.body, matching(&indexed.body_tokens));
    out
}

enum State {
    Empty,
    Building,
    Ready(Arc<Snapshot>),
}

struct Inner {
    state: State,
    /// Incremented when a build starts
    generation: u64,
    /// Generation and message of the last failed build
    failure: Option<(u64, String)>,
    /// Set by `invalidate` while a build is running
    stale: bool,
}

/// Lazily built search index over one notes directory
pub struct SearchIndex {
    store: NoteStore,
    inner: Mutex<Inner>,
    ready: Condvar,
    cancel: Arc<AtomicBool>,
    builds: AtomicUsize,
    /// Runs at the start of every build, outside the lock
    #[cfg(test)]
    on_build: Option<Box<dyn Fn() + Send + Sync>>,
}

impl SearchIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            store: NoteStore::new(root),
            inner: Mutex::new(Inner {
                state: State::Empty,
                generation: 0,
                failure: None,
                stale: false,
            }),
            ready: Condvar::new(),
            cancel: Arc::new(AtomicBool::new(false)),
            builds: AtomicUsize::new(0),
            #[cfg(test)]
            on_build: None,
        }
    }

    /// Flag that makes an in-flight build stop with `Cancelled`
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Number of builds started so far
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.inner.lock().state, State::Ready(_))
    }

    /// Drop the built index; the next `ensure_ready` rebuilds it
    pub fn invalidate(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            State::Ready(_) => inner.state = State::Empty,
            State::Building => inner.stale = true,
            State::Empty => {}
        }
        debug!("search index invalidated");
    }

    /// Return the built index, building it first if needed.
    ///
    /// Exactly one caller builds; the rest wait for it. Waiters of a failed
    /// build get `IndexUnavailable`.
    pub fn ensure_ready(&self) -> Result<Arc<Snapshot>> {
        let mut inner = self.inner.lock();
        loop {
            match &inner.state {
                State::Ready(snapshot) => return Ok(Arc::clone(snapshot)),
                State::Empty => break,
                State::Building => {
                    let generation = inner.generation;
                    while matches!(inner.state, State::Building) && inner.generation == generation {
                        self.ready.wait(&mut inner);
                    }
                    if let Some((failed, message)) = &inner.failure {
                        if *failed == generation {
                            return Err(Error::IndexUnavailable(message.clone()));
                        }
                    }
                }
            }
        }

        inner.state = State::Building;
        inner.generation += 1;
        inner.stale = false;
        let generation = inner.generation;
        drop(inner);

        self.builds.fetch_add(1, Ordering::SeqCst);
        #[cfg(test)]
        if let Some(hook) = &self.on_build {
            hook();
        }
        let result = self.build();
        self.cancel.store(false, Ordering::SeqCst);

        let mut inner = self.inner.lock();
        let outcome = match result {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                inner.state = if inner.stale {
                    State::Empty
                } else {
                    State::Ready(Arc::clone(&snapshot))
                };
                Ok(snapshot)
            }
            Err(e) => {
                warn!("search index build failed: {}", e);
                inner.state = State::Empty;
                inner.failure = Some((generation, e.to_string()));
                Err(e)
            }
        };
        self.ready.notify_all();
        outcome
    }

    /// Parse and run a query, building the index if needed
    pub fn search(&self, query: &str, context_width: usize) -> Result<Vec<SearchHit>> {
        let query = Query::parse(query)?;
        let snapshot = self.ensure_ready()?;
        Ok(snapshot.search(&query, context_width))
    }

    /// Same as [`search`](Self::search) with the default context width
    pub fn search_default(&self, query: &str) -> Result<Vec<SearchHit>> {
        self.search(query, C::DEFAULT_CONTEXT_WIDTH)
    }

    fn build(&self) -> Result<Snapshot> {
        let report = self
            .store
            .load()
            .map_err(|e| Error::IndexUnavailable(format!("{}: {}", self.store.root().display(), e)))?;
        if self.cancel.load(Ordering::SeqCst) {
            return Err(Error::Cancelled);
        }

        let documents = report.corpus.iter().map(SearchDocument::from).collect();
        let index = InvertedIndex::build(documents, &self.cancel)?;
        info!(
            "indexed {} notes ({} skipped)",
            index.len(),
            report.errors.len()
        );
        Ok(Snapshot {
            index,
            errors: report.errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Index whose first build signals `started` and then blocks until `release` fires
    fn gated_index(root: impl Into<PathBuf>) -> (Arc<SearchIndex>, Receiver<()>, Sender<()>) {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let gate = Mutex::new(Some((started_tx, release_rx)));

        let mut index = SearchIndex::new(root);
        index.on_build = Some(Box::new(move || {
            if let Some((started, release)) = gate.lock().take() {
                started.send(()).unwrap();
                release.recv().unwrap();
            }
        }));
        (Arc::new(index), started_rx, release_tx)
    }

    fn setup_notes() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let notes = [
            ("alpha", "Alpha", "[greek]", "Alpha and gamma walk into a bar."),
            ("beta", "Beta", "[]", "Alpha meets beta."),
            ("gamma", "Gamma", "[Letters]", "Only gamma is here."),
        ];
        for (id, title, tags, body) in notes {
            let text = format!(
                "---\ntitle: {}\ntags: {}\ndate: 2024-01-01\n---\n\n# {}\n\n{}\n",
                title, tags, title, body
            );
            fs::write(temp_dir.path().join(format!("{}.md", id)), text).unwrap();
        }
        fs::write(temp_dir.path().join("broken.md"), "oops").unwrap();
        temp_dir
    }

    #[test]
    fn test_search_query_semantics() {
        let temp_dir = setup_notes();
        let index = SearchIndex::new(temp_dir.path());

        let ids = |q: &str| -> Vec<String> {
            index.search_default(q).unwrap().into_iter().map(|h| h.id).collect()
        };
        assert_eq!(ids("+alpha -beta gamma"), ["alpha"]);
        assert_eq!(ids("-alpha"), ["gamma"]);
        assert_eq!(index.build_count(), 1);
    }

    #[test]
    fn test_search_highlights() {
        let temp_dir = setup_notes();
        let index = SearchIndex::new(temp_dir.path());
        let hits = index.search_default("gamma").unwrap();
        assert_eq!(hits[0].id, "gamma");

        let title = hits[0].excerpts.iter().find(|e| e.field == Field::Title).unwrap();
        assert_eq!(title.text, "<mark>Gamma</mark>");
        let content = hits[0].excerpts.iter().find(|e| e.field == Field::Content).unwrap();
        assert_eq!(content.text, "Only <mark>gamma</mark> is here.");
    }

    #[test]
    fn test_search_tag_excerpt() {
        let temp_dir = setup_notes();
        let index = SearchIndex::new(temp_dir.path());
        let hits = index.search_default("letters").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].excerpts[0].field, Field::Tags);
        assert_eq!(hits[0].excerpts[0].text, "<mark>Letters</mark>");
    }

    #[test]
    fn test_build_collects_file_errors() {
        let temp_dir = setup_notes();
        let index = SearchIndex::new(temp_dir.path());
        let snapshot = index.ensure_ready().unwrap();
        assert_eq!(snapshot.index.len(), 3);
        assert_eq!(snapshot.errors.len(), 1);
    }

    #[test]
    fn test_query_error_before_build() {
        let temp_dir = setup_notes();
        let index = SearchIndex::new(temp_dir.path());
        assert!(matches!(index.search_default("  "), Err(Error::Query(_))));
        assert_eq!(index.build_count(), 0);
    }

    #[test]
    fn test_missing_directory_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::new(temp_dir.path().join("missing"));
        assert!(matches!(index.search_default("x"), Err(Error::IndexUnavailable(_))));
        assert!(!index.is_ready());
    }

    #[test]
    fn test_concurrent_ensure_ready_builds_once() {
        let temp_dir = setup_notes();
        let index = Arc::new(SearchIndex::new(temp_dir.path()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let index = Arc::clone(&index);
                thread::spawn(move || index.ensure_ready().map(|s| s.index.len()))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), 3);
        }
        assert_eq!(index.build_count(), 1);
    }

    #[test]
    fn test_waiters_of_failed_build_get_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let (index, started, release) = gated_index(temp_dir.path().join("missing"));

        let builder = {
            let index = Arc::clone(&index);
            thread::spawn(move || index.ensure_ready().map(|_| ()))
        };
        started.recv().unwrap();

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let index = Arc::clone(&index);
                thread::spawn(move || index.ensure_ready().map(|_| ()))
            })
            .collect();
        thread::sleep(Duration::from_millis(100));
        release.send(()).unwrap();

        assert!(matches!(builder.join().unwrap(), Err(Error::IndexUnavailable(_))));
        for waiter in waiters {
            assert!(matches!(waiter.join().unwrap(), Err(Error::IndexUnavailable(_))));
        }
        assert_eq!(index.build_count(), 1);
        assert!(!index.is_ready());
    }

    #[test]
    fn test_invalidate_during_build_forces_rebuild() {
        let temp_dir = setup_notes();
        let (index, started, release) = gated_index(temp_dir.path());

        let builder = {
            let index = Arc::clone(&index);
            thread::spawn(move || index.ensure_ready().map(|s| s.index.len()))
        };
        started.recv().unwrap();

        fs::write(
            temp_dir.path().join("delta.md"),
            "---\ntitle: Delta\ndate: 2024-01-01\n---\nlate arrival\n",
        )
        .unwrap();
        index.invalidate();
        release.send(()).unwrap();

        assert_eq!(builder.join().unwrap().unwrap(), 4);
        assert!(!index.is_ready());

        let snapshot = index.ensure_ready().unwrap();
        assert_eq!(snapshot.index.len(), 4);
        assert_eq!(index.build_count(), 2);
        assert!(index.is_ready());
    }

    #[test]
    fn test_invalidate_rebuilds() {
        let temp_dir = setup_notes();
        let index = SearchIndex::new(temp_dir.path());
        index.ensure_ready().unwrap();
        assert!(index.is_ready());

        fs::write(
            temp_dir.path().join("delta.md"),
            "---\ntitle: Delta\ndate: 2024-01-01\n---\nfresh words\n",
        )
        .unwrap();
        assert!(index.search_default("fresh").unwrap().is_empty());

        index.invalidate();
        assert!(!index.is_ready());
        assert_eq!(index.search_default("fresh").unwrap()[0].id, "delta");
        assert_eq!(index.build_count(), 2);
    }

    #[test]
    fn test_cancelled_build_returns_to_empty() {
        let temp_dir = setup_notes();
        let index = SearchIndex::new(temp_dir.path());
        index.cancel_flag().store(true, Ordering::SeqCst);

        assert!(matches!(index.ensure_ready(), Err(Error::Cancelled)));
        assert!(!index.is_ready());
        assert!(index.ensure_ready().is_ok());
    }
}
