//! Inverted index over title, tags and body

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use super::query::{Clause, Occur, Query};
use crate::constants as C;
use crate::error::{Error, Result};
use crate::note::Note;

/// Indexed field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Tags,
    Content,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Title, Field::Tags, Field::Content];

    pub fn boost(self) -> f64 {
        match self {
            Field::Title => C::TITLE_BOOST,
            Field::Tags => C::TAGS_BOOST,
            Field::Content => C::CONTENT_BOOST,
        }
    }
}

/// Per-note projection fed to the index
#[derive(Debug, Clone, PartialEq)]
pub struct SearchDocument {
    pub id: String,
    pub title: String,
    pub tags: Vec<String>,
    pub body: String,
}

impl From<&Note> for SearchDocument {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id.clone(),
            title: note.title().to_string(),
            tags: note.tags().to_vec(),
            body: note.body.clone(),
        }
    }
}

/// A lower-cased word and where it sits in the source text
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    pub span: Range<usize>,
}

/// Split on non-alphanumeric characters, lower-casing each word
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c.is_alphanumeric(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                tokens.push(Token {
                    text: text[s..i].to_lowercase(),
                    span: s..i,
                });
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push(Token {
            text: text[s..].to_lowercase(),
            span: s..text.len(),
        });
    }
    tokens
}

#[derive(Debug)]
pub(crate) struct IndexedDoc {
    pub doc: SearchDocument,
    pub title_tokens: Vec<Token>,
    pub body_tokens: Vec<Token>,
}

/// doc position -> term frequency
type Postings = BTreeMap<usize, usize>;

/// Scored match of one document against a query
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Scored {
    pub doc: usize,
    pub score: f64,
}

#[derive(Debug, Default)]
pub struct InvertedIndex {
    docs: Vec<IndexedDoc>,
    fields: HashMap<Field, HashMap<String, Postings>>,
}

impl InvertedIndex {
    /// Index every document, checking `cancel` between documents
    pub fn build(documents: Vec<SearchDocument>, cancel: &AtomicBool) -> Result<Self> {
        let mut index = Self::default();
        for doc in documents {
            if cancel.load(Ordering::Relaxed) {
                return Err(Error::Cancelled);
            }
            index.add(doc);
        }
        Ok(index)
    }

    fn add(&mut self, doc: SearchDocument) {
        let pos = self.docs.len();
        let title_tokens = tokenize(&doc.title);
        let body_tokens = tokenize(&doc.body);

        for token in &title_tokens {
            self.bump(Field::Title, &token.text, pos);
        }
        for token in &body_tokens {
            self.bump(Field::Content, &token.text, pos);
        }
        for tag in &doc.tags {
            let tag = tag.trim().to_lowercase();
            if !tag.is_empty() {
                self.fields
                    .entry(Field::Tags)
                    .or_default()
                    .entry(tag)
                    .or_default()
                    .insert(pos, 1);
            }
        }

        self.docs.push(IndexedDoc {
            doc,
            title_tokens,
            body_tokens,
        });
    }

    fn bump(&mut self, field: Field, term: &str, pos: usize) {
        *self
            .fields
            .entry(field)
            .or_default()
            .entry(term.to_string())
            .or_default()
            .entry(pos)
            .or_default() += 1;
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub(crate) fn doc(&self, pos: usize) -> &IndexedDoc {
        &self.docs[pos]
    }

    /// Term frequency of `clause` in one field of each matching document.
    ///
    /// Multi-word terms need every word in the same field; their frequency
    /// is that of the rarest word.
    fn field_matches(&self, field: Field, clause: &Clause) -> Postings {
        let Some(terms) = self.fields.get(&field) else {
            return Postings::new();
        };
        if field == Field::Tags {
            return terms.get(&clause.term).cloned().unwrap_or_default();
        }

        let mut lists = clause.tokens.iter().map(|t| terms.get(t));
        let Some(Some(first)) = lists.next() else {
            return Postings::new();
        };
        let mut acc = first.clone();
        for list in lists {
            let Some(list) = list else {
                return Postings::new();
            };
            acc = acc
                .into_iter()
                .filter_map(|(doc, tf)| list.get(&doc).map(|other| (doc, tf.min(*other))))
                .collect();
        }
        acc
    }

    /// Boosted frequency per matching document, summed across fields
    fn clause_matches(&self, clause: &Clause) -> BTreeMap<usize, f64> {
        let mut out = BTreeMap::new();
        for field in Field::ALL {
            for (doc, tf) in self.field_matches(field, clause) {
                *out.entry(doc).or_insert(0.0) += field.boost() * tf as f64;
            }
        }
        out
    }

    /// Evaluate a query, best score first, ties by id
    pub(crate) fn evaluate(&self, query: &Query) -> Vec<Scored> {
        let n = self.docs.len();
        let matches: Vec<(&Clause, BTreeMap<usize, f64>)> = query
            .clauses
            .iter()
            .map(|c| (c, self.clause_matches(c)))
            .collect();

        let mut hits: Vec<Scored> = (0..n)
            .filter(|doc| {
                let mut any_should = false;
                for (clause, matched) in &matches {
                    let hit = matched.contains_key(doc);
                    match clause.occur {
                        Occur::Must if !hit => return false,
                        Occur::MustNot if hit => return false,
                        Occur::Should => any_should |= hit,
                        _ => {}
                    }
                }
                any_should || !query.has_should()
            })
            .map(|doc| {
                let score = matches
                    .iter()
                    .filter(|(clause, _)| clause.is_positive())
                    .filter_map(|(_, matched)| {
                        let weight = matched.get(&doc)?;
                        let idf = (1.0 + n as f64 / matched.len() as f64).ln();
                        Some(weight * idf)
                    })
                    .sum();
                Scored { doc, score }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| self.docs[a.doc].doc.id.cmp(&self.docs[b.doc].doc.id))
        });
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, title: &str, tags: &[&str], body: &str) -> SearchDocument {
        SearchDocument {
            id: id.to_string(),
            title: title.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            body: body.to_string(),
        }
    }

    fn index() -> InvertedIndex {
        InvertedIndex::build(
            vec![
                doc("one", "Alpha Notes", &["greek"], "alpha and gamma together"),
                doc("two", "Beta", &[], "alpha with beta"),
                doc("three", "Gamma", &["Letters"], "only gamma here"),
                doc("four", "Delta", &[], "nothing relevant"),
            ],
            &AtomicBool::new(false),
        )
        .unwrap()
    }

    fn ids(index: &InvertedIndex, query: &str) -> Vec<String> {
        let q = Query::parse(query).unwrap();
        index
            .evaluate(&q)
            .into_iter()
            .map(|s| index.doc(s.doc).doc.id.clone())
            .collect()
    }

    #[test]
    fn test_tokenize_spans() {
        let tokens = tokenize("Hello, Wörld-42!");
        let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["hello", "wörld", "42"]);
        assert_eq!(tokens[1].span, 7..13);
    }

    #[test]
    fn test_must_not_should() {
        let index = index();
        // alpha required, beta excluded, gamma needed as the only should term
        assert_eq!(ids(&index, "+alpha -beta gamma"), ["one"]);
        assert_eq!(ids(&index, "+alpha -beta"), ["one"]);
        assert_eq!(ids(&index, "+alpha"), ["one", "two"]);
    }

    #[test]
    fn test_should_is_or() {
        let index = index();
        let mut hits = ids(&index, "beta gamma");
        hits.sort();
        assert_eq!(hits, ["one", "three", "two"]);
    }

    #[test]
    fn test_all_negative_matches_rest() {
        let index = index();
        assert_eq!(ids(&index, "-alpha"), ["four", "three"]);
    }

    #[test]
    fn test_title_outranks_content() {
        let index = index();
        let hits = ids(&index, "gamma");
        assert_eq!(hits[0], "three");
    }

    #[test]
    fn test_tags_match_whole_tag() {
        let index = index();
        assert_eq!(ids(&index, "letters"), ["three"]);
        assert!(ids(&index, "letter").is_empty());
    }

    #[test]
    fn test_multi_word_term_same_field() {
        let index = index();
        assert_eq!(ids(&index, "alpha-notes"), ["one"]);
        assert!(ids(&index, "notes-together").is_empty());
    }

    #[test]
    fn test_ties_broken_by_id() {
        let index = InvertedIndex::build(
            vec![doc("b", "x", &[], "same"), doc("a", "y", &[], "same")],
            &AtomicBool::new(false),
        )
        .unwrap();
        assert_eq!(ids(&index, "same"), ["a", "b"]);
    }

    #[test]
    fn test_build_cancelled() {
        let result = InvertedIndex::build(vec![doc("a", "A", &[], "")], &AtomicBool::new(true));
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
