//! Corpus statistics
//!
//! Plain functions over a loaded corpus; nothing here touches the disk.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::constants as C;
use crate::corpus::Corpus;
use crate::graph::ConnectionGraph;

/// How many notes carry each tag
pub fn tag_distribution(corpus: &Corpus) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for tag in corpus.iter().flat_map(|n| n.tags()) {
        *counts.entry(tag.clone()).or_insert(0) += 1;
    }
    counts
}

/// Top `k` notes by out-degree, ties in corpus order
pub fn top_connected(graph: &ConnectionGraph, k: usize) -> Vec<(String, usize)> {
    graph
        .most_connected(k)
        .into_iter()
        .map(|(id, degree)| (id.to_string(), degree))
        .collect()
}

/// Notes per `YYYY-MM` of their `date` field; undated notes are not counted
pub fn per_month_counts(corpus: &Corpus) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for date in corpus.iter().filter_map(|n| n.date()) {
        *counts.entry(date.format(C::MONTH_FORMAT).to_string()).or_insert(0) += 1;
    }
    counts
}

/// Mean body length in characters; `0.0` for an empty corpus
pub fn average_body_length(corpus: &Corpus) -> f64 {
    if corpus.is_empty() {
        return 0.0;
    }
    let total: usize = corpus.iter().map(|n| n.body.chars().count()).sum();
    total as f64 / corpus.len() as f64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectedNote {
    pub id: String,
    pub title: String,
    pub connections: usize,
}

/// Everything `kg stats` reports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusStats {
    pub total_notes: usize,
    pub tag_distribution: BTreeMap<String, usize>,
    pub most_connected: Vec<ConnectedNote>,
    pub notes_per_month: BTreeMap<String, usize>,
    pub average_length: f64,
}

impl CorpusStats {
    pub fn compute(corpus: &Corpus, graph: &ConnectionGraph) -> Self {
        let most_connected = top_connected(graph, C::TOP_CONNECTED)
            .into_iter()
            .map(|(id, connections)| ConnectedNote {
                title: corpus.get(&id).map(|n| n.title().to_string()).unwrap_or_else(|| id.clone()),
                id,
                connections,
            })
            .collect();

        Self {
            total_notes: corpus.len(),
            tag_distribution: tag_distribution(corpus),
            most_connected,
            notes_per_month: per_month_counts(corpus),
            average_length: average_body_length(corpus),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::Note;

    fn note(id: &str, tags: &[&str], date: Option<&str>, body: &str) -> Note {
        let date = date.map(|d| format!("date: {}\n", d)).unwrap_or_default();
        let text = format!("---\ntitle: {}\ntags: [{}]\n{}---\n{}\n", id, tags.join(", "), date, body);
        Note::parse(format!("/notes/{}.md", id), &text).unwrap()
    }

    fn scenario() -> Corpus {
        Corpus::new(vec![
            note("alpha", &["x", "y"], Some("2024-01-10"), "aaaa"),
            note("beta", &["x"], Some("2024-01-20"), "bb"),
            note("gamma", &["y"], Some("2024-02-01"), ""),
        ])
        .0
    }

    #[test]
    fn test_tag_distribution_sums_to_tag_count() {
        let corpus = scenario();
        let dist = tag_distribution(&corpus);
        assert_eq!(dist.get("x"), Some(&2));
        assert_eq!(dist.get("y"), Some(&2));
        let total: usize = dist.values().sum();
        let expected: usize = corpus.iter().map(|n| n.tags().len()).sum();
        assert_eq!(total, expected);
    }

    #[test]
    fn test_per_month_skips_undated() {
        let mut notes = vec![note("undated", &[], None, "")];
        notes.extend(scenario().notes().iter().cloned());
        let corpus = Corpus::new(notes).0;
        let months = per_month_counts(&corpus);
        assert_eq!(months.len(), 2);
        assert_eq!(months["2024-01"], 2);
        assert_eq!(months["2024-02"], 1);
    }

    #[test]
    fn test_average_body_length() {
        assert_eq!(average_body_length(&scenario()), 2.0);
        assert_eq!(average_body_length(&Corpus::default()), 0.0);
        let corpus = Corpus::new(vec![note("u", &[], None, "héllo")]).0;
        assert_eq!(average_body_length(&corpus), 5.0);
    }

    #[test]
    fn test_compute_summary() {
        let corpus = scenario();
        let graph = ConnectionGraph::from_corpus(&corpus);
        let stats = CorpusStats::compute(&corpus, &graph);
        assert_eq!(stats.total_notes, 3);
        assert_eq!(stats.most_connected.len(), 3);
        assert_eq!(stats.most_connected[0].id, "alpha");
        assert_eq!(stats.most_connected[0].connections, 0);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["tag_distribution"]["x"], 2);
    }

    #[test]
    fn test_empty_corpus() {
        let corpus = Corpus::default();
        let stats = CorpusStats::compute(&corpus, &ConnectionGraph::from_corpus(&corpus));
        assert_eq!(stats.total_notes, 0);
        assert!(stats.most_connected.is_empty());
        assert_eq!(stats.average_length, 0.0);
    }
}
