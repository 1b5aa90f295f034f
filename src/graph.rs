//! Connection graph
//!
//! Directed edges come straight from each note's `connected_to` list and
//! are kept literally: repeats, dangling targets and one-sided links are all
//! representable so they can be reported and repaired. `connect` writes both
//! directions to disk; `reconcile` fixes pairs that ended up one-sided.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use log::{info, warn};
use serde::Serialize;

use crate::constants as C;
use crate::corpus::Corpus;
use crate::error::{Error, FileError, Result};
use crate::store::NoteStore;

/// A directed connection between two note ids
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    id: String,
    title: String,
    tags: Vec<String>,
    path: PathBuf,
    targets: Vec<String>,
}

/// What `connect` changed on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOutcome {
    pub forward_added: bool,
    pub reverse_added: bool,
}

/// Result of a reconciliation pass
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Reverse edges written
    pub repaired: Vec<Edge>,
    pub errors: Vec<FileError>,
}

/// Graph over one corpus snapshot, nodes in corpus order
#[derive(Debug, Clone, Default)]
pub struct ConnectionGraph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
}

impl ConnectionGraph {
    pub fn from_corpus(corpus: &Corpus) -> Self {
        let mut graph = Self::default();
        for note in corpus.iter() {
            graph.index.insert(note.id.clone(), graph.nodes.len());
            graph.nodes.push(Node {
                id: note.id.clone(),
                title: note.title().to_string(),
                tags: note.tags().to_vec(),
                path: note.path.clone(),
                targets: note.connections().to_vec(),
            });
        }
        graph
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Declared targets of `id`, in file order
    pub fn connections(&self, id: &str) -> &[String] {
        self.node(id).map(|n| n.targets.as_slice()).unwrap_or(&[])
    }

    pub fn out_degree(&self, id: &str) -> usize {
        self.connections(id).len()
    }

    /// Add `source -> target` unless it is already present.
    ///
    /// Returns `false` for a duplicate or an unknown source.
    pub fn add_edge(&mut self, source: &str, target: &str) -> bool {
        let Some(&i) = self.index.get(source) else {
            return false;
        };
        let targets = &mut self.nodes[i].targets;
        if targets.iter().any(|t| t == target) {
            return false;
        }
        targets.push(target.to_string());
        true
    }

    /// Collapse repeated targets per source, keeping first occurrence.
    /// Returns how many edges were dropped.
    pub fn dedupe(&mut self) -> usize {
        let mut dropped = 0;
        for node in &mut self.nodes {
            let mut seen = HashSet::new();
            let before = node.targets.len();
            node.targets.retain(|t| seen.insert(t.clone()));
            dropped += before - node.targets.len();
        }
        dropped
    }

    /// The `k` notes with the most outgoing edges.
    ///
    /// Ties keep corpus order.
    pub fn most_connected(&self, k: usize) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self
            .nodes
            .iter()
            .map(|n| (n.id.as_str(), n.targets.len()))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(k);
        ranked
    }

    /// Every edge as declared, dangling ones included
    pub fn export_edges(&self) -> Vec<Edge> {
        self.edges().collect()
    }

    /// Edges whose target is not in the corpus
    pub fn dangling_edges(&self) -> Vec<Edge> {
        self.edges().filter(|e| !self.contains(&e.target)).collect()
    }

    /// Edges `a -> b` where `b` exists but does not list `a`
    pub fn asymmetric_edges(&self) -> Vec<Edge> {
        let mut seen = HashSet::new();
        self.edges()
            .filter(|e| e.source != e.target)
            .filter(|e| {
                self.node(&e.target)
                    .is_some_and(|t| !t.targets.iter().any(|s| *s == e.source))
            })
            .filter(|e| seen.insert(e.clone()))
            .collect()
    }

    /// Ids of the notes that list `id` as a target
    pub fn backlinks(&self, id: &str) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|n| n.targets.iter().any(|t| t == id))
            .map(|n| n.id.as_str())
            .collect()
    }

    /// Connect two notes in both directions, on disk and in memory.
    ///
    /// `a`'s file is written first, then `b`'s. A failure on `b` leaves `a`
    /// one-sided and is reported as `PartialConnect`; `reconcile` repairs it.
    pub fn connect(&mut self, store: &NoteStore, a: &str, b: &str) -> Result<ConnectOutcome> {
        if a == b {
            return Err(Error::Validation(format!("cannot connect note '{}' to itself", a)));
        }
        let source = self.node(a).ok_or_else(|| Error::UnknownNote(a.to_string()))?;
        let target = self.node(b).ok_or_else(|| Error::UnknownNote(b.to_string()))?;
        let (source_path, target_path) = (source.path.clone(), target.path.clone());

        let forward_added = store.append_connection(&source_path, b)?;
        self.add_edge(a, b);

        let reverse_added = store
            .append_connection(&target_path, a)
            .map_err(|e| Error::PartialConnect {
                source_id: a.to_string(),
                target_id: b.to_string(),
                reason: e.to_string(),
            })?;
        self.add_edge(b, a);

        info!("connected {} <-> {}", a, b);
        Ok(ConnectOutcome {
            forward_added,
            reverse_added,
        })
    }

    /// Write the missing reverse edge of every one-sided pair
    pub fn reconcile(&mut self, store: &NoteStore) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        for edge in self.asymmetric_edges() {
            let Some(path) = self.node(&edge.target).map(|n| n.path.clone()) else {
                continue;
            };
            match store.append_connection(&path, &edge.source) {
                Ok(_) => {
                    self.add_edge(&edge.target, &edge.source);
                    report.repaired.push(Edge::new(edge.target, edge.source));
                }
                Err(e) => {
                    warn!("failed to repair {} -> {}: {}", edge.target, edge.source, e);
                    report.errors.push(FileError::new(path, e));
                }
            }
        }
        info!(
            "reconciled {} edges ({} errors)",
            report.repaired.len(),
            report.errors.len()
        );
        report
    }

    /// Node/edge description for rendering.
    ///
    /// Keeps notes carrying any of `filter_tags` (all notes when empty) and
    /// every edge declared by a kept note.
    pub fn to_graph_description(&self, filter_tags: &[String], layout: &str) -> Result<GraphDescription> {
        if !C::LAYOUTS.contains(&layout) {
            return Err(Error::Validation(format!(
                "unknown layout '{}' (expected one of: {})",
                layout,
                C::LAYOUTS.join(", ")
            )));
        }

        let kept: Vec<&Node> = self
            .nodes
            .iter()
            .filter(|n| filter_tags.is_empty() || n.tags.iter().any(|t| filter_tags.contains(t)))
            .collect();

        Ok(GraphDescription {
            layout: layout.to_string(),
            nodes: kept
                .iter()
                .map(|n| GraphNode {
                    id: n.id.clone(),
                    label: n.title.clone(),
                })
                .collect(),
            edges: kept
                .iter()
                .flat_map(|n| n.targets.iter().map(|t| Edge::new(n.id.as_str(), t.as_str())))
                .collect(),
        })
    }

    fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.nodes
            .iter()
            .flat_map(|n| n.targets.iter().map(|t| Edge::new(n.id.as_str(), t.as_str())))
    }
}

// === Rendering ===

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
}

/// Renderer-neutral graph: labelled nodes plus directed edges
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphDescription {
    pub layout: String,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<Edge>,
}

impl GraphDescription {
    /// Graphviz DOT text
    pub fn to_dot(&self) -> String {
        let mut out = format!("digraph {} {{\n  layout={};\n", C::GRAPH_NAME, self.layout);
        for node in &self.nodes {
            out.push_str(&format!(
                "  \"{}\" [label=\"{}\", shape=box];\n",
                escape_dot(&node.id),
                escape_dot(&node.label)
            ));
        }
        for edge in &self.edges {
            out.push_str(&format!(
                "  \"{}\" -> \"{}\";\n",
                escape_dot(&edge.source),
                escape_dot(&edge.target)
            ));
        }
        out.push_str("}\n");
        out
    }

    /// Standalone HTML page rendering the DOT text with d3-graphviz
    pub fn to_html(&self) -> Result<String> {
        let dot = serde_json::to_string(&self.to_dot())?.replace("</", "<\\/");
        Ok(format!(
            r##"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Knowledge Graph Visualization</title>
    <script src="https://d3js.org/d3.v5.min.js"></script>
    <script src="https://unpkg.com/@hpcc-js/wasm@0.3.11/dist/index.min.js"></script>
    <script src="https://unpkg.com/d3-graphviz@3.0.5/build/d3-graphviz.js"></script>
</head>
<body>
    <div id="graph" style="text-align: center;"></div>
    <script>
        d3.select("#graph").graphviz().renderDot({dot});
    </script>
</body>
</html>
"##
        ))
    }
}

fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::Note;
    use std::fs;
    use tempfile::TempDir;

    fn note(id: &str, tags: &[&str], connections: &[&str]) -> Note {
        let text = format!(
            "---\ntitle: {}\ntags: [{}]\ndate: 2024-01-01\nconnected_to: [{}]\n---\n",
            id.to_uppercase(),
            tags.join(", "),
            connections.join(", ")
        );
        Note::parse(format!("/notes/{}.md", id), &text).unwrap()
    }

    fn graph(notes: Vec<Note>) -> ConnectionGraph {
        ConnectionGraph::from_corpus(&Corpus::new(notes).0)
    }

    fn setup_store(titles: &[&str]) -> (TempDir, NoteStore, Corpus) {
        let temp_dir = TempDir::new().unwrap();
        let store = NoteStore::new(temp_dir.path());
        for title in titles {
            let text = format!("---\ntitle: {}\ntags: [x]\ndate: 2024-01-01\n---\n\n# {}\n\nbody\n", title, title);
            fs::write(store.note_path(&title.to_lowercase()), text).unwrap();
        }
        let corpus = store.load().unwrap().corpus;
        (temp_dir, store, corpus)
    }

    #[test]
    fn test_edges_kept_literally() {
        let g = graph(vec![note("a", &[], &["b", "b", "ghost"]), note("b", &[], &[])]);
        assert_eq!(g.out_degree("a"), 3);
        assert_eq!(g.export_edges().len(), 3);
        assert_eq!(g.dangling_edges(), vec![Edge::new("a", "ghost")]);
    }

    #[test]
    fn test_add_edge_and_dedupe() {
        let mut g = graph(vec![note("a", &[], &["b", "b"]), note("b", &[], &[])]);
        assert!(!g.add_edge("a", "b"));
        assert!(g.add_edge("b", "a"));
        assert!(!g.add_edge("missing", "a"));
        assert_eq!(g.dedupe(), 1);
        assert_eq!(g.connections("a"), ["b".to_string()]);
    }

    #[test]
    fn test_most_connected_stable() {
        let g = graph(vec![
            note("a", &[], &["b"]),
            note("b", &[], &["a"]),
            note("c", &[], &[]),
            note("d", &[], &["a", "b"]),
        ]);
        assert_eq!(g.most_connected(3), vec![("d", 2), ("a", 1), ("b", 1)]);
        assert!(g.most_connected(0).is_empty());
    }

    #[test]
    fn test_asymmetric_and_backlinks() {
        let g = graph(vec![
            note("a", &[], &["b", "c"]),
            note("b", &[], &["a"]),
            note("c", &[], &[]),
        ]);
        assert_eq!(g.asymmetric_edges(), vec![Edge::new("a", "c")]);
        assert_eq!(g.backlinks("a"), vec!["b"]);
        assert_eq!(g.backlinks("c"), vec!["a"]);
    }

    #[test]
    fn test_connect_is_symmetric() {
        let (_temp_dir, store, corpus) = setup_store(&["Alpha", "Beta", "Gamma"]);
        let mut g = ConnectionGraph::from_corpus(&corpus);

        let outcome = g.connect(&store, "alpha", "beta").unwrap();
        assert!(outcome.forward_added && outcome.reverse_added);
        assert_eq!(g.connections("alpha"), ["beta".to_string()]);
        assert_eq!(g.connections("beta"), ["alpha".to_string()]);

        let reloaded = ConnectionGraph::from_corpus(&store.load().unwrap().corpus);
        assert_eq!(reloaded.connections("alpha"), ["beta".to_string()]);
        assert_eq!(reloaded.connections("beta"), ["alpha".to_string()]);
        assert_eq!(reloaded.most_connected(1), vec![("alpha", 1)]);
        assert_eq!(reloaded.out_degree("gamma"), 0);
        assert!(reloaded.asymmetric_edges().is_empty());
    }

    #[test]
    fn test_connect_twice_does_not_duplicate() {
        let (_temp_dir, store, corpus) = setup_store(&["Alpha", "Beta"]);
        let mut g = ConnectionGraph::from_corpus(&corpus);
        g.connect(&store, "alpha", "beta").unwrap();
        let again = g.connect(&store, "beta", "alpha").unwrap();
        assert!(!again.forward_added && !again.reverse_added);

        let reloaded = ConnectionGraph::from_corpus(&store.load().unwrap().corpus);
        assert_eq!(reloaded.connections("alpha").len(), 1);
    }

    #[test]
    fn test_connect_unknown_and_self() {
        let (_temp_dir, store, corpus) = setup_store(&["Alpha"]);
        let mut g = ConnectionGraph::from_corpus(&corpus);
        assert!(matches!(g.connect(&store, "alpha", "nope"), Err(Error::UnknownNote(ref id)) if id == "nope"));
        assert!(matches!(g.connect(&store, "alpha", "alpha"), Err(Error::Validation(_))));
        let reloaded = store.load().unwrap().corpus;
        assert!(reloaded.get("alpha").unwrap().connections().is_empty());
    }

    #[test]
    fn test_connect_second_phase_failure_is_partial() {
        let (_temp_dir, store, corpus) = setup_store(&["Alpha", "Beta"]);
        let mut g = ConnectionGraph::from_corpus(&corpus);
        fs::write(store.note_path("beta"), "corrupted").unwrap();

        let err = g.connect(&store, "alpha", "beta").unwrap_err();
        assert!(matches!(err, Error::PartialConnect { ref source_id, .. } if source_id == "alpha"));
        let alpha = store.read_note(&store.note_path("alpha")).unwrap();
        assert_eq!(alpha.connections(), ["beta".to_string()]);
    }

    #[test]
    fn test_reconcile_repairs_one_sided_edges() {
        let (_temp_dir, store, _) = setup_store(&["Alpha", "Beta"]);
        store.append_connection(&store.note_path("alpha"), "beta").unwrap();
        store.append_connection(&store.note_path("alpha"), "ghost").unwrap();
        let mut g = ConnectionGraph::from_corpus(&store.load().unwrap().corpus);
        assert_eq!(g.asymmetric_edges().len(), 1);

        let report = g.reconcile(&store);
        assert_eq!(report.repaired, vec![Edge::new("beta", "alpha")]);
        assert!(report.errors.is_empty());

        let reloaded = ConnectionGraph::from_corpus(&store.load().unwrap().corpus);
        assert!(reloaded.asymmetric_edges().is_empty());
        assert_eq!(reloaded.dangling_edges(), vec![Edge::new("alpha", "ghost")]);
    }

    #[test]
    fn test_graph_description_filter() {
        let g = graph(vec![
            note("a", &["x"], &["b", "c"]),
            note("b", &["y"], &["a"]),
            note("c", &["x"], &[]),
        ]);
        let desc = g.to_graph_description(&["x".to_string()], "dot").unwrap();
        let ids: Vec<_> = desc.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
        assert_eq!(desc.edges, vec![Edge::new("a", "b"), Edge::new("a", "c")]);

        let all = g.to_graph_description(&[], "neato").unwrap();
        assert_eq!(all.nodes.len(), 3);
        assert!(matches!(g.to_graph_description(&[], "bogus"), Err(Error::Validation(_))));
    }

    #[test]
    fn test_dot_output() {
        let g = graph(vec![note("a", &[], &["b"]), note("b", &[], &[])]);
        let dot = g.to_graph_description(&[], "circo").unwrap().to_dot();
        assert!(dot.starts_with("digraph KnowledgeGraph {\n  layout=circo;\n"));
        assert!(dot.contains("  \"a\" [label=\"A\", shape=box];\n"));
        assert!(dot.contains("  \"a\" -> \"b\";\n"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn test_dot_escapes_labels() {
        let desc = GraphDescription {
            layout: "dot".into(),
            nodes: vec![GraphNode {
                id: "q".into(),
                label: "say \"hi\"".into(),
            }],
            edges: vec![],
        };
        assert!(desc.to_dot().contains(r#"[label="say \"hi\"", shape=box]"#));
        let html = desc.to_html().unwrap();
        assert!(html.contains("renderDot(\"digraph KnowledgeGraph"));
        assert!(!html.contains("</script>\""));
    }
}
