//! Labeled undirected graphs shared by compounds and patterns.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Vertex label (element type of an atom).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexLabel(pub u16);

impl fmt::Display for VertexLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Edge label (bond type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeLabel(pub u16);

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reasons a caller-built graph is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// The graph has no vertices.
    #[error("graph has no vertices")]
    Empty,
    /// An edge points past the vertex list.
    #[error("edge {edge} references vertex {vertex}, but the graph has {vertex_count} vertices")]
    VertexOutOfRange {
        /// Index of the offending edge.
        edge: usize,
        /// The missing vertex.
        vertex: usize,
        /// Number of vertices in the graph.
        vertex_count: usize,
    },
    /// An edge connects a vertex to itself.
    #[error("edge {edge} is a self loop on vertex {vertex}")]
    SelfLoop {
        /// Index of the offending edge.
        edge: usize,
        /// The vertex.
        vertex: usize,
    },
    /// Two edges connect the same pair of vertices.
    #[error("duplicate edge between vertices {a} and {b}")]
    DuplicateEdge {
        /// Lower endpoint.
        a: usize,
        /// Higher endpoint.
        b: usize,
    },
}

/// One entry of an adjacency list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjacent {
    /// Neighbor vertex.
    pub to: usize,
    /// Index of the connecting edge.
    pub edge: usize,
    /// Label of the connecting edge.
    pub label: EdgeLabel,
}

/// Read-only view over a labeled undirected graph.
///
/// Implemented by stored compounds and by patterns, so canonicalization
/// and subgraph matching work on either.
pub trait LabeledGraph {
    /// Number of vertices.
    fn vertex_count(&self) -> usize;

    /// Number of undirected edges.
    fn edge_count(&self) -> usize;

    /// Label of vertex `v`.
    fn vertex_label(&self, v: usize) -> VertexLabel;

    /// Adjacency list of vertex `v`.
    fn neighbors(&self, v: usize) -> &[Adjacent];

    /// The edge joining `a` and `b`, if any.
    fn edge_between(&self, a: usize, b: usize) -> Option<Adjacent> {
        self.neighbors(a).iter().find(|adj| adj.to == b).copied()
    }

    /// Whether every vertex is reachable from vertex 0.
    fn is_connected(&self) -> bool {
        let n = self.vertex_count();
        if n == 0 {
            return false;
        }
        let mut seen = vec![false; n];
        let mut stack = vec![0usize];
        seen[0] = true;
        let mut reached = 1;
        while let Some(v) = stack.pop() {
            for adj in self.neighbors(v) {
                if !seen[adj.to] {
                    seen[adj.to] = true;
                    reached += 1;
                    stack.push(adj.to);
                }
            }
        }
        reached == n
    }
}

/// Caller-built input graph.
///
/// No validation happens while building; the store validates on
/// insertion and rejects malformed graphs without side effects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MolGraph {
    labels: Vec<VertexLabel>,
    edges: Vec<(usize, usize, EdgeLabel)>,
}

impl MolGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph from vertex labels and `(a, b, label)` edges.
    pub fn from_parts(labels: Vec<VertexLabel>, edges: Vec<(usize, usize, EdgeLabel)>) -> Self {
        Self { labels, edges }
    }

    /// Append a vertex and return its index.
    pub fn add_vertex(&mut self, label: VertexLabel) -> usize {
        self.labels.push(label);
        self.labels.len() - 1
    }

    /// Append an undirected edge and return its index.
    pub fn add_edge(&mut self, a: usize, b: usize, label: EdgeLabel) -> usize {
        self.edges.push((a, b, label));
        self.edges.len() - 1
    }

    /// Vertex labels in index order.
    pub fn vertex_labels(&self) -> &[VertexLabel] {
        &self.labels
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[(usize, usize, EdgeLabel)] {
        &self.edges
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.labels.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Check that the graph is well formed.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.labels.is_empty() {
            return Err(GraphError::Empty);
        }
        let n = self.labels.len();
        let mut seen: BTreeSet<(usize, usize)> = BTreeSet::new();
        for (i, &(a, b, _)) in self.edges.iter().enumerate() {
            for vertex in [a, b] {
                if vertex >= n {
                    return Err(GraphError::VertexOutOfRange { edge: i, vertex, vertex_count: n });
                }
            }
            if a == b {
                return Err(GraphError::SelfLoop { edge: i, vertex: a });
            }
            let key = (a.min(b), a.max(b));
            if !seen.insert(key) {
                return Err(GraphError::DuplicateEdge { a: key.0, b: key.1 });
            }
        }
        Ok(())
    }
}

/// An edge of an [`IndexedGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// First endpoint.
    pub a: usize,
    /// Second endpoint.
    pub b: usize,
    /// Edge label.
    pub label: EdgeLabel,
}

/// Validated graph with adjacency lists.
///
/// Used both for stored compounds and for pattern graphs rebuilt from
/// canonical codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexedGraph {
    labels: Vec<VertexLabel>,
    edges: Vec<GraphEdge>,
    adjacency: Vec<Vec<Adjacent>>,
}

impl IndexedGraph {
    /// Validate and index a caller-built graph.
    pub fn from_mol(graph: &MolGraph) -> Result<Self, GraphError> {
        graph.validate()?;
        let mut indexed = Self::default();
        for &label in graph.vertex_labels() {
            indexed.push_vertex(label);
        }
        for &(a, b, label) in graph.edges() {
            indexed.push_edge(a, b, label);
        }
        Ok(indexed)
    }

    /// Append a vertex. Callers keep the graph well formed.
    pub(crate) fn push_vertex(&mut self, label: VertexLabel) -> usize {
        self.labels.push(label);
        self.adjacency.push(Vec::new());
        self.labels.len() - 1
    }

    /// Append an edge. Callers keep the graph well formed.
    pub(crate) fn push_edge(&mut self, a: usize, b: usize, label: EdgeLabel) -> usize {
        let edge = self.edges.len();
        self.edges.push(GraphEdge { a, b, label });
        self.adjacency[a].push(Adjacent { to: b, edge, label });
        self.adjacency[b].push(Adjacent { to: a, edge, label });
        edge
    }

    /// Vertex labels in index order.
    pub fn labels(&self) -> &[VertexLabel] {
        &self.labels
    }

    /// Edges in index order.
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Convert back into a caller-level graph.
    pub fn to_mol(&self) -> MolGraph {
        MolGraph::from_parts(
            self.labels.clone(),
            self.edges.iter().map(|e| (e.a, e.b, e.label)).collect(),
        )
    }

    /// Copy of this graph without edge `removed`.
    ///
    /// Vertices left isolated by the removal are dropped. Returns `None`
    /// when the remainder is disconnected or edgeless.
    pub fn without_edge(&self, removed: usize) -> Option<IndexedGraph> {
        let mut degree = vec![0usize; self.labels.len()];
        for (i, e) in self.edges.iter().enumerate() {
            if i != removed {
                degree[e.a] += 1;
                degree[e.b] += 1;
            }
        }
        let mut remap = vec![usize::MAX; self.labels.len()];
        let mut sub = IndexedGraph::default();
        for (v, &label) in self.labels.iter().enumerate() {
            if degree[v] > 0 {
                remap[v] = sub.push_vertex(label);
            }
        }
        for (i, e) in self.edges.iter().enumerate() {
            if i != removed {
                sub.push_edge(remap[e.a], remap[e.b], e.label);
            }
        }
        if sub.edges.is_empty() || !sub.is_connected() {
            return None;
        }
        Some(sub)
    }
}

impl LabeledGraph for IndexedGraph {
    fn vertex_count(&self) -> usize {
        self.labels.len()
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn vertex_label(&self, v: usize) -> VertexLabel {
        self.labels[v]
    }

    fn neighbors(&self, v: usize) -> &[Adjacent] {
        &self.adjacency[v]
    }
}
