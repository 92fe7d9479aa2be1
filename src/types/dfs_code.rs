//! DFS codes: the canonical string form of a connected pattern.
//!
//! A code lists the pattern's edges in the order a depth-first traversal
//! discovers them. Vertices are numbered by discovery time. The minimum
//! code over all traversals is the pattern's canonical form.
//!
//! ## Ordering
//!
//! Edges compare the way they compete as the next step of a traversal:
//!
//! - Backward edges (closing a cycle) precede forward edges
//! - Backward edges with a smaller target come first
//! - Forward edges from a deeper vertex come first
//! - Ties break on (from label, edge label, to label)
//!
//! Codes compare by root label, then edge by edge. A proper prefix sorts
//! before any of its extensions.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::graph::{EdgeLabel, IndexedGraph, VertexLabel};

/// One edge of a DFS code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DfsEdge {
    /// Discovery index of the source vertex.
    pub from: u32,
    /// Discovery index of the target vertex.
    pub to: u32,
    /// Label of the source vertex.
    pub from_label: VertexLabel,
    /// Edge label.
    pub edge_label: EdgeLabel,
    /// Label of the target vertex.
    pub to_label: VertexLabel,
}

impl DfsEdge {
    /// Whether this edge discovers a new vertex.
    pub fn is_forward(&self) -> bool {
        self.from < self.to
    }

    fn order_key(&self) -> (u8, u32, u32, u16, u16, u16) {
        if self.is_forward() {
            (
                1,
                self.to,
                u32::MAX - self.from,
                self.from_label.0,
                self.edge_label.0,
                self.to_label.0,
            )
        } else {
            (
                0,
                self.from,
                self.to,
                self.edge_label.0,
                self.from_label.0,
                self.to_label.0,
            )
        }
    }
}

impl PartialOrd for DfsEdge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DfsEdge {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }
}

impl fmt::Display for DfsEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{},{},{},{})",
            self.from, self.to, self.from_label, self.edge_label, self.to_label
        )
    }
}

/// A DFS code. When produced by the canonical form engine it is the
/// minimum code of its pattern and identifies the pattern uniquely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DfsCode {
    root: VertexLabel,
    edges: Vec<DfsEdge>,
}

impl DfsCode {
    /// Code of a single vertex.
    pub fn single(root: VertexLabel) -> Self {
        Self {
            root,
            edges: Vec::new(),
        }
    }

    /// Label of vertex 0.
    pub fn root(&self) -> VertexLabel {
        self.root
    }

    /// Edges in discovery order.
    pub fn edges(&self) -> &[DfsEdge] {
        &self.edges
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        1 + self.edges.iter().filter(|e| e.is_forward()).count()
    }

    /// Code without its last edge, or `None` for a single vertex.
    ///
    /// For a minimum code this is the minimum code of the parent pattern.
    pub fn parent(&self) -> Option<DfsCode> {
        let (_, rest) = self.edges.split_last()?;
        Some(Self {
            root: self.root,
            edges: rest.to_vec(),
        })
    }

    pub(crate) fn push(&mut self, edge: DfsEdge) {
        self.edges.push(edge);
    }

    /// Rebuild the pattern graph. Vertex `i` of the graph is discovery
    /// index `i` of the code.
    pub fn to_graph(&self) -> IndexedGraph {
        let mut graph = IndexedGraph::default();
        graph.push_vertex(self.root);
        for edge in &self.edges {
            if edge.is_forward() {
                graph.push_vertex(edge.to_label);
            }
            graph.push_edge(edge.from as usize, edge.to as usize, edge.edge_label);
        }
        graph
    }
}

impl PartialOrd for DfsCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DfsCode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.root
            .cmp(&other.root)
            .then_with(|| self.edges.cmp(&other.edges))
    }
}

impl fmt::Display for DfsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.root)?;
        for edge in &self.edges {
            write!(f, "{}", edge)?;
        }
        Ok(())
    }
}
