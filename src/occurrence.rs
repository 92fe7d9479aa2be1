//! Occurrence index: patterns with their embeddings, and the one-edge
//! extension step that derives child patterns.
//!
//! ## Extension
//!
//! For every embedding, every unused compound edge touching a mapped
//! vertex is a candidate. It either closes a cycle between two mapped
//! vertices ([`Extension::Close`]) or grows to a new vertex
//! ([`Extension::Grow`]). Embeddings are grouped by descriptor, each
//! descriptor is canonicalized once, and groups that land on the same
//! canonical code are merged. Embeddings are re-indexed into the child's
//! discovery order and deduplicated by (compound, used edges).

use std::collections::BTreeMap;

use crate::canonical_form::{canonical_form, CanonicalError};
use crate::policy::StructureClass;
use crate::store::CompoundStore;
use crate::types::{DfsCode, EdgeLabel, IndexedGraph, LabeledGraph, SupportSet, VertexLabel};

/// One occurrence of a pattern in a compound.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Embedding {
    /// Store index of the compound.
    pub compound: usize,
    /// Used compound edges, ascending.
    pub edges: Vec<usize>,
    /// Pattern vertex (discovery index) -> compound vertex.
    pub vertices: Vec<usize>,
}

impl Embedding {
    fn grown(&self, edge: usize, new_vertex: Option<usize>) -> Embedding {
        let mut next = self.clone();
        let slot = next.edges.binary_search(&edge).unwrap_or_else(|pos| pos);
        next.edges.insert(slot, edge);
        if let Some(v) = new_vertex {
            next.vertices.push(v);
        }
        next
    }

    fn same_occurrence(&self, other: &Embedding) -> bool {
        self.compound == other.compound
            && self.edges == other.edges
            && (!self.edges.is_empty() || self.vertices == other.vertices)
    }
}

/// A one-edge growth descriptor relative to a pattern's vertex numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Extension {
    /// New edge between existing vertices `a < b`.
    Close {
        /// Lower endpoint.
        a: usize,
        /// Higher endpoint.
        b: usize,
        /// Edge label.
        label: EdgeLabel,
    },
    /// New edge from `from` to a new vertex.
    Grow {
        /// Existing endpoint.
        from: usize,
        /// Edge label.
        label: EdgeLabel,
        /// Label of the new vertex.
        to_label: VertexLabel,
    },
}

impl Extension {
    fn apply(&self, graph: &IndexedGraph) -> IndexedGraph {
        let mut child = graph.clone();
        match *self {
            Extension::Close { a, b, label } => {
                child.push_edge(a, b, label);
            }
            Extension::Grow { from, label, to_label } => {
                let v = child.push_vertex(to_label);
                child.push_edge(from, v, label);
            }
        }
        child
    }
}

/// A pattern on the search path, owning its embeddings.
#[derive(Debug, Clone)]
pub struct Pattern {
    code: DfsCode,
    graph: IndexedGraph,
    embeddings: Vec<Embedding>,
    support: SupportSet,
}

impl Pattern {
    /// Single-vertex seed pattern for a root label.
    pub fn root<S: CompoundStore>(store: &S, label: VertexLabel) -> Pattern {
        let mut embeddings = Vec::new();
        for (index, compound) in store.iter() {
            let graph = compound.graph();
            for v in 0..graph.vertex_count() {
                if graph.vertex_label(v) == label {
                    embeddings.push(Embedding {
                        compound: index,
                        edges: Vec::new(),
                        vertices: vec![v],
                    });
                }
            }
        }
        let code = DfsCode::single(label);
        Self::from_embeddings(code, embeddings)
    }

    fn from_embeddings(code: DfsCode, mut embeddings: Vec<Embedding>) -> Pattern {
        embeddings.sort();
        embeddings.dedup_by(|later, earlier| later.same_occurrence(earlier));
        let support = SupportSet::from_indices(embeddings.iter().map(|e| e.compound).collect());
        Pattern {
            graph: code.to_graph(),
            code,
            embeddings,
            support,
        }
    }

    /// Canonical code.
    pub fn code(&self) -> &DfsCode {
        &self.code
    }

    /// Pattern graph, vertex `i` being discovery index `i`.
    pub fn graph(&self) -> &IndexedGraph {
        &self.graph
    }

    /// Embeddings, deduplicated.
    pub fn embeddings(&self) -> &[Embedding] {
        &self.embeddings
    }

    /// Supporting compounds.
    pub fn support(&self) -> &SupportSet {
        &self.support
    }

    /// Whether this pattern is the canonical parent of `child`.
    pub fn is_parent_of(&self, child: &Pattern) -> bool {
        child.code.parent().as_ref() == Some(&self.code)
    }

    /// Visit every allowed one-edge extension of every embedding.
    fn for_each_extension<S, F>(&self, store: &S, structure: StructureClass, mut f: F)
    where
        S: CompoundStore,
        F: FnMut(Extension, &Embedding, usize, Option<usize>),
    {
        let degrees: Vec<usize> = (0..self.graph.vertex_count())
            .map(|v| self.graph.neighbors(v).len())
            .collect();

        for embedding in &self.embeddings {
            let Some(compound) = store.compound(embedding.compound) else {
                continue;
            };
            let graph = compound.graph();
            for (i, &cv) in embedding.vertices.iter().enumerate() {
                for adj in graph.neighbors(cv) {
                    if embedding.edges.binary_search(&adj.edge).is_ok() {
                        continue;
                    }
                    match embedding.vertices.iter().position(|&w| w == adj.to) {
                        Some(j) => {
                            if structure.allows_cycles() && i < j {
                                let ext = Extension::Close { a: i, b: j, label: adj.label };
                                f(ext, embedding, adj.edge, None);
                            }
                        }
                        None => {
                            if structure.allows_growth_at(degrees[i]) {
                                let ext = Extension::Grow {
                                    from: i,
                                    label: adj.label,
                                    to_label: graph.vertex_label(adj.to),
                                };
                                f(ext, embedding, adj.edge, Some(adj.to));
                            }
                        }
                    }
                }
            }
        }
    }

    /// Whether any embedding admits an extension within `structure`.
    pub fn has_extension<S: CompoundStore>(&self, store: &S, structure: StructureClass) -> bool {
        let mut found = false;
        self.for_each_extension(store, structure, |_, _, _, _| found = true);
        found
    }

    /// All child patterns reachable by one extension, ascending by code.
    ///
    /// Includes children whose canonical parent is a different pattern;
    /// callers decide which ones to explore.
    pub fn children<S: CompoundStore>(
        &self,
        store: &S,
        structure: StructureClass,
    ) -> Result<Vec<Pattern>, CanonicalError> {
        let mut groups: BTreeMap<Extension, Vec<Embedding>> = BTreeMap::new();
        self.for_each_extension(store, structure, |ext, embedding, edge, new_vertex| {
            groups.entry(ext).or_default().push(embedding.grown(edge, new_vertex));
        });

        let mut by_code: BTreeMap<DfsCode, Vec<Embedding>> = BTreeMap::new();
        for (ext, embeddings) in groups {
            let child_graph = ext.apply(&self.graph);
            let form = canonical_form(&child_graph)?;
            let merged = by_code.entry(form.code).or_default();
            for embedding in embeddings {
                let mut vertices = vec![0; embedding.vertices.len()];
                for (v, &cv) in embedding.vertices.iter().enumerate() {
                    vertices[form.order[v]] = cv;
                }
                merged.push(Embedding { vertices, ..embedding });
            }
        }

        Ok(by_code
            .into_iter()
            .map(|(code, embeddings)| Pattern::from_embeddings(code, embeddings))
            .collect())
    }
}
