//! Canonical form engine.
//!
//! Computes the minimum DFS code of a connected labeled graph together
//! with one vertex order that realizes it.
//!
//! ## Algorithm
//!
//! The code is built one edge at a time. All partial traversals
//! ("projections") consistent with the code so far are kept. At each
//! step every projection proposes its smallest rightmost extension, the
//! overall minimum is appended to the code, and only the projections that
//! can realize it survive.
//!
//! ## Guarantees
//!
//! - Two graphs get equal codes iff they are label-isomorphic
//! - Dropping the last edge of a canonical code yields the canonical code
//!   of the smaller pattern
//! - Vertex 0 carries the smallest vertex label of the graph

use crate::types::{Adjacent, DfsCode, DfsEdge, LabeledGraph};

/// Maximum number of live projections before canonicalization gives up.
pub const PROJECTION_LIMIT: usize = 1 << 16;

/// Error type for canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CanonicalError {
    /// The graph has no vertices.
    #[error("cannot canonicalize an empty graph")]
    Empty,
    /// Patterns must be connected.
    #[error("graph is disconnected")]
    Disconnected,
    /// Too many symmetric partial traversals.
    #[error("canonicalization exceeded {limit} partial traversals")]
    ProjectionLimit {
        /// The limit that was hit.
        limit: usize,
    },
    /// The traversal stopped before covering the graph.
    #[error("canonical code covers {covered} of {total} edges")]
    Incomplete {
        /// Edges in the code.
        covered: usize,
        /// Edges in the graph.
        total: usize,
    },
}

/// Minimum DFS code plus the vertex order that realizes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalForm {
    /// The minimum code.
    pub code: DfsCode,
    /// `order[v]` is the discovery index of graph vertex `v` in the code.
    pub order: Vec<usize>,
}

#[derive(Debug, Clone)]
struct Projection {
    /// Discovery index -> graph vertex.
    map: Vec<usize>,
    /// Graph vertex -> discovery index.
    inv: Vec<Option<u32>>,
    /// Graph edges already in the code.
    used: Vec<bool>,
}

impl Projection {
    fn seed(vertex: usize, vertex_count: usize, edge_count: usize) -> Self {
        let mut inv = vec![None; vertex_count];
        inv[vertex] = Some(0);
        Self {
            map: vec![vertex],
            inv,
            used: vec![false; edge_count],
        }
    }

    /// Call `f` for every rightmost extension of this projection.
    fn for_each_extension<G, F>(&self, graph: &G, rmpath: &[u32], mut f: F)
    where
        G: LabeledGraph,
        F: FnMut(DfsEdge, &Adjacent),
    {
        let rightmost = rmpath[rmpath.len() - 1];
        let rm_vertex = self.map[rightmost as usize];
        let rm_label = graph.vertex_label(rm_vertex);

        for adj in graph.neighbors(rm_vertex) {
            if self.used[adj.edge] {
                continue;
            }
            if let Some(target) = self.inv[adj.to] {
                let edge = DfsEdge {
                    from: rightmost,
                    to: target,
                    from_label: rm_label,
                    edge_label: adj.label,
                    to_label: graph.vertex_label(adj.to),
                };
                f(edge, adj);
            }
        }

        let next = self.map.len() as u32;
        for &from in rmpath {
            let vertex = self.map[from as usize];
            let from_label = graph.vertex_label(vertex);
            for adj in graph.neighbors(vertex) {
                if self.inv[adj.to].is_none() {
                    let edge = DfsEdge {
                        from,
                        to: next,
                        from_label,
                        edge_label: adj.label,
                        to_label: graph.vertex_label(adj.to),
                    };
                    f(edge, adj);
                }
            }
        }
    }

    fn extend(&self, edge: DfsEdge, adj: &Adjacent) -> Projection {
        let mut next = self.clone();
        next.used[adj.edge] = true;
        if edge.is_forward() {
            next.map.push(adj.to);
            next.inv[adj.to] = Some(edge.to);
        }
        next
    }
}

/// Compute the canonical form of a connected graph.
pub fn canonical_form<G: LabeledGraph>(graph: &G) -> Result<CanonicalForm, CanonicalError> {
    canonical_form_with_limit(graph, PROJECTION_LIMIT)
}

/// Compute the canonical form with an explicit projection limit.
pub fn canonical_form_with_limit<G: LabeledGraph>(
    graph: &G,
    limit: usize,
) -> Result<CanonicalForm, CanonicalError> {
    let n = graph.vertex_count();
    let m = graph.edge_count();
    let root = (0..n)
        .map(|v| graph.vertex_label(v))
        .min()
        .ok_or(CanonicalError::Empty)?;
    if !graph.is_connected() {
        return Err(CanonicalError::Disconnected);
    }

    let mut projections: Vec<Projection> = (0..n)
        .filter(|&v| graph.vertex_label(v) == root)
        .map(|v| Projection::seed(v, n, m))
        .collect();
    if projections.len() > limit {
        return Err(CanonicalError::ProjectionLimit { limit });
    }

    let mut code = DfsCode::single(root);
    let mut rmpath: Vec<u32> = vec![0];

    while code.edge_count() < m {
        let mut best: Option<DfsEdge> = None;
        for projection in &projections {
            projection.for_each_extension(graph, &rmpath, |edge, _| {
                if best.map_or(true, |b| edge < b) {
                    best = Some(edge);
                }
            });
        }
        let best = best.ok_or(CanonicalError::Incomplete {
            covered: code.edge_count(),
            total: m,
        })?;

        let mut survivors = Vec::new();
        for projection in &projections {
            projection.for_each_extension(graph, &rmpath, |edge, adj| {
                if edge == best {
                    survivors.push(projection.extend(edge, adj));
                }
            });
            if survivors.len() > limit {
                return Err(CanonicalError::ProjectionLimit { limit });
            }
        }

        if best.is_forward() {
            if let Some(pos) = rmpath.iter().position(|&v| v == best.from) {
                rmpath.truncate(pos + 1);
            }
            rmpath.push(best.to);
        }
        code.push(best);
        projections = survivors;
    }

    let incomplete = CanonicalError::Incomplete {
        covered: code.edge_count(),
        total: m,
    };
    let first = projections.first().ok_or_else(|| incomplete.clone())?;
    let order = first
        .inv
        .iter()
        .map(|slot| slot.map(|i| i as usize))
        .collect::<Option<Vec<usize>>>()
        .ok_or(incomplete)?;

    Ok(CanonicalForm { code, order })
}

/// Canonical code only.
pub fn canonical_code<G: LabeledGraph>(graph: &G) -> Result<DfsCode, CanonicalError> {
    canonical_form(graph).map(|form| form.code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EdgeLabel, IndexedGraph, MolGraph, VertexLabel};

    fn graph(labels: &[u16], edges: &[(usize, usize, u16)]) -> IndexedGraph {
        IndexedGraph::from_mol(&MolGraph::from_parts(
            labels.iter().map(|&l| VertexLabel(l)).collect(),
            edges.iter().map(|&(a, b, l)| (a, b, EdgeLabel(l))).collect(),
        ))
        .unwrap()
    }

    #[test]
    fn test_single_vertex() {
        let form = canonical_form(&graph(&[8], &[])).unwrap();
        assert_eq!(form.code, DfsCode::single(VertexLabel(8)));
        assert_eq!(form.order, vec![0]);
    }

    #[test]
    fn test_isomorphic_relabelings_agree() {
        // C-C-O chain listed in two vertex orders.
        let a = graph(&[6, 6, 8], &[(0, 1, 1), (1, 2, 1)]);
        let b = graph(&[8, 6, 6], &[(0, 1, 1), (1, 2, 1)]);
        assert_eq!(canonical_code(&a).unwrap(), canonical_code(&b).unwrap());

        let c = graph(&[6, 8, 6], &[(0, 1, 1), (1, 2, 1)]);
        assert_ne!(canonical_code(&a).unwrap(), canonical_code(&c).unwrap());
    }

    #[test]
    fn test_edge_labels_distinguish() {
        let single = graph(&[6, 6], &[(0, 1, 1)]);
        let double = graph(&[6, 6], &[(0, 1, 2)]);
        assert_ne!(canonical_code(&single).unwrap(), canonical_code(&double).unwrap());
    }

    #[test]
    fn test_root_is_min_label() {
        let g = graph(&[8, 7, 6], &[(0, 1, 1), (1, 2, 1)]);
        let form = canonical_form(&g).unwrap();
        assert_eq!(form.code.root(), VertexLabel(6));
        assert_eq!(form.order[2], 0);
    }

    #[test]
    fn test_order_realizes_code() {
        let g = graph(&[6, 8, 6, 7], &[(0, 1, 1), (1, 2, 2), (2, 3, 1), (3, 0, 1)]);
        let form = canonical_form(&g).unwrap();
        let rebuilt = form.code.to_graph();
        for e in g.edges() {
            let (a, b) = (form.order[e.a], form.order[e.b]);
            assert_eq!(rebuilt.edge_between(a, b).map(|adj| adj.label), Some(e.label));
            assert_eq!(rebuilt.vertex_label(a), g.vertex_label(e.a));
        }
    }

    #[test]
    fn test_ring_closes_before_growing() {
        // Triangle with a tail: the backward edge must appear before the tail.
        let g = graph(&[6, 6, 6, 6], &[(0, 1, 1), (1, 2, 1), (2, 0, 1), (2, 3, 1)]);
        let code = canonical_code(&g).unwrap();
        assert_eq!(code.edge_count(), 4);
        assert!(!code.edges()[2].is_forward());
    }

    #[test]
    fn test_parent_is_canonical() {
        let g = graph(&[6, 6, 8, 7, 6], &[(0, 1, 1), (1, 2, 2), (1, 3, 1), (3, 4, 1), (4, 0, 1)]);
        let code = canonical_code(&g).unwrap();
        let mut current = code;
        while let Some(parent) = current.parent() {
            assert_eq!(canonical_code(&parent.to_graph()).unwrap(), parent);
            current = parent;
        }
    }

    #[test]
    fn test_rejects_disconnected() {
        let g = graph(&[6, 6, 6], &[(0, 1, 1)]);
        assert_eq!(canonical_form(&g), Err(CanonicalError::Disconnected));
    }

    #[test]
    fn test_projection_limit() {
        // Six identical ring atoms start six projections.
        let ring = graph(
            &[6; 6],
            &[(0, 1, 4), (1, 2, 4), (2, 3, 4), (3, 4, 4), (4, 5, 4), (5, 0, 4)],
        );
        assert_eq!(
            canonical_form_with_limit(&ring, 4),
            Err(CanonicalError::ProjectionLimit { limit: 4 })
        );
        assert!(canonical_form(&ring).is_ok());
    }
}
