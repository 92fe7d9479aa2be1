//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;

use bbrc_miner::{
    canonical_code, CompoundId, CompoundStore, DfsCode, EdgeLabel, IndexedGraph,
    InMemoryCompoundStore, LabeledGraph, MolGraph, VertexLabel,
};

/// Build a graph from raw labels and `(a, b, bond)` triples.
pub fn mol(labels: &[u16], edges: &[(usize, usize, u16)]) -> MolGraph {
    MolGraph::from_parts(
        labels.iter().map(|&l| VertexLabel(l)).collect(),
        edges.iter().map(|&(a, b, l)| (a, b, EdgeLabel(l))).collect(),
    )
}

/// Store with compounds numbered from 1 and optional activities.
pub fn store_of(compounds: &[(MolGraph, Option<f64>)]) -> InMemoryCompoundStore {
    let mut store = InMemoryCompoundStore::new();
    for (i, (graph, activity)) in compounds.iter().enumerate() {
        let id = CompoundId(i as u32 + 1);
        store.add_compound(id, graph).unwrap();
        if let Some(value) = activity {
            store.add_activity(id, *value).unwrap();
        }
    }
    store
}

/// Subgraph of `graph` made of the edges selected by `mask`, with
/// vertices renumbered in first-seen order.
fn edge_subgraph(graph: &IndexedGraph, mask: u32) -> IndexedGraph {
    let mut remap = vec![usize::MAX; graph.vertex_count()];
    let mut labels = Vec::new();
    let mut edges = Vec::new();
    for (i, e) in graph.edges().iter().enumerate() {
        if mask & (1 << i) == 0 {
            continue;
        }
        for v in [e.a, e.b] {
            if remap[v] == usize::MAX {
                remap[v] = labels.len();
                labels.push(graph.labels()[v]);
            }
        }
        edges.push((remap[e.a], remap[e.b], e.label));
    }
    IndexedGraph::from_mol(&MolGraph::from_parts(labels, edges)).unwrap()
}

/// Every connected subgraph with at least one edge, by exhaustive edge
/// subset enumeration, keyed by canonical code with its support size.
///
/// Exponential in the edge count; keep test graphs small.
pub fn brute_force_patterns(store: &InMemoryCompoundStore) -> BTreeMap<DfsCode, usize> {
    let mut codes = BTreeMap::new();
    for (_, compound) in store.iter() {
        let graph = compound.graph();
        assert!(graph.edge_count() <= 12, "graph too large for brute force");
        for mask in 1u32..(1 << graph.edge_count()) {
            let sub = edge_subgraph(graph, mask);
            if !sub.is_connected() {
                continue;
            }
            let code = canonical_code(&sub).unwrap();
            codes.entry(code).or_insert(0);
        }
    }
    for (code, support) in codes.iter_mut() {
        *support = store.support_of(&code.to_graph()).len();
    }
    codes
}
