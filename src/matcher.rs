//! Label-preserving subgraph matching.
//!
//! Answers whether a small connected pattern occurs in a compound. Used
//! to compute supporting sets of patterns that the search does not hold
//! embeddings for (sub-patterns checked by the boundary filter).

use crate::types::compound::label_histogram;
use crate::types::{Compound, LabeledGraph, SupportSet};

/// Pattern vertices in an order where every vertex after the first has
/// an earlier neighbor, paired with that neighbor.
fn match_order<P: LabeledGraph>(pattern: &P) -> Vec<(usize, Option<usize>)> {
    let n = pattern.vertex_count();
    let mut order = Vec::with_capacity(n);
    let mut seen = vec![false; n];
    if n == 0 {
        return order;
    }
    seen[0] = true;
    order.push((0, None));
    let mut head = 0;
    while head < order.len() {
        let (v, _) = order[head];
        head += 1;
        for adj in pattern.neighbors(v) {
            if !seen[adj.to] {
                seen[adj.to] = true;
                order.push((adj.to, Some(v)));
            }
        }
    }
    order
}

struct Matcher<'a, P: LabeledGraph, T: LabeledGraph> {
    pattern: &'a P,
    target: &'a T,
    order: Vec<(usize, Option<usize>)>,
    mapping: Vec<Option<usize>>,
    taken: Vec<bool>,
}

impl<'a, P: LabeledGraph, T: LabeledGraph> Matcher<'a, P, T> {
    fn new(pattern: &'a P, target: &'a T) -> Self {
        Self {
            pattern,
            target,
            order: match_order(pattern),
            mapping: vec![None; pattern.vertex_count()],
            taken: vec![false; target.vertex_count()],
        }
    }

    fn consistent(&self, p: usize, t: usize) -> bool {
        if self.taken[t] || self.pattern.vertex_label(p) != self.target.vertex_label(t) {
            return false;
        }
        self.pattern.neighbors(p).iter().all(|adj| match self.mapping[adj.to] {
            Some(mapped) => self
                .target
                .edge_between(t, mapped)
                .is_some_and(|found| found.label == adj.label),
            None => true,
        })
    }

    fn extend(&mut self, depth: usize) -> bool {
        if depth == self.order.len() {
            return true;
        }
        let (p, anchor) = self.order[depth];
        let candidates: Vec<usize> = match anchor.and_then(|a| self.mapping[a]) {
            Some(t_anchor) => self.target.neighbors(t_anchor).iter().map(|adj| adj.to).collect(),
            None => (0..self.target.vertex_count()).collect(),
        };
        for t in candidates {
            if !self.consistent(p, t) {
                continue;
            }
            self.mapping[p] = Some(t);
            self.taken[t] = true;
            if self.extend(depth + 1) {
                return true;
            }
            self.mapping[p] = None;
            self.taken[t] = false;
        }
        false
    }
}

/// Whether `pattern` occurs in `target` as a (not necessarily induced)
/// subgraph with matching vertex and edge labels.
pub fn is_subgraph<P: LabeledGraph, T: LabeledGraph>(pattern: &P, target: &T) -> bool {
    if pattern.vertex_count() > target.vertex_count() || pattern.edge_count() > target.edge_count() {
        return false;
    }
    Matcher::new(pattern, target).extend(0)
}

/// Indices of the compounds containing `pattern`.
pub fn support_in<'c, P, I>(pattern: &P, compounds: I) -> SupportSet
where
    P: LabeledGraph,
    I: IntoIterator<Item = (usize, &'c Compound)>,
{
    let needed = label_histogram(pattern);
    let indices = compounds
        .into_iter()
        .filter(|(_, compound)| compound.covers_labels(&needed))
        .filter(|(_, compound)| is_subgraph(pattern, compound.graph()))
        .map(|(index, _)| index)
        .collect();
    SupportSet::from_indices(indices)
}
