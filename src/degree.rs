//! Increasing-degree ordering computed with a counting sort over `[0, maxdegree]`.
//! Vertices of equal degree keep their original relative order.

use crate::graph::CSRGraph;
use crate::permutation::Permutation;
use crate::types::*;
use tracing::debug;

pub fn degree_order<G: CSRGraph>(graph: &G) -> Permutation {
    let nvtxs = graph.num_nodes();
    let range = graph.vertices().map(|v| graph.out_degree(v)).max().unwrap_or(0) + 1;

    let mut counts = vec![0usize; range + 1];
    for v in graph.vertices() {
        counts[graph.out_degree(v)] += 1;
    }

    // exclusive prefix sum: counts[d] becomes the first slot of degree d
    let mut start = 0;
    for c in counts.iter_mut() {
        let n = *c;
        *c = start;
        start += n;
    }

    let mut perm: Vec<NodeId> = Vec::with_capacity(nvtxs);
    for v in graph.vertices() {
        let d = graph.out_degree(v);
        perm.push(counts[d]);
        counts[d] += 1;
    }
    debug!(nvtxs, max_degree = range - 1, "degree ordering computed");

    Permutation::from_perm_unchecked(perm)
}
