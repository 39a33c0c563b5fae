use crate::error::{LocalityError, Result};
use crate::graph::{CSRGraph, Graph};
use crate::timer::ScopedTimer;
use crate::types::*;
use rayon::iter::IntoParallelRefIterator;
use rayon::iter::ParallelIterator;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

const SYMMETRIZE: bool = true;

/// Builds and squishes a CSR graph from an edge list.
pub struct BuilderBase {
    symmetrize: bool,
    num_nodes: Option<usize>,
}

impl Default for BuilderBase {
    fn default() -> Self {
        Self::new()
    }
}

impl BuilderBase {
    pub fn new() -> Self {
        Self {
            symmetrize: SYMMETRIZE,
            num_nodes: None,
        }
    }

    /// Insert every edge in both directions.
    pub fn symmetrize(mut self, symmetrize: bool) -> Self {
        self.symmetrize = symmetrize;
        self
    }

    /// Fix the vertex count instead of deriving it from the largest id.
    pub fn num_nodes(mut self, num_nodes: usize) -> Self {
        self.num_nodes = Some(num_nodes);
        self
    }

    pub fn find_max_node_id(edge_list: &[Edge]) -> Option<NodeId> {
        edge_list.iter().map(|&(u, v)| u.max(v)).max()
    }

    pub fn count_degrees(&self, edge_list: &[Edge], num_nodes: usize) -> Vec<usize> {
        let degrees: Vec<AtomicUsize> = (0..num_nodes).map(|_| AtomicUsize::new(0)).collect();

        edge_list.par_iter().for_each(|e| {
            degrees[e.0].fetch_add(1, Ordering::Relaxed);
            if self.symmetrize {
                degrees[e.1].fetch_add(1, Ordering::Relaxed);
            }
        });

        degrees.into_iter().map(AtomicUsize::into_inner).collect()
    }

    pub fn make_graph_from_edge_list(&self, edge_list: &[Edge]) -> Result<Graph> {
        let _timer = ScopedTimer::new("build");

        let num_nodes = match self.num_nodes {
            Some(n) => n,
            None => Self::find_max_node_id(edge_list).map_or(0, |m| m + 1),
        };
        if let Some(&(u, v)) = edge_list.iter().find(|&&(u, v)| u >= num_nodes || v >= num_nodes) {
            return Err(LocalityError::InvalidGraph(format!(
                "edge ({}, {}) out of range for {} vertices",
                u, v, num_nodes
            )));
        }

        let degrees = self.count_degrees(edge_list, num_nodes);
        let mut xadj = Vec::with_capacity(num_nodes + 1);
        xadj.push(0);
        for d in &degrees {
            xadj.push(xadj[xadj.len() - 1] + d);
        }

        let mut cursor = xadj[..num_nodes].to_vec();
        let mut adjncy = vec![0; xadj[num_nodes]];
        for &(u, v) in edge_list {
            adjncy[cursor[u]] = v;
            cursor[u] += 1;
            if self.symmetrize {
                adjncy[cursor[v]] = u;
                cursor[v] += 1;
            }
        }

        let graph = Self::squish_csr(&xadj, &adjncy);
        debug!(
            nodes = graph.num_nodes(),
            directed_edges = graph.num_edges_directed(),
            symmetrize = self.symmetrize,
            "graph built"
        );
        Ok(graph)
    }

    /// Sorts every row, drops parallel edges and self loops.
    fn squish_csr(xadj: &[usize], adjncy: &[NodeId]) -> Graph {
        let num_nodes = xadj.len() - 1;
        let mut sxadj = Vec::with_capacity(num_nodes + 1);
        let mut sadjncy = Vec::with_capacity(adjncy.len());
        sxadj.push(0);

        for v in 0..num_nodes {
            let mut neighs = adjncy[xadj[v]..xadj[v + 1]].to_vec();
            neighs.sort_unstable();
            neighs.dedup();
            neighs.retain(|&u| u != v);
            sadjncy.extend(neighs);
            sxadj.push(sadjncy.len());
        }

        Graph::from_parts_unchecked(sxadj, sadjncy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_squished_undirected() {
        let edges = vec![(0, 1), (1, 0), (1, 2), (2, 2), (2, 0), (0, 1)];
        let g = BuilderBase::new().make_graph_from_edge_list(&edges).unwrap();
        assert_eq!(g.num_nodes(), 3);
        assert_eq!(g.out_neigh(0), &[1, 2]);
        assert_eq!(g.out_neigh(1), &[0, 2]);
        assert_eq!(g.out_neigh(2), &[0, 1]);
        assert!(g.is_symmetric());
        assert!(!g.has_self_loops());
    }

    #[test]
    fn directed_keeps_orientation() {
        let edges = vec![(0, 2), (1, 2)];
        let g = BuilderBase::new()
            .symmetrize(false)
            .num_nodes(4)
            .make_graph_from_edge_list(&edges)
            .unwrap();
        assert_eq!(g.num_nodes(), 4);
        assert_eq!(g.out_neigh(0), &[2]);
        assert!(g.out_neigh(2).is_empty());
        assert!(!g.is_symmetric());
    }

    #[test]
    fn rejects_out_of_range_edges() {
        let err = BuilderBase::new()
            .num_nodes(2)
            .make_graph_from_edge_list(&[(0, 5)]);
        assert!(matches!(err, Err(LocalityError::InvalidGraph(_))));
    }

    #[test]
    fn empty_edge_list() {
        let g = BuilderBase::new().make_graph_from_edge_list(&[]).unwrap();
        assert_eq!(g.num_nodes(), 0);
        assert_eq!(BuilderBase::find_max_node_id(&[(3, 7)]), Some(7));
    }
}
