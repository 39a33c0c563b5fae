use crate::error::{LocalityError, Result};
use crate::permutation::Permutation;
use crate::types::*;
use itertools::Itertools;
use rayon::iter::IntoParallelIterator;
use rayon::iter::ParallelIterator;
use tracing::info;

pub type Range<'a, T> = Box<dyn Iterator<Item = T> + 'a>;

/// Read-only CSR view every reordering kernel is written against.
pub trait CSRGraph {
    fn num_nodes(&self) -> usize;
    fn num_edges_directed(&self) -> usize;

    /// Undirected edge count, assuming every edge is stored in both directions.
    fn num_edges(&self) -> usize {
        self.num_edges_directed() / 2
    }

    fn out_degree(&self, v: NodeId) -> usize;
    fn out_neigh(&self, v: NodeId) -> &[NodeId];

    fn vertices(&self) -> Range<NodeId> {
        Box::new(0..self.num_nodes())
    }

    fn log_stats(&self) {
        info!(
            nodes = self.num_nodes(),
            directed_edges = self.num_edges_directed(),
            "graph loaded"
        );
    }
}

/// A graph in compressed sparse row form.
///
/// `xadj` has `nvtxs + 1` non-decreasing offsets into `adjncy`, the
/// neighbors of `v` are `adjncy[xadj[v]..xadj[v + 1]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    xadj: Vec<usize>,
    adjncy: Vec<NodeId>,
}

impl CSRGraph for Graph {
    fn num_nodes(&self) -> usize {
        self.xadj.len() - 1
    }

    fn num_edges_directed(&self) -> usize {
        self.adjncy.len()
    }

    fn out_degree(&self, v: NodeId) -> usize {
        self.xadj[v + 1] - self.xadj[v]
    }

    fn out_neigh(&self, v: NodeId) -> &[NodeId] {
        &self.adjncy[self.xadj[v]..self.xadj[v + 1]]
    }
}

impl Graph {
    pub fn from_csr(xadj: Vec<usize>, adjncy: Vec<NodeId>) -> Result<Self> {
        if xadj.is_empty() {
            return Err(LocalityError::InvalidGraph(
                "xadj must hold nvtxs + 1 offsets".into(),
            ));
        }
        if xadj[0] != 0 {
            return Err(LocalityError::InvalidGraph(format!(
                "xadj[0] is {}, expected 0",
                xadj[0]
            )));
        }
        if let Some((v, _)) = xadj
            .iter()
            .tuple_windows()
            .enumerate()
            .find(|(_, (a, b))| a > b)
        {
            return Err(LocalityError::InvalidGraph(format!(
                "xadj decreases at vertex {}",
                v
            )));
        }

        let nvtxs = xadj.len() - 1;
        if xadj[nvtxs] != adjncy.len() {
            return Err(LocalityError::InvalidGraph(format!(
                "xadj[{}] = {} but adjncy holds {} entries",
                nvtxs,
                xadj[nvtxs],
                adjncy.len()
            )));
        }
        if let Some(&bad) = adjncy.iter().find(|&&u| u >= nvtxs) {
            return Err(LocalityError::InvalidGraph(format!(
                "neighbor id {} out of range for {} vertices",
                bad, nvtxs
            )));
        }

        Ok(Self { xadj, adjncy })
    }

    /// Builds a graph from per-vertex neighbor lists, keeping their order.
    pub fn from_adjacency(rows: Vec<Vec<NodeId>>) -> Result<Self> {
        let mut xadj = Vec::with_capacity(rows.len() + 1);
        xadj.push(0);
        let mut adjncy = Vec::with_capacity(rows.iter().map(Vec::len).sum());
        for row in rows {
            adjncy.extend(row);
            xadj.push(adjncy.len());
        }
        Self::from_csr(xadj, adjncy)
    }

    pub(crate) fn from_parts_unchecked(xadj: Vec<usize>, adjncy: Vec<NodeId>) -> Self {
        Self { xadj, adjncy }
    }

    pub fn empty(nvtxs: usize) -> Self {
        Self {
            xadj: vec![0; nvtxs + 1],
            adjncy: Vec::new(),
        }
    }

    pub fn xadj(&self) -> &[usize] {
        &self.xadj
    }

    pub fn adjncy(&self) -> &[NodeId] {
        &self.adjncy
    }

    pub fn into_parts(self) -> (Vec<usize>, Vec<NodeId>) {
        (self.xadj, self.adjncy)
    }

    pub fn degrees(&self) -> Vec<usize> {
        (0..self.num_nodes())
            .into_par_iter()
            .map(|v| self.out_degree(v))
            .collect()
    }

    pub fn max_degree(&self) -> usize {
        (0..self.num_nodes())
            .map(|v| self.out_degree(v))
            .max()
            .unwrap_or(0)
    }

    pub fn has_self_loops(&self) -> bool {
        self.vertices()
            .any(|v| self.out_neigh(v).iter().any(|&u| u == v))
    }

    pub fn rows_sorted(&self) -> bool {
        self.vertices()
            .all(|v| self.out_neigh(v).iter().tuple_windows().all(|(a, b)| a <= b))
    }

    /// `u ∈ Adj(v) ⇔ v ∈ Adj(u)`, counting parallel edges with multiplicity.
    pub fn is_symmetric(&self) -> bool {
        let mut forward: Vec<Edge> = Vec::with_capacity(self.adjncy.len());
        for v in self.vertices() {
            forward.extend(self.out_neigh(v).iter().map(|&u| (v, u)));
        }
        let mut backward: Vec<Edge> = forward.iter().map(|&(v, u)| (u, v)).collect();
        forward.sort_unstable();
        backward.sort_unstable();
        forward == backward
    }

    /// Renumbers the graph so that vertex `v` becomes `perm.new_id(v)`.
    ///
    /// Row contents are renamed but keep their relative order, call
    /// `sort_adjacencies` afterwards when sorted rows are needed.
    pub fn reorder(&self, perm: &Permutation) -> Result<Graph> {
        let nvtxs = self.num_nodes();
        if perm.len() != nvtxs {
            return Err(LocalityError::InvalidParameter(format!(
                "permutation covers {} vertices, graph has {}",
                perm.len(),
                nvtxs
            )));
        }

        let mut xadj = Vec::with_capacity(nvtxs + 1);
        let mut adjncy = Vec::with_capacity(self.adjncy.len());
        xadj.push(0);
        for &old in perm.iperm() {
            adjncy.extend(self.out_neigh(old).iter().map(|&u| perm.new_id(u)));
            xadj.push(adjncy.len());
        }

        Ok(Graph { xadj, adjncy })
    }

    /// Sorts every adjacency list in increasing order.
    pub fn sort_adjacencies(&mut self) {
        let xadj = &self.xadj;
        let adjncy = &mut self.adjncy;
        for v in 0..xadj.len() - 1 {
            adjncy[xadj[v]..xadj[v + 1]].sort_unstable();
        }
    }
}
