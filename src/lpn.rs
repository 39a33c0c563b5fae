//! Label-propagation reorderings.
//!
//! Every vertex starts with its own id as label. Each sweep rewrites labels in
//! place, so a vertex visited later in the sweep already sees the labels written
//! earlier in that same sweep. After `niter` sweeps the vertices are renumbered
//! so that vertices sharing a label occupy consecutive positions.
//!
//! Two selection rules are supported:
//!   - `MaxFrequency` adopts the most frequent neighbor label, breaking ties by
//!     coin flips, and visits vertices in a freshly shuffled order every sweep.
//!   - `MinLabel` adopts the smallest label among the vertex and its neighbors,
//!     and always visits vertices in ascending order.
//!
//! Either rule can be restricted to neighbors in the same degree bucket
//! (`degree >> 3`), which keeps hubs and low-degree vertices apart.

use crate::error::{try_zeroed, LocalityError, Result};
use crate::graph::CSRGraph;
use crate::permutation::Permutation;
use crate::types::*;
use rand::seq::SliceRandom;
use rand::Rng;
use rayon::iter::IndexedParallelIterator;
use rayon::iter::IntoParallelRefMutIterator;
use rayon::iter::ParallelIterator;
use std::convert::TryFrom;
use tracing::{debug, trace};

pub const DEGREE_BUCKET_SHIFT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    MaxFrequency,
    MinLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighborhood {
    All,
    DegreeBucketed,
}

/// Per-graph working memory for label propagation.
///
/// `freq` is all zero between vertices, every sweep clears only the entries
/// it incremented.
pub struct LabelScratch {
    labels: Vec<Label>,
    freq: Vec<usize>,
    order: Vec<NodeId>,
    dbucket: Vec<usize>,
}

impl LabelScratch {
    pub fn new(nvtxs: usize) -> Result<Self> {
        Ok(Self {
            labels: try_zeroed(nvtxs, "labels")?,
            freq: try_zeroed(nvtxs, "freq")?,
            order: try_zeroed(nvtxs, "order")?,
            dbucket: try_zeroed(nvtxs, "dbucket")?,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn buckets(&self) -> &[usize] {
        &self.dbucket
    }

    fn reset<G: CSRGraph + Sync>(&mut self, graph: &G, neighborhood: Neighborhood) {
        for (v, (l, o)) in self.labels.iter_mut().zip(self.order.iter_mut()).enumerate() {
            *l = v;
            *o = v;
        }
        if neighborhood == Neighborhood::DegreeBucketed {
            fill_buckets(graph, &mut self.dbucket);
        }
    }
}

fn fill_buckets<G: CSRGraph + Sync>(graph: &G, dbucket: &mut [usize]) {
    dbucket
        .par_iter_mut()
        .enumerate()
        .for_each(|(v, b)| *b = graph.out_degree(v) >> DEGREE_BUCKET_SHIFT);
}

/// `degree(v) >> 3` for every vertex.
pub fn degree_buckets<G: CSRGraph + Sync>(graph: &G) -> Vec<usize> {
    let mut dbucket = vec![0; graph.num_nodes()];
    fill_buckets(graph, &mut dbucket);
    dbucket
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelPropagator {
    selection: Selection,
    neighborhood: Neighborhood,
    niter: usize,
}

impl LabelPropagator {
    pub fn new(selection: Selection, neighborhood: Neighborhood, niter: usize) -> Self {
        Self {
            selection,
            neighborhood,
            niter,
        }
    }

    /// Like `new`, for iteration counts coming from signed configuration values.
    pub fn try_new(selection: Selection, neighborhood: Neighborhood, niter: i64) -> Result<Self> {
        let niter = usize::try_from(niter).map_err(|_| {
            LocalityError::InvalidParameter(format!("niter must be non-negative, got {}", niter))
        })?;
        Ok(Self::new(selection, neighborhood, niter))
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn neighborhood(&self) -> Neighborhood {
        self.neighborhood
    }

    pub fn niter(&self) -> usize {
        self.niter
    }

    /// Runs `niter` sweeps, leaving the final labels in `scratch`.
    pub fn propagate_with<G, R>(&self, graph: &G, scratch: &mut LabelScratch, rng: &mut R) -> Result<()>
    where
        G: CSRGraph + Sync,
        R: Rng,
    {
        if scratch.len() != graph.num_nodes() {
            return Err(LocalityError::InvalidParameter(format!(
                "scratch sized for {} vertices, graph has {}",
                scratch.len(),
                graph.num_nodes()
            )));
        }
        scratch.reset(graph, self.neighborhood);

        let bucketed = self.neighborhood == Neighborhood::DegreeBucketed;
        for sweep in 0..self.niter {
            let changed = match self.selection {
                Selection::MaxFrequency => max_frequency_sweep(graph, scratch, bucketed, rng),
                Selection::MinLabel => min_label_sweep(graph, scratch, bucketed),
            };
            trace!(sweep, changed, "label propagation sweep");
        }
        debug!(
            selection = ?self.selection,
            neighborhood = ?self.neighborhood,
            niter = self.niter,
            "label propagation done"
        );
        Ok(())
    }

    pub fn labels<G, R>(&self, graph: &G, rng: &mut R) -> Result<Vec<Label>>
    where
        G: CSRGraph + Sync,
        R: Rng,
    {
        let mut scratch = LabelScratch::new(graph.num_nodes())?;
        self.propagate_with(graph, &mut scratch, rng)?;
        Ok(scratch.labels)
    }

    /// Propagates and renumbers: `perm[v]` is the rank of `v` after a stable
    /// sort on the final labels.
    pub fn order<G, R>(&self, graph: &G, rng: &mut R) -> Result<Permutation>
    where
        G: CSRGraph + Sync,
        R: Rng,
    {
        Ok(order_by_labels(&self.labels(graph, rng)?))
    }
}

fn max_frequency_sweep<G, R>(graph: &G, scratch: &mut LabelScratch, bucketed: bool, rng: &mut R) -> usize
where
    G: CSRGraph,
    R: Rng,
{
    let LabelScratch {
        labels,
        freq,
        order,
        dbucket,
    } = scratch;
    let mut changed = 0;

    order.shuffle(rng);
    for &i in order.iter() {
        let neigh = graph.out_neigh(i);

        let (mut maxlbl, rest) = if bucketed {
            (labels[i], neigh)
        } else {
            match neigh.split_first() {
                Some((&first, rest)) => {
                    freq[labels[first]] = 1;
                    (labels[first], rest)
                }
                None => continue,
            }
        };

        for &u in rest {
            if bucketed && dbucket[i] != dbucket[u] {
                continue;
            }
            let l = labels[u];
            freq[l] += 1;
            if freq[maxlbl] < freq[l] {
                maxlbl = l;
            } else if freq[maxlbl] == freq[l] && rng.gen_bool(0.5) {
                maxlbl = l;
            }
        }

        for &u in neigh {
            freq[labels[u]] = 0;
        }
        if labels[i] != maxlbl {
            changed += 1;
        }
        labels[i] = maxlbl;
    }

    changed
}

fn min_label_sweep<G: CSRGraph>(graph: &G, scratch: &mut LabelScratch, bucketed: bool) -> usize {
    let LabelScratch { labels, dbucket, .. } = scratch;
    let mut changed = 0;

    for i in graph.vertices() {
        let mut minlbl = labels[i];
        for &u in graph.out_neigh(i) {
            if bucketed && dbucket[i] != dbucket[u] {
                continue;
            }
            minlbl = minlbl.min(labels[u]);
        }
        if labels[i] != minlbl {
            changed += 1;
        }
        labels[i] = minlbl;
    }

    changed
}

/// Places vertices with equal labels next to each other, ties keep vertex order.
pub fn order_by_labels(labels: &[Label]) -> Permutation {
    let mut cand: Vec<(Label, NodeId)> = labels.iter().copied().zip(0..).collect();
    cand.sort_by_key(|&(label, _)| label);

    let mut perm = vec![0; labels.len()];
    for (rank, &(_, v)) in cand.iter().enumerate() {
        perm[v] = rank;
    }
    Permutation::from_perm_unchecked(perm)
}
