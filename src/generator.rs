use crate::types::*;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::iter::IntoParallelIterator;
use rayon::iter::ParallelIterator;
use tracing::debug;

/// Uniform random edge lists over `2^scale` vertices.
///
/// Edges are drawn in fixed-size blocks, each from its own generator seeded
/// with `seed + block`, so the output only depends on the seed and not on
/// how rayon schedules the blocks.
pub struct Generator {
    scale: usize,
    num_nodes: usize,
    num_edges: usize,
    block_size: usize,
    seed: u64,
}

impl Generator {
    pub fn new(scale: usize, degree: usize) -> Self {
        let num_nodes = 1 << scale;
        let num_edges = num_nodes * degree;
        debug!(scale, num_nodes, num_edges, degree, "generator configured");

        Self {
            scale,
            num_nodes,
            num_edges,
            block_size: 1 << 18,
            seed: crate::K_RAND_SEED,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// Relabels every endpoint through one random permutation of the ids.
    pub fn permutate_ids(&self, edge_list: &mut EdgeList) {
        let mut permutation: Vec<NodeId> = (0..self.num_nodes).collect();
        let mut rng = StdRng::seed_from_u64(self.seed);
        permutation.shuffle(&mut rng);

        for e in edge_list.iter_mut() {
            *e = (permutation[e.0], permutation[e.1]);
        }
    }

    fn make_uniform_edge_list(&self) -> EdgeList {
        let uniform_distribution = Uniform::from(0..self.num_nodes);
        let nblocks = (self.num_edges + self.block_size - 1) / self.block_size;

        let blocks: Vec<EdgeList> = (0..nblocks)
            .into_par_iter()
            .map(|block| {
                let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(block as u64));
                let start = block * self.block_size;
                let end = std::cmp::min(start + self.block_size, self.num_edges);
                (start..end)
                    .map(|_| {
                        (
                            uniform_distribution.sample(&mut rng),
                            uniform_distribution.sample(&mut rng),
                        )
                    })
                    .collect()
            })
            .collect();

        blocks.concat()
    }

    pub fn generate_edge_list(&self) -> EdgeList {
        let edge_list = self.make_uniform_edge_list();
        debug!(scale = self.scale, edges = edge_list.len(), "edge list generated");
        edge_list
    }
}
