pub const K_RAND_SEED: u64 = 52;

/// Runs the reordering experiments and collects hit rates
pub mod benchmark;
/// Builds and squishes a graph (removes self-references and parallel edges)
pub mod builder;
/// Cache models fed with the kernels' memory accesses
pub mod cache;
/// Experiment parameters
pub mod config;
/// Error kinds shared by all kernels
pub mod error;
/// Generates uniform random edge lists `Vec<(u, v)>`
pub mod generator;
/// CSR graph and the trait the reordering kernels are written against
pub mod graph;
/// Vertex permutations in both directions
pub mod permutation;
/// Common types for edges, vertices and labels
pub mod types;

/// # Degree ordering - counting sort by increasing degree
pub mod degree;
/// # Label propagation - max-frequency and min-label, optionally degree-bucketed
pub mod lpn;
/// # Sparse matrix-vector product locality
pub mod spmv;
/// # Triangle Counting (TC) - hash-map JIK enumeration
pub mod tc;

mod timer;

pub use error::{LocalityError, Result};
pub use graph::{CSRGraph, Graph};
pub use permutation::Permutation;
