//! Cache behaviour of a sparse matrix-vector product `y = A x` over the
//! adjacency structure: each stored entry reads its column index and then the
//! matching element of `x`.

use crate::cache::{addr_of, CacheModel};
use crate::error::{try_zeroed, Result};
use crate::graph::{CSRGraph, Graph};
use tracing::debug;

pub fn spmv_hit_rate<C: CacheModel>(graph: &Graph, cache: &mut C) -> Result<f64> {
    let adjncy = graph.adjncy();
    let vec: Vec<i32> = try_zeroed(graph.num_nodes(), "vec")?;

    for (i, &u) in adjncy.iter().enumerate() {
        cache.load(addr_of(adjncy, i));
        cache.load(addr_of(&vec, u));
    }

    let hit_rate = cache.hit_rate();
    debug!(entries = adjncy.len(), hit_rate, "spmv replay done");
    Ok(hit_rate)
}
