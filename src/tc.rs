//! Will count the number of triangles (cliques of size 3)
//!
//! Requires input graph:
//!   - to be undirected
//!   - no duplicate edges and no self loops
//!   - neighborhoods are sorted by vertex identifiers
//!
//! The counter uses the JIK enumeration scheme with a hash map. Each row is
//! split into its lower part (neighbors `< v`) and its upper part (neighbors
//! `> v`), and the upper part is reversed so it runs in descending order. For
//! every visited vertex `vj` the upper neighbors are hashed, then for every
//! lower neighbor `vi` the upper list of `vi` is scanned from its largest entry
//! down to `vj`, probing the hash map for each entry. A triangle `vi < vj < vk`
//! is thus found exactly once, whatever order the vertices are visited in.
//!
//! Every memory access the kernel performs is replayed, in order, against a
//! `CacheModel`, so the visiting order shows up in the hit rate while the
//! count stays the same.

use crate::cache::{addr_of, CacheModel};
use crate::error::{try_zeroed, LocalityError, Result};
use crate::graph::{CSRGraph, Graph};
use crate::permutation::{validate_sequence, Permutation};
use crate::types::*;
use bit_vec::BitVec;
use itertools::Itertools;
use tracing::debug;

/// Smallest `2^(l+4) - 1`, `l >= 1`, with `max_upper <= 2^l`.
///
/// The result is usable as a bit mask and keeps the load factor at or below
/// one sixteenth.
pub fn hashmap_size(max_upper: usize) -> usize {
    let mut l = 1;
    while max_upper > (1 << l) {
        l += 1;
    }
    (1 << (l + 4)) - 1
}

/// Open-addressed set of vertex ids with linear probing.
///
/// Slot value `0` marks an empty slot. Only upper neighbors are ever stored,
/// and those are strictly greater than the visited vertex, so vertex `0` is
/// never a key.
pub struct TriangleHashMap {
    slots: Vec<NodeId>,
    mask: usize,
}

impl TriangleHashMap {
    pub fn new(max_upper: usize) -> Result<Self> {
        let mask = hashmap_size(max_upper);
        Ok(Self {
            slots: try_zeroed(mask + 1, "hmap")?,
            mask,
        })
    }

    pub fn mask(&self) -> usize {
        self.mask
    }

    pub fn slots(&self) -> &[NodeId] {
        &self.slots
    }

    pub fn is_clear(&self) -> bool {
        self.slots.iter().all(|&s| s == 0)
    }
}

/// A graph prepared for triangle counting.
///
/// Building the view consumes the graph: rows are split at the first neighbor
/// `>= v` (recorded in `uxadj`) and their upper part is reversed in place.
#[derive(Debug, Clone)]
pub struct TriangleView {
    xadj: Vec<usize>,
    uxadj: Vec<usize>,
    adjncy: Vec<NodeId>,
    max_upper: usize,
}

impl TriangleView {
    pub fn new(graph: Graph) -> Result<Self> {
        if graph.has_self_loops() {
            return Err(LocalityError::InvalidGraph(
                "triangle counting does not accept self loops".into(),
            ));
        }
        if !graph.rows_sorted() {
            return Err(LocalityError::InvalidGraph(
                "adjacency lists must be sorted in increasing order".into(),
            ));
        }
        if graph
            .vertices()
            .any(|v| graph.out_neigh(v).iter().tuple_windows().any(|(a, b)| a == b))
        {
            return Err(LocalityError::InvalidGraph(
                "triangle counting does not accept parallel edges".into(),
            ));
        }
        if !graph.is_symmetric() {
            return Err(LocalityError::InvalidGraph(
                "triangle counting needs an undirected (symmetric) graph".into(),
            ));
        }

        let (xadj, mut adjncy) = graph.into_parts();
        let nvtxs = xadj.len() - 1;
        let mut uxadj: Vec<usize> = try_zeroed(nvtxs, "uxadj")?;

        let mut max_upper = 0;
        for vi in 0..nvtxs {
            let row = &mut adjncy[xadj[vi]..xadj[vi + 1]];
            let split = row.iter().position(|&u| u >= vi).unwrap_or(row.len());
            uxadj[vi] = xadj[vi] + split;
            row[split..].reverse();
            max_upper = max_upper.max(row.len() - split);
        }

        Ok(Self {
            xadj,
            uxadj,
            adjncy,
            max_upper,
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.uxadj.len()
    }

    /// Neighbors `< v`, ascending.
    pub fn lower(&self, v: NodeId) -> &[NodeId] {
        &self.adjncy[self.xadj[v]..self.uxadj[v]]
    }

    /// Neighbors `> v`, descending.
    pub fn upper(&self, v: NodeId) -> &[NodeId] {
        &self.adjncy[self.uxadj[v]..self.xadj[v + 1]]
    }

    pub fn max_upper(&self) -> usize {
        self.max_upper
    }

    pub fn xadj(&self) -> &[usize] {
        &self.xadj
    }

    pub fn uxadj(&self) -> &[usize] {
        &self.uxadj
    }

    pub fn adjncy(&self) -> &[NodeId] {
        &self.adjncy
    }

    /// A hash map sized for this view.
    pub fn hashmap(&self) -> Result<TriangleHashMap> {
        TriangleHashMap::new(self.max_upper)
    }

    /// Sorts every row back into increasing order and gives the graph back.
    pub fn into_sorted_graph(self) -> Graph {
        let mut graph = Graph::from_parts_unchecked(self.xadj, self.adjncy);
        graph.sort_adjacencies();
        graph
    }

    /// Counts triangles visiting the vertices of `order` by position,
    /// i.e. `order.iperm()` is the visiting sequence.
    pub fn count<C: CacheModel>(&self, order: &Permutation, cache: &mut C) -> Result<u64> {
        let mut hmap = self.hashmap()?;
        self.count_with(order.iperm(), &mut hmap, cache)
    }

    /// Counts triangles visiting the vertices in `visit` order, reusing `hmap`.
    ///
    /// `hmap` is left empty on return, only the slots written for a vertex are
    /// cleared before moving on to the next one.
    pub fn count_with<C: CacheModel>(
        &self,
        visit: &[NodeId],
        hmap: &mut TriangleHashMap,
        cache: &mut C,
    ) -> Result<u64> {
        validate_sequence(visit, self.num_nodes())?;
        if hmap.mask < self.max_upper {
            return Err(LocalityError::InvalidParameter(format!(
                "hash map with {} slots cannot hold {} upper neighbors",
                hmap.mask + 1,
                self.max_upper
            )));
        }
        debug_assert!(hmap.is_clear());

        let xadj = &self.xadj[..];
        let uxadj = &self.uxadj[..];
        let adjncy = &self.adjncy[..];
        let hmsize = hmap.mask;
        let slots = &mut hmap.slots;

        let mut ntriangles: u64 = 0;
        for &vj in visit {
            cache.load(addr_of(xadj, vj));
            cache.load(addr_of(xadj, vj + 1));
            cache.load(addr_of(uxadj, vj));

            if xadj[vj + 1] == uxadj[vj] || uxadj[vj] == xadj[vj] {
                continue;
            }

            // hash the upper neighbors of vj
            cache.load(addr_of(uxadj, vj));
            cache.load(addr_of(xadj, vj + 1));
            for ej in uxadj[vj]..xadj[vj + 1] {
                cache.load(addr_of(adjncy, ej));
                let vk = adjncy[ej];
                let mut l = vk & hmsize;
                loop {
                    cache.load(addr_of(slots.as_slice(), l));
                    if slots[l] == 0 || slots[l] == vk {
                        break;
                    }
                    l = (l + 1) & hmsize;
                }
                slots[l] = vk;
            }

            // intersect with the upper neighbors of every lower neighbor
            cache.load(addr_of(xadj, vj));
            cache.load(addr_of(uxadj, vj));
            for ej in xadj[vj]..uxadj[vj] {
                cache.load(addr_of(adjncy, ej));
                let vi = adjncy[ej];
                cache.load(addr_of(uxadj, vi));

                let eiend = xadj[vi + 1];
                let mut ei = uxadj[vi];
                while ei < eiend {
                    cache.load(addr_of(adjncy, ei));
                    let vk = adjncy[ei];
                    if vk <= vj {
                        break;
                    }
                    let mut l = vk & hmsize;
                    loop {
                        cache.load(addr_of(slots.as_slice(), l));
                        if slots[l] == 0 || slots[l] == vk {
                            break;
                        }
                        l = (l + 1) & hmsize;
                    }
                    cache.load(addr_of(slots.as_slice(), l));
                    if slots[l] == vk {
                        ntriangles += 1;
                    }
                    ei += 1;
                }
            }

            // clear exactly the slots written above
            cache.load(addr_of(uxadj, vj));
            cache.load(addr_of(xadj, vj + 1));
            for ej in uxadj[vj]..xadj[vj + 1] {
                cache.load(addr_of(adjncy, ej));
                let vk = adjncy[ej];
                let mut l = vk & hmsize;
                loop {
                    cache.load(addr_of(slots.as_slice(), l));
                    if slots[l] == vk {
                        break;
                    }
                    l = (l + 1) & hmsize;
                }
                slots[l] = 0;
            }
        }

        debug!(hmsize, ntriangles, "hash-map triangle count done");
        Ok(ntriangles)
    }
}

/// Merge-based count on a graph with sorted rows, counting `u > v > w` only.
pub fn ordered_count<G: CSRGraph>(graph: &G) -> u64 {
    let mut total = 0;
    for u in graph.vertices() {
        let u_neigh = graph.out_neigh(u);
        for &v in u_neigh {
            if v >= u {
                break;
            }

            let mut it = u_neigh.iter().peekable();
            for &w in graph.out_neigh(v) {
                if w >= v {
                    break;
                }
                while let Some(&&x) = it.peek() {
                    if x < w {
                        it.next();
                    } else {
                        break;
                    }
                }
                if it.peek() == Some(&&w) {
                    total += 1;
                }
            }
        }
    }

    total
}

/// O(V³) reference count over an adjacency bit matrix.
pub fn brute_force_count<G: CSRGraph>(graph: &G) -> u64 {
    let n = graph.num_nodes();
    let mut adj = BitVec::from_elem(n * n, false);
    for u in graph.vertices() {
        for &v in graph.out_neigh(u) {
            adj.set(u * n + v, true);
            adj.set(v * n + u, true);
        }
    }

    let mut total = 0;
    for i in 0..n {
        for j in i + 1..n {
            if !adj[i * n + j] {
                continue;
            }
            for k in j + 1..n {
                if adj[i * n + k] && adj[j * n + k] {
                    total += 1;
                }
            }
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SetAssociativeCache;

    struct Recorder(Vec<usize>);

    impl CacheModel for Recorder {
        fn load(&mut self, addr: usize) -> bool {
            self.0.push(addr);
            false
        }

        fn hit_rate(&self) -> f64 {
            0.0
        }
    }

    /// 0-1, 1-2, 2-3, 3-0, 0-2
    fn square_with_diagonal() -> Graph {
        Graph::from_adjacency(vec![vec![1, 2, 3], vec![0, 2], vec![0, 1, 3], vec![0, 2]]).unwrap()
    }

    fn cache() -> SetAssociativeCache {
        SetAssociativeCache::with_default_geometry().unwrap()
    }

    #[test]
    fn hashmap_sizes() {
        assert_eq!(hashmap_size(0), 31);
        assert_eq!(hashmap_size(2), 31);
        assert_eq!(hashmap_size(3), 63);
        assert_eq!(hashmap_size(1000), 16383);
        assert_eq!(hashmap_size(1024), 16383);
        assert_eq!(hashmap_size(1025), 32767);
    }

    #[test]
    fn partitions_and_reverses_rows() {
        let view = TriangleView::new(square_with_diagonal()).unwrap();
        assert_eq!(view.uxadj(), &[0, 4, 7, 10]);
        assert_eq!(view.upper(0), &[3, 2, 1]);
        assert_eq!(view.lower(1), &[0]);
        assert_eq!(view.upper(1), &[2]);
        assert_eq!(view.lower(2), &[0, 1]);
        assert_eq!(view.upper(2), &[3]);
        assert_eq!(view.lower(3), &[0, 2]);
        assert!(view.upper(3).is_empty());
        assert_eq!(view.max_upper(), 3);

        let back = view.into_sorted_graph();
        assert_eq!(back, square_with_diagonal());
    }

    #[test]
    fn reference_case_every_visiting_order() {
        let view = TriangleView::new(square_with_diagonal()).unwrap();
        assert_eq!(brute_force_count(&square_with_diagonal()), 2);
        assert_eq!(ordered_count(&square_with_diagonal()), 2);

        let mut hmap = view.hashmap().unwrap();
        for visit in (0..4).permutations(4) {
            let mut c = cache();
            assert_eq!(view.count_with(&visit, &mut hmap, &mut c).unwrap(), 2);
            assert!(hmap.is_clear());
            assert!(c.accesses() > 0);
        }
    }

    #[test]
    fn repeated_counts_agree() {
        let view = TriangleView::new(square_with_diagonal()).unwrap();
        let order = Permutation::identity(4);
        let first = view.count(&order, &mut cache()).unwrap();
        let second = view.count(&order, &mut cache()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn complete_graph() {
        let n = 7;
        let rows = (0..n).map(|v| (0..n).filter(|&u| u != v).collect()).collect();
        let g = Graph::from_adjacency(rows).unwrap();
        let expected = (n * (n - 1) * (n - 2) / 6) as u64;
        assert_eq!(brute_force_count(&g), expected);
        assert_eq!(ordered_count(&g), expected);
        let view = TriangleView::new(g).unwrap();
        let order = Permutation::from_perm(vec![6, 5, 4, 3, 2, 1, 0]).unwrap();
        assert_eq!(view.count(&order, &mut cache()).unwrap(), expected);
    }

    #[test]
    fn touch_sequence_for_single_triangle() {
        let g = Graph::from_adjacency(vec![vec![1, 2], vec![0, 2], vec![0, 1]]).unwrap();
        let view = TriangleView::new(g).unwrap();
        let mut hmap = view.hashmap().unwrap();
        let mut rec = Recorder(Vec::new());
        assert_eq!(view.count_with(&[0, 1, 2], &mut hmap, &mut rec).unwrap(), 1);

        // vertex 0 and 2 only pay for the header loads
        assert_eq!(rec.0.len(), 3 + 19 + 3);
        assert_eq!(rec.0[0], addr_of(view.xadj(), 0));
        assert_eq!(rec.0[1], addr_of(view.xadj(), 1));
        assert_eq!(rec.0[2], addr_of(view.uxadj(), 0));
        // the last touch of vertex 1 clears the slot of its upper neighbor 2
        assert_eq!(rec.0[21], addr_of(hmap.slots(), 2));
        assert_eq!(rec.0[22], addr_of(view.xadj(), 2));
    }

    #[test]
    fn rejects_bad_inputs() {
        let unsorted = Graph::from_adjacency(vec![vec![2, 1], vec![0], vec![0]]).unwrap();
        assert!(matches!(
            TriangleView::new(unsorted),
            Err(LocalityError::InvalidGraph(_))
        ));

        let directed = Graph::from_adjacency(vec![vec![1], vec![]]).unwrap();
        assert!(matches!(
            TriangleView::new(directed),
            Err(LocalityError::InvalidGraph(_))
        ));

        let self_loop = Graph::from_adjacency(vec![vec![0, 1], vec![0]]).unwrap();
        assert!(TriangleView::new(self_loop).is_err());

        let parallel = Graph::from_adjacency(vec![vec![1, 1], vec![0, 0]]).unwrap();
        assert!(TriangleView::new(parallel).is_err());

        let view = TriangleView::new(square_with_diagonal()).unwrap();
        let mut hmap = view.hashmap().unwrap();
        assert!(matches!(
            view.count_with(&[0, 1, 1, 3], &mut hmap, &mut cache()),
            Err(LocalityError::InvalidParameter(_))
        ));
    }

    #[test]
    fn edgeless_and_empty_graphs() {
        let view = TriangleView::new(Graph::empty(5)).unwrap();
        assert_eq!(view.count(&Permutation::identity(5), &mut cache()).unwrap(), 0);
        let view = TriangleView::new(Graph::empty(0)).unwrap();
        assert_eq!(view.count(&Permutation::identity(0), &mut cache()).unwrap(), 0);
    }
}
