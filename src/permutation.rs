//! Vertex permutations, kept in both directions.
//!
//! `perm[v]` is the new position of vertex `v` and `iperm[pos]` is the vertex
//! placed at `pos`. Reordering kernels produce `perm`, the triangle counter
//! walks `iperm` as its visiting sequence.

use crate::error::{LocalityError, Result};
use crate::types::*;
use bit_vec::BitVec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation {
    perm: Vec<NodeId>,
    iperm: Vec<NodeId>,
}

fn invert(map: &[NodeId], name: &str) -> Result<Vec<NodeId>> {
    let n = map.len();
    let mut seen = BitVec::from_elem(n, false);
    let mut inverse = vec![0; n];
    for (i, &p) in map.iter().enumerate() {
        if p >= n {
            return Err(LocalityError::InvalidParameter(format!(
                "{}[{}] = {} is out of range for {} vertices",
                name, i, p, n
            )));
        }
        if seen[p] {
            return Err(LocalityError::InvalidParameter(format!(
                "{} maps two vertices to {}",
                name, p
            )));
        }
        seen.set(p, true);
        inverse[p] = i;
    }
    Ok(inverse)
}

impl Permutation {
    pub fn identity(n: usize) -> Self {
        let perm: Vec<NodeId> = (0..n).collect();
        Self {
            iperm: perm.clone(),
            perm,
        }
    }

    /// From `perm[v] = new position of v`.
    pub fn from_perm(perm: Vec<NodeId>) -> Result<Self> {
        let iperm = invert(&perm, "perm")?;
        Ok(Self { perm, iperm })
    }

    /// For maps the caller already knows are bijective.
    pub(crate) fn from_perm_unchecked(perm: Vec<NodeId>) -> Self {
        let mut iperm = vec![0; perm.len()];
        for (v, &p) in perm.iter().enumerate() {
            iperm[p] = v;
        }
        Self { perm, iperm }
    }

    /// From `iperm[pos] = vertex at pos`.
    pub fn from_iperm(iperm: Vec<NodeId>) -> Result<Self> {
        let perm = invert(&iperm, "iperm")?;
        Ok(Self { perm, iperm })
    }

    pub fn inverse(&self) -> Self {
        Self {
            perm: self.iperm.clone(),
            iperm: self.perm.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.perm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.perm.is_empty()
    }

    pub fn perm(&self) -> &[NodeId] {
        &self.perm
    }

    pub fn iperm(&self) -> &[NodeId] {
        &self.iperm
    }

    #[inline]
    pub fn new_id(&self, v: NodeId) -> NodeId {
        self.perm[v]
    }

    #[inline]
    pub fn vertex_at(&self, pos: usize) -> NodeId {
        self.iperm[pos]
    }

    pub fn is_identity(&self) -> bool {
        self.perm.iter().enumerate().all(|(i, &p)| i == p)
    }
}

/// Checks that `seq` visits every vertex of `[0, n)` exactly once.
pub fn validate_sequence(seq: &[NodeId], n: usize) -> Result<()> {
    if seq.len() != n {
        return Err(LocalityError::InvalidParameter(format!(
            "sequence has {} entries, expected {}",
            seq.len(),
            n
        )));
    }
    invert(seq, "sequence").map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_directions_agree() {
        let p = Permutation::from_perm(vec![2, 0, 1]).unwrap();
        assert_eq!(p.iperm(), &[1, 2, 0]);
        for v in 0..3 {
            assert_eq!(p.vertex_at(p.new_id(v)), v);
        }

        let q = Permutation::from_iperm(vec![1, 2, 0]).unwrap();
        assert_eq!(p, q);
        assert_eq!(p.inverse().perm(), p.iperm());
        assert!(!p.is_identity());
        assert!(Permutation::identity(4).is_identity());
    }

    #[test]
    fn rejects_non_bijections() {
        assert!(matches!(
            Permutation::from_perm(vec![0, 0, 1]),
            Err(LocalityError::InvalidParameter(_))
        ));
        assert!(matches!(
            Permutation::from_iperm(vec![0, 3, 1]),
            Err(LocalityError::InvalidParameter(_))
        ));
        assert!(validate_sequence(&[1, 0], 3).is_err());
        assert!(validate_sequence(&[1, 0, 2], 3).is_ok());
    }
}
