use crate::cache::{
    geometry_too_wide, SetAssociativeCache, DEFAULT_CNBITS, DEFAULT_LNBITS, DEFAULT_NWAY,
};
use crate::error::{LocalityError, Result};
use crate::lpn::{LabelPropagator, Neighborhood, Selection};
use std::convert::TryFrom;

pub const NITER: i64 = 1;

/// Knobs of a locality experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    /// Address bits indexing within a cache line
    pub lnbits: u32,
    /// Address bits selecting the cache set
    pub cnbits: u32,
    pub nway: usize,
    /// Label-propagation sweeps
    pub niter: i64,
    /// Skip re-sorting adjacency lists after a reordering (SPMV only)
    pub nosort: bool,
    pub seed: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            lnbits: DEFAULT_LNBITS,
            cnbits: DEFAULT_CNBITS,
            nway: DEFAULT_NWAY,
            niter: NITER,
            nosort: false,
            seed: crate::K_RAND_SEED,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<()> {
        self.sweeps()?;
        if self.nway == 0 {
            return Err(LocalityError::InvalidParameter(
                "nway must be at least 1".into(),
            ));
        }
        if geometry_too_wide(self.lnbits, self.cnbits) {
            return Err(LocalityError::InvalidParameter(format!(
                "lnbits + cnbits must stay below {}",
                usize::BITS
            )));
        }
        Ok(())
    }

    pub fn sweeps(&self) -> Result<usize> {
        usize::try_from(self.niter).map_err(|_| {
            LocalityError::InvalidParameter(format!(
                "niter must be non-negative, got {}",
                self.niter
            ))
        })
    }

    /// A fresh, empty cache with the configured geometry.
    pub fn cache(&self) -> Result<SetAssociativeCache> {
        SetAssociativeCache::new(self.nway, self.lnbits, self.cnbits)
    }

    pub fn propagator(&self, selection: Selection, neighborhood: Neighborhood) -> Result<LabelPropagator> {
        LabelPropagator::try_new(selection, neighborhood, self.niter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let params = Params::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.sweeps().unwrap(), 1);
        assert_eq!((params.nway, params.lnbits, params.cnbits), (16, 6, 13));
    }

    #[test]
    fn rejects_negative_sweeps() {
        let params = Params {
            niter: -3,
            ..Params::default()
        };
        assert!(matches!(
            params.validate(),
            Err(LocalityError::InvalidParameter(_))
        ));
        assert!(params
            .propagator(Selection::MinLabel, Neighborhood::All)
            .is_err());
    }

    #[test]
    fn rejects_bad_cache_geometry() {
        let params = Params {
            nway: 0,
            ..Params::default()
        };
        assert!(params.validate().is_err());
        assert!(params.cache().is_err());
    }

    #[test]
    fn rejects_overflowing_address_bits() {
        let params = Params {
            lnbits: u32::MAX,
            cnbits: 1,
            ..Params::default()
        };
        assert!(matches!(
            params.validate(),
            Err(LocalityError::InvalidParameter(_))
        ));
        assert!(matches!(
            params.cache(),
            Err(LocalityError::InvalidParameter(_))
        ));
    }
}
