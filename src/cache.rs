//! Cache models driven by the locality kernels.
//!
//! Kernels call `load` once per simulated memory access, with the byte address
//! of the element touched, and only read the aggregate `hit_rate` at the end.

use crate::error::{try_zeroed, LocalityError, Result};

pub const DEFAULT_NWAY: usize = 16;
pub const DEFAULT_LNBITS: u32 = 6;
pub const DEFAULT_CNBITS: u32 = 13;

pub trait CacheModel {
    /// Touches `addr`, returning whether it was already cached.
    fn load(&mut self, addr: usize) -> bool;

    fn hit_rate(&self) -> f64;
}

/// Byte address of a slice element, as fed to a `CacheModel`.
#[inline]
pub fn addr_of<T>(slice: &[T], idx: usize) -> usize {
    slice.as_ptr() as usize + idx * std::mem::size_of::<T>()
}

const EMPTY_LINE: usize = usize::MAX;

/// True when `lnbits + cnbits` does not fit a `usize` address.
pub fn geometry_too_wide(lnbits: u32, cnbits: u32) -> bool {
    lnbits
        .checked_add(cnbits)
        .map_or(true, |bits| bits >= usize::BITS)
}

/// An `nway`-associative cache of `2^cnbits` sets with `2^lnbits`-byte lines
/// and least-recently-used replacement.
///
/// The default geometry (16 ways, 64-byte lines, 8192 sets) models an 8MB
/// last-level cache.
#[derive(Debug, Clone)]
pub struct SetAssociativeCache {
    nway: usize,
    lnbits: u32,
    cmask: usize,
    clines: Vec<usize>,
    latimes: Vec<u64>,
    clock: u64,
    nhits: u64,
}

impl SetAssociativeCache {
    pub fn new(nway: usize, lnbits: u32, cnbits: u32) -> Result<Self> {
        if nway == 0 {
            return Err(LocalityError::InvalidParameter(
                "cache associativity must be at least 1".into(),
            ));
        }
        if geometry_too_wide(lnbits, cnbits) {
            return Err(LocalityError::InvalidParameter(format!(
                "lnbits ({}) + cnbits ({}) must stay below {}",
                lnbits,
                cnbits,
                usize::BITS
            )));
        }

        let csize = 1usize << cnbits;
        let nlines = csize.checked_mul(nway).ok_or_else(|| {
            LocalityError::InvalidParameter(format!("{} sets x {} ways overflows", csize, nway))
        })?;
        let mut clines: Vec<usize> = try_zeroed(nlines, "cache lines")?;
        clines.iter_mut().for_each(|l| *l = EMPTY_LINE);

        Ok(Self {
            nway,
            lnbits,
            cmask: csize - 1,
            clines,
            latimes: try_zeroed(nlines, "cache access times")?,
            clock: 0,
            nhits: 0,
        })
    }

    pub fn with_default_geometry() -> Result<Self> {
        Self::new(DEFAULT_NWAY, DEFAULT_LNBITS, DEFAULT_CNBITS)
    }

    pub fn accesses(&self) -> u64 {
        self.clock
    }

    pub fn hits(&self) -> u64 {
        self.nhits
    }

    /// Empties the cache and zeroes the statistics.
    pub fn reset(&mut self) {
        self.clines.iter_mut().for_each(|l| *l = EMPTY_LINE);
        self.latimes.iter_mut().for_each(|t| *t = 0);
        self.clock = 0;
        self.nhits = 0;
    }
}

impl CacheModel for SetAssociativeCache {
    fn load(&mut self, addr: usize) -> bool {
        let line = addr >> self.lnbits;
        let set = (line & self.cmask) * self.nway;
        let clines = &mut self.clines[set..set + self.nway];
        let latimes = &mut self.latimes[set..set + self.nway];

        self.clock += 1;
        if let Some(way) = clines.iter().position(|&l| l == line) {
            self.nhits += 1;
            latimes[way] = self.clock;
            return true;
        }

        let mut lru = 0;
        for way in 1..self.nway {
            if latimes[way] < latimes[lru] {
                lru = way;
            }
        }
        clines[lru] = line;
        latimes[lru] = self.clock;
        false
    }

    fn hit_rate(&self) -> f64 {
        if self.clock == 0 {
            return 0.0;
        }
        self.nhits as f64 / self.clock as f64
    }
}
