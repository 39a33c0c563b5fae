use thiserror::Error;

/// Errors raised when a kernel's preconditions do not hold
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocalityError {
    /// Malformed CSR structure, asymmetric graph, unsorted rows...
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// Negative iteration count, non-bijective permutation, bad cache geometry
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A scratch buffer could not be allocated
    #[error("out of memory: {0}")]
    OutOfMemory(String),
}

pub type Result<T> = std::result::Result<T, LocalityError>;

/// Allocates a zero-filled vector, reporting allocation failure instead of aborting.
pub(crate) fn try_zeroed<T: Clone + Default>(len: usize, what: &str) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|e| {
        LocalityError::OutOfMemory(format!("{}: {} elements ({})", what, len, e))
    })?;
    v.resize(len, T::default());
    Ok(v)
}
