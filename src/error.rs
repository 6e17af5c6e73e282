//! Error types shared by the engine, the service and the stores.

use thiserror::Error;

use crate::store::StoreError;
use crate::vector::VectorError;

/// Errors returned by [`SimilarityEngine`](crate::SimilarityEngine) and
/// [`CorpusService`](crate::CorpusService).
#[derive(Debug, Error)]
pub enum Error {
    /// Bad `k`, empty or non-finite vector, empty id.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A vector's length disagrees with the query or the configured dimension.
    #[error("dimension mismatch for '{id}': expected {expected}, got {actual}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },

    /// The query has zero norm, so cosine similarity is undefined.
    #[error("query vector has zero norm")]
    ZeroVector,

    /// The vector store could not serve the request.
    #[error("vector store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// Nothing could be ranked and the caller asked for at least one result.
    #[error("corpus has no rankable entries")]
    EmptyCorpus,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Attach the offending entry id to a vector math failure.
    pub(crate) fn at_entry(err: VectorError, id: &str) -> Self {
        match err {
            VectorError::DimensionMismatch { left, right } => Error::DimensionMismatch {
                id: id.to_owned(),
                expected: left,
                actual: right,
            },
            other => Error::InvalidArgument(format!("vector '{id}': {other}")),
        }
    }
}
