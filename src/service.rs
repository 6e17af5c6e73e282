//! The corpus service
//! Validates caller input and runs add/remove/search against a vector store

use std::sync::Arc;

use tracing::debug;

use crate::engine::SimilarityEngine;
use crate::error::{Error, Result};
use crate::store::VectorStore;
use crate::types::{Entry, ScoredResult};
use crate::vector::all_finite;

pub const DEFAULT_K: usize = 5;

/// Knobs for [`CorpusService::search_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub k: usize,
    /// Fail with [`Error::EmptyCorpus`] instead of returning no hits.
    pub require_results: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions { k: DEFAULT_K, require_results: false }
    }
}

/// Orchestrates a [`VectorStore`] and a [`SimilarityEngine`].
///
/// Holds no state besides the store handle and its settings, so it can be
/// shared across threads. The corpus is re-read from the store on every
/// search.
#[derive(Clone)]
pub struct CorpusService {
    store: Arc<dyn VectorStore>,
    engine: SimilarityEngine,
    dimension: Option<usize>,
    default_k: usize,
}

impl CorpusService {
    pub fn new(store: Arc<dyn VectorStore>, engine: SimilarityEngine) -> Self {
        CorpusService { store, engine, dimension: None, default_k: DEFAULT_K }
    }

    /// Require every added vector to have exactly `dimension` components.
    ///
    /// Fails with `InvalidArgument` when `dimension` is zero, since no
    /// vector could ever be added.
    pub fn with_dimension(mut self, dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::InvalidArgument("dimension must be at least 1".to_string()));
        }
        self.dimension = Some(dimension);
        Ok(self)
    }

    /// Fails with `InvalidArgument` when `k` is zero.
    pub fn with_default_k(mut self, k: usize) -> Result<Self> {
        if k == 0 {
            return Err(Error::InvalidArgument("default k must be at least 1".to_string()));
        }
        self.default_k = k;
        Ok(self)
    }

    pub fn default_k(&self) -> usize {
        self.default_k
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Inserts `vector` under `id`, replacing any previous vector.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use semdb::{CorpusService, MemoryStore, SimilarityEngine};
    ///
    /// let service = CorpusService::new(Arc::new(MemoryStore::new()), SimilarityEngine::default());
    /// service.add("X", vec![1.0, 0.0]).unwrap();
    /// service.add("X", vec![0.0, 1.0]).unwrap();
    ///
    /// let hits = service.search(&[0.0, 1.0], 1).unwrap();
    /// assert_eq!(hits[0].id, "X");
    /// assert_eq!(service.count().unwrap(), 1);
    /// ```
    pub fn add(&self, id: impl Into<String>, vector: Vec<f32>) -> Result<()> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::InvalidArgument("id must not be empty".to_string()));
        }
        check_vector(&vector, &id)?;
        if let Some(expected) = self.dimension {
            if vector.len() != expected {
                return Err(Error::DimensionMismatch { id, expected, actual: vector.len() });
            }
        }

        self.store.upsert(&id, &vector)?;
        debug!(%id, dimension = vector.len(), "upserted vector");
        Ok(())
    }

    /// Removes `id`. Succeeds whether or not it was present.
    pub fn remove(&self, id: &str) -> Result<()> {
        self.store.delete(id)?;
        debug!(id, "removed vector");
        Ok(())
    }

    /// Top `k` matches for `query`, best first. No matches is an empty list.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredResult>> {
        self.search_with(query, SearchOptions { k, require_results: false })
    }

    /// [`search`](Self::search) with the configured default `k`.
    pub fn search_default(&self, query: &[f32]) -> Result<Vec<ScoredResult>> {
        self.search(query, self.default_k)
    }

    pub fn search_with(&self, query: &[f32], options: SearchOptions) -> Result<Vec<ScoredResult>> {
        check_vector(query, "query")?;

        let corpus = self.store.scan_all()?;
        let ranking = self.engine.rank(query, &corpus, options.k)?;

        if options.require_results && ranking.hits.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        Ok(ranking.hits)
    }

    pub fn get(&self, id: &str) -> Result<Option<Vec<f32>>> {
        Ok(self.store.get(id)?)
    }

    pub fn list(&self) -> Result<Vec<Entry>> {
        Ok(self.store.scan_all()?)
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.store.len()?)
    }
}

fn check_vector(vector: &[f32], id: &str) -> Result<()> {
    if vector.is_empty() {
        return Err(Error::InvalidArgument(format!("vector '{id}' is empty")));
    }
    if !all_finite(vector) {
        return Err(Error::InvalidArgument(format!("vector '{id}' contains non-finite values")));
    }
    Ok(())
}
