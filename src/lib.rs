//! # semdb - Semantic Vector Search
//!
//! semdb stores fixed-length embedding vectors keyed by id and answers
//! nearest-neighbor queries under cosine similarity. Vectors are stored as
//! given; normalization happens at query time in the [`SimilarityEngine`],
//! which scans the whole corpus and keeps the top-K with a deterministic
//! tie-break (equal scores order by ascending id).
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use semdb::{CorpusService, MemoryStore, SimilarityEngine};
//!
//! let service = CorpusService::new(Arc::new(MemoryStore::new()), SimilarityEngine::default());
//!
//! // Insert vectors
//! service.add("vec1", vec![1.0, 0.0, 0.0]).unwrap();
//! service.add("vec2", vec![0.0, 1.0, 0.0]).unwrap();
//! service.add("vec3", vec![0.7, 0.7, 0.0]).unwrap();
//!
//! // Search for similar vectors
//! let results = service.search(&[1.0, 0.0, 0.0], 2).unwrap();
//! assert_eq!(results[0].id, "vec1"); // Most similar vector
//! assert_eq!(results[1].id, "vec3");
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod server;
pub mod service;
pub mod store;
pub mod types;
pub mod vector;

pub use config::{Config, ConfigError};
pub use engine::{Metric, Ranking, SimilarityEngine};
pub use error::{Error, Result};
pub use service::{CorpusService, SearchOptions};
pub use store::{FileStore, MemoryStore, StoreError, VectorStore};
pub use types::{Entry, ScoredResult};
