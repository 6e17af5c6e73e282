//! Records exchanged between the store, the engine and callers.

use serde::{Deserialize, Serialize};

/// A stored vector and its identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub vector: Vec<f32>,
}

impl Entry {
    pub fn new(id: impl Into<String>, vector: Vec<f32>) -> Self {
        Entry { id: id.into(), vector }
    }
}

/// One ranked match. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResult {
    pub id: String,
    pub score: f32,
}
