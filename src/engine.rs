//! The similarity engine
//! Scores a query against a corpus snapshot and keeps the top-K matches

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Entry, ScoredResult};
use crate::vector::{all_finite, dot_product, euclidean_distance, l2_normalize, VectorError};

/// How a corpus vector is scored against the query. Higher is always better.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Dot product of unit vectors, in [-1, 1].
    #[default]
    Cosine,
    /// Raw dot product of the stored vectors.
    Dot,
    /// Negated euclidean distance.
    Euclidean,
}

/// Output of [`SimilarityEngine::rank`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    /// Best first, ties broken by ascending id.
    pub hits: Vec<ScoredResult>,
    /// Corpus ids skipped because their vector has zero norm.
    pub excluded: Vec<String>,
}

/// Brute-force ranking over a materialized corpus.
///
/// Every call is a full linear scan: O(n·D) scoring plus O(n log k)
/// selection. There is no index, so this only suits small corpora.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityEngine {
    metric: Metric,
}

impl SimilarityEngine {
    pub fn new(metric: Metric) -> Self {
        SimilarityEngine { metric }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Ranks `corpus` against `query` and returns at most `k` hits.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` - `k` is zero, a vector is empty or holds NaN/inf,
    ///   or a dot/euclidean score overflows
    /// * `DimensionMismatch` - a corpus vector's length differs from the query
    /// * `ZeroVector` - the query has zero norm under [`Metric::Cosine`]
    ///
    /// Zero-norm corpus vectors are not an error under cosine: they are left
    /// out and listed in [`Ranking::excluded`]. An empty corpus yields an
    /// empty ranking.
    ///
    /// # Examples
    ///
    /// ```
    /// use semdb::{Entry, SimilarityEngine};
    ///
    /// let corpus = vec![
    ///     Entry::new("A", vec![1.0, 0.0]),
    ///     Entry::new("B", vec![0.0, 1.0]),
    ///     Entry::new("C", vec![1.0, 1.0]),
    /// ];
    /// let ranking = SimilarityEngine::default().rank(&[1.0, 0.0], &corpus, 2).unwrap();
    ///
    /// assert_eq!(ranking.hits[0].id, "A");
    /// assert_eq!(ranking.hits[1].id, "C");
    /// ```
    pub fn rank(&self, query: &[f32], corpus: &[Entry], k: usize) -> Result<Ranking> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be at least 1".to_string()));
        }
        let query = self.prepare_query(query)?;

        let mut heap: BinaryHeap<Reverse<Candidate<'_>>> = BinaryHeap::with_capacity(k + 1);
        let mut excluded = Vec::new();

        for entry in corpus {
            if entry.vector.len() != query.len() {
                return Err(Error::DimensionMismatch {
                    id: entry.id.clone(),
                    expected: query.len(),
                    actual: entry.vector.len(),
                });
            }

            let Some(score) = self.score(&query, entry)? else {
                debug!(id = %entry.id, "excluding zero-norm vector from ranking");
                excluded.push(entry.id.clone());
                continue;
            };

            let candidate = Candidate { score, id: &entry.id };
            if heap.len() < k {
                heap.push(Reverse(candidate));
            } else if heap.peek().is_some_and(|Reverse(worst)| candidate > *worst) {
                heap.pop();
                heap.push(Reverse(candidate));
            }
        }

        // Ascending order of `Reverse` is best-first.
        let hits: Vec<ScoredResult> = heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(c)| ScoredResult { id: c.id.to_owned(), score: c.score })
            .collect();

        debug!(
            metric = ?self.metric,
            scanned = corpus.len(),
            excluded = excluded.len(),
            returned = hits.len(),
            "ranked corpus"
        );

        Ok(Ranking { hits, excluded })
    }

    fn prepare_query(&self, query: &[f32]) -> Result<Vec<f32>> {
        if query.is_empty() {
            return Err(Error::InvalidArgument("query vector is empty".to_string()));
        }
        if !all_finite(query) {
            return Err(Error::InvalidArgument("query vector contains non-finite values".to_string()));
        }

        match self.metric {
            Metric::Cosine => match l2_normalize(query) {
                Ok(unit) => Ok(unit),
                Err(VectorError::Zero) => Err(Error::ZeroVector),
                Err(err) => Err(Error::at_entry(err, "query")),
            },
            Metric::Dot | Metric::Euclidean => Ok(query.to_vec()),
        }
    }

    /// `None` means the entry must be excluded.
    fn score(&self, query: &[f32], entry: &Entry) -> Result<Option<f32>> {
        if !all_finite(&entry.vector) {
            return Err(Error::at_entry(VectorError::NonFinite, &entry.id));
        }

        let score = match self.metric {
            Metric::Cosine => {
                let unit = match l2_normalize(&entry.vector) {
                    Ok(unit) => unit,
                    Err(VectorError::Zero) => return Ok(None),
                    Err(err) => return Err(Error::at_entry(err, &entry.id)),
                };
                let cos = dot_product(query, &unit).map_err(|e| Error::at_entry(e, &entry.id))?;
                cos.clamp(-1.0, 1.0)
            }
            Metric::Dot => dot_product(query, &entry.vector).map_err(|e| Error::at_entry(e, &entry.id))?,
            Metric::Euclidean => {
                -euclidean_distance(query, &entry.vector).map_err(|e| Error::at_entry(e, &entry.id))?
            }
        };

        // Dot and euclidean can overflow on finite input.
        if !score.is_finite() {
            return Err(Error::at_entry(VectorError::NonFinite, &entry.id));
        }

        // total_cmp orders -0.0 below 0.0, which would split a tie.
        Ok(Some(score + 0.0))
    }
}

/// Ordered so that the better match compares greater.
#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    score: f32,
    id: &'a str,
}

impl Ord for Candidate<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.id.cmp(self.id))
    }
}

impl PartialOrd for Candidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate<'_> {}
