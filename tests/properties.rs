//! Property-based tests for ranking and the corpus service.

use std::sync::Arc;

use proptest::prelude::*;
use semdb::{CorpusService, Entry, Error, MemoryStore, SimilarityEngine, vector::norm};

/// Vectors of a fixed dimension, kept away from zero norm.
fn arb_vector(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-100.0f32..100.0, dim).prop_filter("non-zero norm", |v| norm(v) > 1e-2)
}

/// A corpus with unique ids plus a query of the same dimension.
fn arb_case() -> impl Strategy<Value = (Vec<f32>, Vec<Entry>, usize)> {
    (2usize..12).prop_flat_map(|dim| {
        (
            arb_vector(dim),
            prop::collection::vec(arb_vector(dim), 0..40),
            1usize..10,
        )
            .prop_map(|(query, vectors, k)| {
                let corpus = vectors
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| Entry::new(format!("id{i:03}"), v))
                    .collect();
                (query, corpus, k)
            })
    })
}

proptest! {
    #[test]
    fn rank_respects_k_and_score_range((query, corpus, k) in arb_case()) {
        let ranking = SimilarityEngine::default().rank(&query, &corpus, k).unwrap();

        prop_assert_eq!(ranking.hits.len(), k.min(corpus.len()));
        for hit in &ranking.hits {
            prop_assert!((-1.0..=1.0).contains(&hit.score));
        }
        for w in ranking.hits.windows(2) {
            prop_assert!(
                w[0].score > w[1].score || (w[0].score == w[1].score && w[0].id < w[1].id)
            );
        }
    }

    #[test]
    fn rank_is_deterministic((query, corpus, k) in arb_case()) {
        let engine = SimilarityEngine::default();
        let first = engine.rank(&query, &corpus, k).unwrap();

        let mut shuffled = corpus.clone();
        shuffled.reverse();
        let second = engine.rank(&query, &shuffled, k).unwrap();

        prop_assert_eq!(first, second);
    }

    #[test]
    fn rank_is_scale_invariant_for_powers_of_two(
        (query, corpus, k) in arb_case(),
        exp in -4i32..5,
    ) {
        // Power-of-two scaling is exact in floating point, so the unit vector is unchanged.
        let scale = 2f32.powi(exp);
        let scaled: Vec<f32> = query.iter().map(|x| x * scale).collect();
        let engine = SimilarityEngine::default();

        prop_assert_eq!(
            engine.rank(&query, &corpus, k).unwrap(),
            engine.rank(&scaled, &corpus, k).unwrap()
        );
    }

    #[test]
    fn rank_scores_are_scale_invariant((query, corpus, k) in arb_case(), scale in 0.01f32..100.0) {
        let scaled: Vec<f32> = query.iter().map(|x| x * scale).collect();
        let engine = SimilarityEngine::default();

        let plain = engine.rank(&query, &corpus, k).unwrap();
        let scaled = engine.rank(&scaled, &corpus, k).unwrap();

        prop_assert_eq!(plain.hits.len(), scaled.hits.len());
        for (a, b) in plain.hits.iter().zip(&scaled.hits) {
            prop_assert!((a.score - b.score).abs() < 1e-4);
        }
    }

    #[test]
    fn rank_finds_itself((_query, corpus, _k) in arb_case(), pick in any::<prop::sample::Index>()) {
        prop_assume!(!corpus.is_empty());
        let target = &corpus[pick.index(corpus.len())];

        let ranking = SimilarityEngine::default().rank(&target.vector, &corpus, 1).unwrap();

        prop_assert!((ranking.hits[0].score - 1.0).abs() < 1e-4);
    }

    #[test]
    fn zero_corpus_vectors_never_surface((query, mut corpus, k) in arb_case()) {
        let dim = query.len();
        corpus.push(Entry::new("zero", vec![0.0; dim]));

        let ranking = SimilarityEngine::default().rank(&query, &corpus, k).unwrap();

        prop_assert!(ranking.hits.iter().all(|h| h.id != "zero"));
        prop_assert_eq!(ranking.excluded, vec!["zero".to_string()]);
    }

    #[test]
    fn dimension_mismatch_returns_no_results((query, mut corpus, k) in arb_case()) {
        corpus.push(Entry::new("odd", vec![1.0; query.len() + 1]));

        let result = SimilarityEngine::default().rank(&query, &corpus, k);

        prop_assert!(
            matches!(result, Err(Error::DimensionMismatch { ref id, .. }) if id == "odd"),
            "unexpected result: {:?}",
            result
        );
    }

    #[test]
    fn zero_query_is_rejected((query, corpus, k) in arb_case()) {
        let zero = vec![0.0; query.len()];
        prop_assert!(matches!(SimilarityEngine::default().rank(&zero, &corpus, k), Err(Error::ZeroVector)));
    }

    #[test]
    fn upsert_then_search_finds_latest(first in arb_vector(4), second in arb_vector(4)) {
        let service = CorpusService::new(Arc::new(MemoryStore::new()), SimilarityEngine::default());
        service.add("X", first).unwrap();
        service.add("X", second.clone()).unwrap();

        let hits = service.search(&second, 1).unwrap();

        prop_assert_eq!(service.count().unwrap(), 1);
        prop_assert_eq!(&hits[0].id, "X");
        prop_assert!((hits[0].score - 1.0).abs() < 1e-4);
    }
}

#[test]
fn self_similarity_picks_own_id() {
    let corpus = vec![
        Entry::new("A", vec![1.0, 0.0, 0.0]),
        Entry::new("B", vec![0.0, 1.0, 0.0]),
        Entry::new("X", vec![0.3, -0.2, 0.9]),
    ];

    let ranking = SimilarityEngine::default().rank(&[0.3, -0.2, 0.9], &corpus, 1).unwrap();

    assert_eq!(ranking.hits[0].id, "X");
    assert!((ranking.hits[0].score - 1.0).abs() < 1e-6);
}
