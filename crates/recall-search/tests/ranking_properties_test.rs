//! Randomized checks of ranking invariants over mixed candidate sets.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use recall_core::EmbeddedItem;
use recall_search::{cosine_similarity, BruteForceRanker, SimilarityRanker};
use uuid::Uuid;

const DIM: usize = 16;

fn random_vector(rng: &mut StdRng, dim: usize) -> Vec<f64> {
    (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

fn mixed_candidates(rng: &mut StdRng, n: usize) -> Vec<EmbeddedItem> {
    (0..n)
        .map(|i| {
            let embedding = match i % 5 {
                0 => Vec::new(),
                1 => random_vector(rng, DIM + 3),
                _ => random_vector(rng, DIM),
            };
            EmbeddedItem {
                id: Uuid::new_v4(),
                title: format!("item-{i}"),
                content: String::new(),
                embedding,
            }
        })
        .collect()
}

#[test]
fn test_ranking_never_returns_incomparable_candidates() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let query = random_vector(&mut rng, DIM);
        let candidates = mixed_candidates(&mut rng, 40);
        let comparable: Vec<Uuid> = candidates
            .iter()
            .filter(|c| c.embedding.len() == DIM)
            .map(|c| c.id)
            .collect();

        let ranked = BruteForceRanker.rank(&query, candidates, 100);
        assert_eq!(ranked.len(), comparable.len());
        assert!(ranked.iter().all(|s| comparable.contains(&s.item.id)));
    }
}

#[test]
fn test_ranking_scores_are_bounded_and_sorted() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..50 {
        let query = random_vector(&mut rng, DIM);
        let ranked = BruteForceRanker.rank(&query, mixed_candidates(&mut rng, 30), 5);

        assert!(ranked.len() <= 5);
        for pair in ranked.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert!(ranked.iter().all(|s| (-1.0..=1.0).contains(&s.score)));
    }
}

#[test]
fn test_self_similarity_is_one_for_random_vectors() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..100 {
        let v = random_vector(&mut rng, DIM);
        let neg: Vec<f64> = v.iter().map(|x| -x).collect();
        assert!((cosine_similarity(&v, &v).unwrap() - 1.0).abs() < 1e-9);
        assert!((cosine_similarity(&v, &neg).unwrap() + 1.0).abs() < 1e-9);
    }
}
