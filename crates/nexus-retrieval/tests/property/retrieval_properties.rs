//! Property tests for ranking: determinism and order independence.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use nexus_core::config::RankingConfig;
use nexus_core::models::SearchCandidate;
use nexus_retrieval::ranking::rank_at;

fn candidates() -> impl Strategy<Value = Vec<SearchCandidate>> {
    prop::collection::vec(
        (
            prop::option::of(0.0f64..1.0),
            0.0f64..1.0,
            prop::option::of(0i64..365),
        ),
        0..30,
    )
    .prop_map(|rows| {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        rows.into_iter()
            .enumerate()
            .map(|(i, (vector, graph, age))| {
                let mut c = match vector {
                    Some(score) => SearchCandidate::vector(format!("chunk-{i:02}"), score, i),
                    None => SearchCandidate::graph(format!("chunk-{i:02}"), graph),
                };
                c.graph_score = graph;
                c.timestamp = age.map(|days| base - Duration::days(days));
                c
            })
            .collect()
    })
}

fn weights() -> impl Strategy<Value = RankingConfig> {
    (0.0f64..2.0, 0.0f64..2.0, 0.0f64..2.0, 1.0f64..90.0).prop_map(|(v, g, r, h)| RankingConfig {
        vector_weight: v,
        graph_weight: g,
        recency_weight: r,
        recency_half_life_days: h,
    })
}

// =============================================================================
// Identical inputs produce identical output, regardless of input order
// =============================================================================
proptest! {
    #[test]
    fn ranking_is_deterministic(
        (list, shuffled) in candidates().prop_flat_map(|list| {
            let shuffled = Just(list.clone()).prop_shuffle();
            (Just(list), shuffled)
        }),
        weights in weights(),
    ) {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
        let first = rank_at(&list, &weights, now);
        let second = rank_at(&list, &weights, now);
        let reordered = rank_at(&shuffled, &weights, now);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&first, &reordered);
    }
}

// =============================================================================
// Output is a 1-based, non-increasing ranking with bounded scores
// =============================================================================
proptest! {
    #[test]
    fn ranking_is_ordered_and_bounded(list in candidates(), weights in weights()) {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
        let ranked = rank_at(&list, &weights, now);
        prop_assert_eq!(ranked.len(), list.len());
        for (i, r) in ranked.iter().enumerate() {
            prop_assert_eq!(r.rank, i + 1);
            prop_assert!(r.combined_score >= 0.0);
            prop_assert!(r.combined_score <= 1.0 + 1e-9);
            let b = r.breakdown;
            for signal in [b.vector, b.graph, b.recency] {
                prop_assert!((0.0..=1.0).contains(&signal));
            }
        }
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].combined_score >= pair[1].combined_score);
        }
    }
}
