//! Property tests for nexus-extraction: output shape invariants on arbitrary text.

use std::collections::HashSet;

use proptest::prelude::*;

use nexus_core::config::ExtractionConfig;
use nexus_core::models::Chunk;
use nexus_extraction::ExtractionEngine;

fn text_strategy() -> impl Strategy<Value = String> {
    let word = prop_oneof![
        Just("Alice".to_string()),
        Just("Acme Corp".to_string()),
        Just("works at".to_string()),
        Just("located in".to_string()),
        Just("Berlin".to_string()),
        Just("the".to_string()),
        Just("The".to_string()),
        Just(".".to_string()),
        Just("Zoë".to_string()),
        "[A-Za-z]{1,8}",
    ];
    prop::collection::vec(word, 0..40).prop_map(|w| w.join(" "))
}

// =============================================================================
// Keys are unique and every relationship endpoint is an emitted entity
// =============================================================================
proptest! {
    #[test]
    fn relationships_reference_emitted_entities(text in text_strategy()) {
        let engine = ExtractionEngine::new(ExtractionConfig::default());
        let out = engine.extract(&Chunk::new("c1", "doc", text));
        prop_assert!(!out.is_error());

        let keys: HashSet<&str> = out.entities.iter().map(|e| e.key.as_str()).collect();
        prop_assert_eq!(keys.len(), out.entities.len());
        for rel in &out.relationships {
            prop_assert!(keys.contains(rel.source_key.as_str()));
            prop_assert!(keys.contains(rel.target_key.as_str()));
            prop_assert!(rel.source_key != rel.target_key);
        }
    }
}

// =============================================================================
// Thresholds and the per-chunk cap always hold
// =============================================================================
proptest! {
    #[test]
    fn thresholds_and_cap_hold(
        text in text_strategy(),
        cap in 1_usize..6,
        min_entity in 0.0_f64..0.9,
    ) {
        let config = ExtractionConfig {
            max_entities_per_chunk: cap,
            min_entity_confidence: min_entity,
            ..Default::default()
        };
        let out = ExtractionEngine::new(config.clone()).extract(&Chunk::new("c1", "doc", text.clone()));
        prop_assert!(out.entities.len() <= cap);
        let char_len = text.chars().count();
        for e in &out.entities {
            prop_assert!(e.confidence.value() >= min_entity);
            prop_assert!(e.confidence.in_range());
            prop_assert!(!e.mentions.is_empty());
            for m in &e.mentions {
                prop_assert!(m.span.end <= char_len);
            }
        }
        for rel in &out.relationships {
            prop_assert!(rel.confidence.value() >= config.min_relationship_confidence);
        }
    }
}
