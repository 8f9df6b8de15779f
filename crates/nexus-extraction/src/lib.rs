//! # nexus-extraction
//!
//! Turns chunk text into candidate entities, relationships, and mentions.
//!
//! Three methods feed one per-chunk candidate set:
//! - pattern NER over capitalized spans plus typed relation connectors
//! - co-occurrence `related_to` edges inside a character window
//! - dictionary and context-hint name matching
//!
//! Candidates are merged by normalized name, thresholded, and capped before
//! they leave the chunk.

pub mod cooccurrence;
pub mod dictionary;
pub mod engine;
pub mod lexicon;
pub mod ner;
pub mod offsets;
pub mod relations;

pub use engine::ExtractionEngine;
pub use ner::{NerTagger, TaggedSpan};
pub use relations::{RelationMatch, RelationMatcher};
