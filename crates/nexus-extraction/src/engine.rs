//! ExtractionEngine: implements IEntityExtractor over the pattern,
//! dictionary, and co-occurrence methods.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, warn};

use nexus_core::config::defaults::DEFAULT_DICTIONARY_CONFIDENCE;
use nexus_core::config::ExtractionConfig;
use nexus_core::errors::{ExtractionError, NexusResult};
use nexus_core::extraction_span;
use nexus_core::models::{
    CandidateEntity, CandidateMention, CandidateRelationship, Chunk, Confidence, EntityType,
    ExtractionMethod, ExtractionOutput, Span,
};
use nexus_core::text::normalize_name;
use nexus_core::traits::IEntityExtractor;

use crate::cooccurrence::{self, CoOccurrenceParams};
use crate::dictionary::DictionaryMatcher;
use crate::ner::NerTagger;
use crate::offsets::CharOffsets;
use crate::relations::RelationMatcher;

/// Raw observation before per-chunk grouping.
struct Observation {
    key: String,
    name: String,
    surface: String,
    span: Span,
    entity_type: EntityType,
    confidence: f64,
    method: ExtractionMethod,
}

/// The default extractor.
pub struct ExtractionEngine {
    config: ExtractionConfig,
    tagger: Option<NerTagger>,
    relations: Option<RelationMatcher>,
    dictionary: DictionaryMatcher,
}

impl ExtractionEngine {
    pub fn new(config: ExtractionConfig) -> Self {
        let (tagger, relations) = match config.pattern_params() {
            Some((entity_conf, rel_conf)) => (
                Some(NerTagger::new(entity_conf)),
                Some(RelationMatcher::new(rel_conf)),
            ),
            None => (None, None),
        };
        let mut dictionary = DictionaryMatcher::new();
        for (entry, confidence) in config.dictionary() {
            dictionary.add(
                &entry.name,
                entry.entity_type,
                confidence,
                ExtractionMethod::Dictionary,
            );
        }
        Self {
            config,
            tagger,
            relations,
            dictionary,
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract from one chunk, folding failures into an annotated empty result.
    pub fn extract(&self, chunk: &Chunk) -> ExtractionOutput {
        match self.try_extract(chunk) {
            Ok(output) => output,
            Err(e) => {
                warn!(chunk_id = %chunk.id, error = %e, "extraction failed, skipping chunk");
                ExtractionOutput::failed(chunk.id.clone(), e.to_string())
            }
        }
    }

    fn validate(&self, chunk: &Chunk) -> NexusResult<()> {
        if chunk.id.trim().is_empty() {
            return Err(ExtractionError::EmptyChunkId.into());
        }
        let chars = chunk.text.chars().count();
        if chars > self.config.max_chunk_chars {
            return Err(ExtractionError::ChunkTooLarge {
                chunk_id: chunk.id.clone(),
                max_chars: self.config.max_chunk_chars,
                actual: chars,
            }
            .into());
        }
        Ok(())
    }

    fn run(&self, chunk: &Chunk) -> ExtractionOutput {
        let text = chunk.text.as_str();
        let offsets = CharOffsets::new(text);
        let mut observations = Vec::new();
        let mut pattern_links: Vec<(String, String, CandidateRelationship)> = Vec::new();

        if let (Some(tagger), Some(matcher)) = (&self.tagger, &self.relations) {
            let mut spans = tagger.tag(text);
            let matches = matcher.match_spans(text, &mut spans);
            let keys: Vec<String> = spans.iter().map(|s| normalize_name(&s.surface)).collect();
            for m in matches {
                let (source_key, target_key) = (keys[m.source].clone(), keys[m.target].clone());
                if source_key == target_key || source_key.is_empty() || target_key.is_empty() {
                    continue;
                }
                pattern_links.push((
                    source_key.clone(),
                    target_key.clone(),
                    CandidateRelationship {
                        source_key,
                        target_key,
                        relationship_type: m.relationship_type,
                        confidence: Confidence::new(m.confidence),
                        directed: m.relationship_type.directed(),
                        method: ExtractionMethod::Pattern,
                    },
                ));
            }
            for (span, key) in spans.into_iter().zip(keys) {
                observations.push(Observation {
                    key,
                    name: span.surface.clone(),
                    surface: span.surface,
                    span: offsets.span(span.start, span.end),
                    entity_type: span.entity_type,
                    confidence: span.confidence,
                    method: ExtractionMethod::Pattern,
                });
            }
        }

        let hint_matcher = hint_dictionary(chunk);
        for matcher in [&self.dictionary, &hint_matcher] {
            for hit in matcher.find(text) {
                observations.push(Observation {
                    key: normalize_name(&hit.name),
                    name: hit.name,
                    surface: hit.surface,
                    span: offsets.span(hit.start, hit.end),
                    entity_type: hit.entity_type,
                    confidence: hit.confidence,
                    method: hit.method,
                });
            }
        }

        let mut output = ExtractionOutput::empty(chunk.id.clone());
        let mut entities = group(observations);

        // Threshold, then cap by confidence.
        let before = entities.len();
        entities.retain(|e| e.confidence.value() >= self.config.min_entity_confidence);
        output.dropped += before - entities.len();
        if entities.len() > self.config.max_entities_per_chunk {
            entities.sort_by(|a, b| {
                b.confidence
                    .value()
                    .partial_cmp(&a.confidence.value())
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| first_offset(a).cmp(&first_offset(b)))
            });
            output.dropped += entities.len() - self.config.max_entities_per_chunk;
            entities.truncate(self.config.max_entities_per_chunk);
        }
        entities.sort_by_key(first_offset);

        let kept: HashSet<&str> = entities.iter().map(|e| e.key.as_str()).collect();
        let min_rel = self.config.min_relationship_confidence;

        let mut relationships: BTreeMap<(String, String, &'static str), CandidateRelationship> =
            BTreeMap::new();
        let mut linked = HashSet::new();
        for (source, target, rel) in pattern_links {
            if !kept.contains(source.as_str()) || !kept.contains(target.as_str()) {
                continue;
            }
            if rel.confidence.value() < min_rel {
                output.dropped += 1;
                continue;
            }
            linked.insert((source.clone(), target.clone()));
            let key = (source, target, rel.relationship_type.as_str());
            let confidence = rel.confidence;
            relationships
                .entry(key)
                .and_modify(|existing| {
                    if confidence > existing.confidence {
                        existing.confidence = confidence;
                    }
                })
                .or_insert(rel);
        }
        output.relationships = relationships.into_values().collect();

        if let Some((base_confidence, floor)) = self.config.co_occurrence_params() {
            let params = CoOccurrenceParams {
                window: self.config.context_window,
                base_confidence,
                floor,
            };
            for rel in cooccurrence::analyze(&entities, &params, &linked) {
                if rel.confidence.value() >= min_rel {
                    output.relationships.push(rel);
                }
            }
        }

        output.entities = entities;
        output
    }
}

impl IEntityExtractor for ExtractionEngine {
    fn try_extract(&self, chunk: &Chunk) -> NexusResult<ExtractionOutput> {
        let span = extraction_span!(chunk.id);
        let _guard = span.enter();
        self.validate(chunk)?;
        let output = self.run(chunk);
        debug!(
            entities = output.entities.len(),
            relationships = output.relationships.len(),
            dropped = output.dropped,
            "chunk extracted"
        );
        Ok(output)
    }

    fn name(&self) -> &str {
        "pattern"
    }
}

fn hint_dictionary(chunk: &Chunk) -> DictionaryMatcher {
    let mut matcher = DictionaryMatcher::new();
    if let Some(hints) = &chunk.hints {
        for (name, entity_type) in &hints.known_entities {
            matcher.add(
                name,
                *entity_type,
                DEFAULT_DICTIONARY_CONFIDENCE,
                ExtractionMethod::Hint,
            );
        }
    }
    matcher
}

fn method_priority(method: ExtractionMethod) -> u8 {
    match method {
        ExtractionMethod::Hint => 3,
        ExtractionMethod::Dictionary => 2,
        ExtractionMethod::Pattern => 1,
        ExtractionMethod::CoOccurrence => 0,
    }
}

fn first_offset(e: &CandidateEntity) -> usize {
    e.mentions.iter().map(|m| m.span.start).min().unwrap_or(usize::MAX)
}

/// Merge observations sharing a normalized name. The highest-priority
/// method decides name and type; a specific type beats a generic one at
/// equal priority. Identical spans collapse into one mention.
fn group(observations: Vec<Observation>) -> Vec<CandidateEntity> {
    struct Acc {
        entity: CandidateEntity,
        priority: u8,
        spans: HashMap<Span, usize>,
    }

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Acc> = HashMap::new();

    for obs in observations {
        if obs.key.is_empty() {
            continue;
        }
        let priority = method_priority(obs.method);
        let mention = CandidateMention {
            span: obs.span,
            method: obs.method,
            confidence: Confidence::new(obs.confidence),
        };
        match groups.get_mut(&obs.key) {
            None => {
                order.push(obs.key.clone());
                let mut spans = HashMap::new();
                spans.insert(obs.span, 0);
                groups.insert(
                    obs.key.clone(),
                    Acc {
                        entity: CandidateEntity {
                            key: obs.key,
                            name: obs.name,
                            entity_type: obs.entity_type,
                            confidence: Confidence::new(obs.confidence),
                            aliases: vec![obs.surface],
                            mentions: vec![mention],
                        },
                        priority,
                        spans,
                    },
                );
            }
            Some(acc) => {
                let e = &mut acc.entity;
                let more_specific = priority == acc.priority
                    && e.entity_type.is_generic()
                    && !obs.entity_type.is_generic();
                if priority > acc.priority || more_specific {
                    e.entity_type = obs.entity_type;
                    if priority > acc.priority {
                        e.name = obs.name;
                    }
                    acc.priority = priority;
                }
                if mention.confidence > e.confidence {
                    e.confidence = mention.confidence;
                }
                if !e.aliases.contains(&obs.surface) {
                    e.aliases.push(obs.surface);
                }
                match acc.spans.get(&obs.span) {
                    Some(&idx) => {
                        let existing = &mut e.mentions[idx];
                        if method_priority(mention.method) > method_priority(existing.method) {
                            existing.method = mention.method;
                        }
                        if mention.confidence > existing.confidence {
                            existing.confidence = mention.confidence;
                        }
                    }
                    None => {
                        acc.spans.insert(obs.span, e.mentions.len());
                        e.mentions.push(mention);
                    }
                }
            }
        }
    }

    order
        .into_iter()
        .filter_map(|k| groups.remove(&k))
        .map(|mut acc| {
            acc.entity.mentions.sort_by_key(|m| m.span.start);
            acc.entity
        })
        .collect()
}
