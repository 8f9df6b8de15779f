//! Case-insensitive matching of known names from config or context hints.

use regex::Regex;
use tracing::warn;

use nexus_core::models::{EntityType, ExtractionMethod};

/// A known name and the type it should be assigned.
struct Term {
    name: String,
    entity_type: EntityType,
    confidence: f64,
    method: ExtractionMethod,
    regex: Regex,
}

/// One dictionary hit. Offsets are byte offsets into the text.
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryHit {
    /// The configured name (used as the candidate's display name).
    pub name: String,
    /// The text as it appears in the chunk.
    pub surface: String,
    pub start: usize,
    pub end: usize,
    pub entity_type: EntityType,
    pub confidence: f64,
    pub method: ExtractionMethod,
}

#[derive(Default)]
pub struct DictionaryMatcher {
    terms: Vec<Term>,
}

impl DictionaryMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a term. Names that produce an invalid pattern are skipped with a warning.
    pub fn add(
        &mut self,
        name: &str,
        entity_type: EntityType,
        confidence: f64,
        method: ExtractionMethod,
    ) {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return;
        }
        let pattern = format!(r"(?i)\b{}\b", regex::escape(trimmed));
        match Regex::new(&pattern) {
            Ok(regex) => self.terms.push(Term {
                name: trimmed.to_string(),
                entity_type,
                confidence,
                method,
                regex,
            }),
            Err(e) => warn!(name = trimmed, error = %e, "skipping dictionary term"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn find(&self, text: &str) -> Vec<DictionaryHit> {
        let mut hits = Vec::new();
        for term in &self.terms {
            for m in term.regex.find_iter(text) {
                hits.push(DictionaryHit {
                    name: term.name.clone(),
                    surface: m.as_str().to_string(),
                    start: m.start(),
                    end: m.end(),
                    entity_type: term.entity_type,
                    confidence: term.confidence,
                    method: term.method,
                });
            }
        }
        hits.sort_by_key(|h| (h.start, h.end));
        hits
    }
}
