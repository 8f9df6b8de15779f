use std::fmt;

use serde::{Deserialize, Serialize};

use super::confidence::Confidence;

/// How an entity, relationship, or mention was extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Regex/rule based extraction.
    Pattern,
    /// Two entities appearing within the context window.
    CoOccurrence,
    /// Configured dictionary of known names.
    Dictionary,
    /// Caller-supplied context hint for this chunk.
    Hint,
}

impl ExtractionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::CoOccurrence => "co_occurrence",
            Self::Dictionary => "dictionary",
            Self::Hint => "hint",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open character offset span `[start, end)` within a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Character distance between two spans (0 when they overlap).
    pub fn distance(&self, other: &Span) -> usize {
        if self.end <= other.start {
            other.start - self.end
        } else if other.end <= self.start {
            self.start - other.end
        } else {
            0
        }
    }
}

/// One occurrence of an entity in a chunk. Owned by its entity and
/// reassigned wholesale on merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub entity_id: String,
    pub chunk_id: String,
    pub span: Span,
    pub method: ExtractionMethod,
    pub confidence: Confidence,
}

impl Mention {
    /// Create a mention not yet attached to an entity.
    pub fn new(
        chunk_id: impl Into<String>,
        start: usize,
        end: usize,
        method: ExtractionMethod,
        confidence: f64,
    ) -> Self {
        Self {
            entity_id: String::new(),
            chunk_id: chunk_id.into(),
            span: Span::new(start, end),
            method,
            confidence: Confidence::new(confidence),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_distance() {
        let a = Span::new(0, 5);
        let b = Span::new(10, 12);
        assert_eq!(a.distance(&b), 5);
        assert_eq!(b.distance(&a), 5);
        assert_eq!(a.distance(&Span::new(3, 8)), 0);
    }

    #[test]
    fn inverted_span_is_empty() {
        assert!(Span::new(7, 3).is_empty());
    }
}
