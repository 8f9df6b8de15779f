//! Typed relationships from the connector text between adjacent spans.
//!
//! Only the text strictly between two neighbouring tagged spans is examined,
//! so a connector never reaches across a third entity or a sentence break.

use std::sync::LazyLock;

use regex::Regex;

use nexus_core::models::{EntityType, RelationshipType};

use crate::ner::TaggedSpan;

/// Longest connector considered, in bytes.
const MAX_CONNECTOR_LEN: usize = 48;

struct Connector {
    regex: &'static LazyLock<Option<Regex>>,
    relationship_type: RelationshipType,
    /// Types implied for (source, target) when the tagger had no strong evidence.
    implies: (Option<EntityType>, Option<EntityType>),
}

macro_rules! connector {
    ($name:ident, $regex_str:expr) => {
        static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($regex_str).ok());
    };
}

connector!(
    RE_WORKS_AT,
    r"^(?:(?:now|currently|still|also)\s+)?(?:works?|worked|working|is\s+employed|was\s+employed)\s+(?:at|for|by)$|^joined$"
);
connector!(
    RE_LOCATED_IN,
    r"^(?:is\s+|was\s+|are\s+)?(?:located|based|headquartered|situated)\s+in$|^(?:lives|lived)\s+in$"
);
connector!(
    RE_PART_OF,
    r"^(?:is\s+|was\s+)?(?:part|a\s+division|a\s+subsidiary|a\s+unit|a\s+member)\s+of$|^belongs\s+to$"
);
connector!(RE_FOUNDED, r"^(?:co-?)?founded$|^(?:started|established)$");
connector!(
    RE_MANAGES,
    r"^(?:manages|managed|leads|led|runs|ran|oversees|heads)$"
);
connector!(
    RE_CREATED,
    r"^(?:created|built|developed|designed|wrote|invented|authored)$"
);
connector!(
    RE_USES,
    r"^(?:uses|used|relies\s+on|relied\s+on|adopted|runs\s+on)$"
);

static CONNECTORS: [Connector; 7] = [
    Connector {
        regex: &RE_WORKS_AT,
        relationship_type: RelationshipType::WorksAt,
        implies: (Some(EntityType::Person), Some(EntityType::Organization)),
    },
    Connector {
        regex: &RE_LOCATED_IN,
        relationship_type: RelationshipType::LocatedIn,
        implies: (None, Some(EntityType::Location)),
    },
    Connector {
        regex: &RE_PART_OF,
        relationship_type: RelationshipType::PartOf,
        implies: (None, Some(EntityType::Organization)),
    },
    Connector {
        regex: &RE_FOUNDED,
        relationship_type: RelationshipType::Founded,
        implies: (Some(EntityType::Person), Some(EntityType::Organization)),
    },
    Connector {
        regex: &RE_MANAGES,
        relationship_type: RelationshipType::Manages,
        implies: (Some(EntityType::Person), None),
    },
    Connector {
        regex: &RE_CREATED,
        relationship_type: RelationshipType::Created,
        implies: (Some(EntityType::Person), Some(EntityType::Product)),
    },
    Connector {
        regex: &RE_USES,
        relationship_type: RelationshipType::Uses,
        implies: (None, Some(EntityType::Technology)),
    },
];

/// A relationship between two spans, by index into the tagged span list.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationMatch {
    pub source: usize,
    pub target: usize,
    pub relationship_type: RelationshipType,
    pub confidence: f64,
}

pub struct RelationMatcher {
    confidence: f64,
}

impl RelationMatcher {
    pub fn new(confidence: f64) -> Self {
        Self { confidence }
    }

    /// Match connectors between neighbouring spans (sorted by start) and
    /// refine weakly typed endpoints in place.
    pub fn match_spans(&self, text: &str, spans: &mut [TaggedSpan]) -> Vec<RelationMatch> {
        let mut out = Vec::new();
        for i in 0..spans.len().saturating_sub(1) {
            let (a_end, b_start) = (spans[i].end, spans[i + 1].start);
            if b_start <= a_end || b_start - a_end > MAX_CONNECTOR_LEN {
                continue;
            }
            let between = &text[a_end..b_start];
            if between.contains(['.', '!', '?', ';', '\n']) {
                continue;
            }
            let connector_text = normalize_connector(between);
            let Some(connector) = CONNECTORS.iter().find(|c| {
                c.regex
                    .as_ref()
                    .is_some_and(|re| re.is_match(&connector_text))
            }) else {
                continue;
            };

            let (source_type, target_type) = connector.implies;
            refine(&mut spans[i], source_type);
            refine(&mut spans[i + 1], target_type);

            out.push(RelationMatch {
                source: i,
                target: i + 1,
                relationship_type: connector.relationship_type,
                confidence: self.confidence,
            });
        }
        out
    }
}

fn refine(span: &mut TaggedSpan, implied: Option<EntityType>) {
    let Some(implied) = implied else {
        return;
    };
    if span.strong {
        return;
    }
    span.entity_type = implied;
    span.confidence = (span.confidence + 0.05).min(0.9);
}

/// Lowercase, trim, collapse whitespace, and drop a leading possessive.
fn normalize_connector(between: &str) -> String {
    let lower = between.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();
    let words = match words.first() {
        Some(&"'s") | Some(&"’s") => &words[1..],
        _ => &words[..],
    };
    words.join(" ")
}
