//! Pattern-based named entity tagging over capitalized spans.

use std::sync::LazyLock;

use regex::Regex;

use nexus_core::models::EntityType;

use crate::lexicon;

/// Runs of capitalized words separated by spaces or tabs (never newlines).
static SPAN_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b\p{Lu}[\w&'’\-]*(?:[ \t]+\p{Lu}[\w&'’\-]*)*").ok());

/// A typed span found by the tagger. Offsets are byte offsets into the text.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedSpan {
    pub surface: String,
    pub start: usize,
    pub end: usize,
    pub entity_type: EntityType,
    pub confidence: f64,
    /// Type came from surface evidence (suffix, title, gazetteer) rather than
    /// context or shape; relation patterns do not override it.
    pub strong: bool,
}

/// Capitalized-span tagger with suffix, title, and context classification.
pub struct NerTagger {
    base_confidence: f64,
}

impl NerTagger {
    pub fn new(base_confidence: f64) -> Self {
        Self { base_confidence }
    }

    pub fn tag(&self, text: &str) -> Vec<TaggedSpan> {
        let Some(re) = SPAN_RE.as_ref() else {
            return Vec::new();
        };
        re.find_iter(text)
            .filter_map(|m| self.classify(text, m.start(), m.as_str()))
            .collect()
    }

    fn classify(&self, text: &str, match_start: usize, matched: &str) -> Option<TaggedSpan> {
        let mut tokens = tokens_with_offsets(matched);

        // Leading stop words and titles are not part of the name.
        let mut titled = preceded_by_title(&text[..match_start]);
        while let Some((_, tok)) = tokens.first() {
            if lexicon::is_title(tok) {
                titled = true;
                tokens.remove(0);
            } else if lexicon::is_stop_word(tok) {
                titled = false;
                tokens.remove(0);
            } else {
                break;
            }
        }
        let (first_off, _) = *tokens.first()?;
        let (last_off, last_tok) = *tokens.last()?;

        let last_clean = last_tok
            .strip_suffix("'s")
            .or_else(|| last_tok.strip_suffix("’s"))
            .unwrap_or(last_tok);
        let start = match_start + first_off;
        let end = match_start + last_off + last_clean.len();
        let surface = &text[start..end];
        if surface.chars().count() < 2 {
            return None;
        }

        let word_count = tokens.len();
        let base = self.base_confidence;
        let (entity_type, confidence, strong) = if let Some(t) = lexicon::classify_surface(surface) {
            (t, base + 0.1, true)
        } else if titled {
            (EntityType::Person, base + 0.1, true)
        } else if followed_by_person_verb(&text[end..]) {
            let bonus = if word_count > 1 { 0.05 } else { 0.0 };
            (EntityType::Person, base + bonus, false)
        } else if (2..=3).contains(&word_count) && tokens.iter().all(|(_, t)| is_title_case(t)) {
            (EntityType::Person, base - 0.05, false)
        } else {
            (EntityType::Concept, base - 0.15, false)
        };

        Some(TaggedSpan {
            surface: surface.to_string(),
            start,
            end,
            entity_type,
            confidence: confidence.clamp(0.0, 0.95),
            strong,
        })
    }
}

fn tokens_with_offsets(s: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, ch) in s.char_indices() {
        if ch.is_whitespace() {
            if let Some(st) = start.take() {
                out.push((st, &s[st..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(st) = start {
        out.push((st, &s[st..]));
    }
    out
}

fn preceded_by_title(before: &str) -> bool {
    before
        .trim_end()
        .rsplit(char::is_whitespace)
        .next()
        .is_some_and(lexicon::is_title)
}

fn followed_by_person_verb(after: &str) -> bool {
    after
        .split_whitespace()
        .next()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '-').to_lowercase())
        .is_some_and(|w| lexicon::PERSON_VERBS.contains(&w.as_str()))
}

fn is_title_case(token: &str) -> bool {
    let mut chars = token.chars();
    chars.next().is_some_and(char::is_uppercase) && chars.all(|c| !c.is_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(text: &str) -> Vec<TaggedSpan> {
        NerTagger::new(0.75).tag(text)
    }

    #[test]
    fn person_and_organization() {
        let spans = tag("Alice works at Acme Corp.");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].surface, "Alice");
        assert_eq!(spans[0].entity_type, EntityType::Person);
        assert_eq!(spans[1].surface, "Acme Corp");
        assert_eq!(spans[1].entity_type, EntityType::Organization);
        assert!(spans[1].strong);
    }

    #[test]
    fn leading_stop_words_are_stripped() {
        let spans = tag("The Acme Corp board met.");
        assert_eq!(spans[0].surface, "Acme Corp");
    }

    #[test]
    fn title_marks_person() {
        let spans = tag("We spoke with Dr. Carol Smith yesterday.");
        let carol = spans.iter().find(|s| s.surface == "Carol Smith").unwrap();
        assert_eq!(carol.entity_type, EntityType::Person);
        assert!(carol.strong);
        assert!(spans.iter().all(|s| s.surface != "Dr"));
    }

    #[test]
    fn possessive_is_trimmed() {
        let spans = tag("Alice's team shipped.");
        assert_eq!(spans[0].surface, "Alice");
        assert_eq!(spans[0].end, 5);
    }

    #[test]
    fn stop_word_only_sentence_yields_nothing() {
        assert!(tag("The report was published on Monday.").is_empty());
    }

    #[test]
    fn unknown_single_word_is_low_confidence_concept() {
        let spans = tag("we discussed Quasar briefly");
        assert_eq!(spans[0].entity_type, EntityType::Concept);
        assert!(spans[0].confidence < 0.75);
    }
}
