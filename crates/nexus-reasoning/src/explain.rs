//! Natural-language explanations for paths and results.

use nexus_core::models::{Hop, ReasoningMode, ReasoningPath};

use crate::templates::render;

/// Hop-by-hop narration, e.g. "Alice works at Acme Corp (0.90), then Acme
/// Corp is located in Berlin (0.80). Path confidence 0.72 over 2 hops."
pub fn explain_path(hops: &[Hop]) -> String {
    let Some(last) = hops.last() else {
        return "Start entity is itself a target.".to_string();
    };
    let steps: Vec<String> = hops
        .iter()
        .map(|h| {
            format!(
                "{} ({:.2})",
                render(h.relationship_type, h.inverse, &h.from_name, &h.to_name),
                h.edge_confidence.value()
            )
        })
        .collect();
    format!(
        "{}. Path confidence {:.2} over {} hop{}.",
        steps.join(", then "),
        last.cumulative_confidence.value(),
        hops.len(),
        if hops.len() == 1 { "" } else { "s" }
    )
}

pub(crate) struct Summary<'a> {
    pub mode: ReasoningMode,
    pub start_names: &'a [String],
    pub target_names: &'a [String],
    pub paths: &'a [ReasoningPath],
    pub truncated: bool,
    pub nodes_expanded: usize,
    pub max_depth: usize,
    pub min_confidence: f64,
}

pub(crate) fn explain_result(s: &Summary<'_>) -> String {
    let from = s.start_names.join(", ");
    let mut text = match (s.mode, s.paths.first()) {
        (ReasoningMode::Targeted, None) => format!(
            "No path from {from} to {} within {} hops at confidence {:.2} or above.",
            s.target_names.join(", "),
            s.max_depth,
            s.min_confidence
        ),
        (ReasoningMode::Exploratory, None) => format!(
            "No relationships from {from} at confidence {:.2} or above.",
            s.min_confidence
        ),
        (ReasoningMode::Targeted, Some(best)) => format!(
            "Found {} path{} from {from} to {}. Best: {}",
            s.paths.len(),
            plural(s.paths.len()),
            s.target_names.join(", "),
            best.explanation
        ),
        (ReasoningMode::Exploratory, Some(best)) => format!(
            "Explored {} path{} from {from}. Strongest: {}",
            s.paths.len(),
            plural(s.paths.len()),
            best.explanation
        ),
    };
    if s.truncated {
        text.push_str(&format!(
            " Exploration stopped early after expanding {} nodes.",
            s.nodes_expanded
        ));
    }
    text
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::models::{Confidence, RelationshipType};

    fn hop(from: &str, to: &str, kind: RelationshipType, edge: f64, cumulative: f64) -> Hop {
        Hop {
            from_entity_id: from.to_lowercase(),
            from_name: from.into(),
            relationship_id: "r".into(),
            relationship_type: kind,
            to_entity_id: to.to_lowercase(),
            to_name: to.into(),
            edge_confidence: Confidence::new(edge),
            cumulative_confidence: Confidence::new(cumulative),
            inverse: false,
            evidence: vec![],
        }
    }

    #[test]
    fn narrates_each_hop_in_order() {
        let text = explain_path(&[
            hop("Alice", "Acme Corp", RelationshipType::WorksAt, 0.9, 0.9),
            hop("Acme Corp", "Berlin", RelationshipType::LocatedIn, 0.8, 0.72),
        ]);
        assert_eq!(
            text,
            "Alice works at Acme Corp (0.90), then Acme Corp is located in Berlin (0.80). \
             Path confidence 0.72 over 2 hops."
        );
    }
}
