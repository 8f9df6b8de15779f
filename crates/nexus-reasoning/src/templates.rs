//! Hop sentence templates per relationship type.

use nexus_core::models::RelationshipType;

/// Template for walking a relationship from its source to its target.
/// Templates use `{source}` and `{target}` as placeholders, where `{source}`
/// is always the entity the hop leaves from.
pub fn template_for(relationship: RelationshipType) -> &'static str {
    match relationship {
        RelationshipType::WorksAt => "{source} works at {target}",
        RelationshipType::LocatedIn => "{source} is located in {target}",
        RelationshipType::PartOf => "{source} is part of {target}",
        RelationshipType::Founded => "{source} founded {target}",
        RelationshipType::Manages => "{source} manages {target}",
        RelationshipType::Created => "{source} created {target}",
        RelationshipType::Uses => "{source} uses {target}",
        RelationshipType::Mentions => "{source} mentions {target}",
        RelationshipType::RelatedTo => "{source} is related to {target}",
        RelationshipType::Other => "{source} is connected to {target}",
    }
}

/// Template for walking a directed relationship backwards, target to source.
pub fn inverse_template_for(relationship: RelationshipType) -> &'static str {
    match relationship {
        RelationshipType::WorksAt => "{source} employs {target}",
        RelationshipType::LocatedIn => "{source} is the location of {target}",
        RelationshipType::PartOf => "{source} includes {target}",
        RelationshipType::Founded => "{source} was founded by {target}",
        RelationshipType::Manages => "{source} is managed by {target}",
        RelationshipType::Created => "{source} was created by {target}",
        RelationshipType::Uses => "{source} is used by {target}",
        RelationshipType::Mentions => "{source} is mentioned by {target}",
        RelationshipType::RelatedTo => "{source} is related to {target}",
        RelationshipType::Other => "{source} is connected to {target}",
    }
}

pub fn render(relationship: RelationshipType, inverse: bool, from: &str, to: &str) -> String {
    let template = if inverse {
        inverse_template_for(relationship)
    } else {
        template_for(relationship)
    };
    template.replace("{source}", from).replace("{target}", to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_template_has_both_placeholders() {
        for t in RelationshipType::ALL {
            for template in [template_for(t), inverse_template_for(t)] {
                assert!(template.contains("{source}") && template.contains("{target}"));
            }
        }
    }

    #[test]
    fn inverse_reads_from_the_far_side() {
        assert_eq!(
            render(RelationshipType::WorksAt, true, "Acme Corp", "Alice"),
            "Acme Corp employs Alice"
        );
        assert_eq!(
            render(RelationshipType::WorksAt, false, "Alice", "Acme Corp"),
            "Alice works at Acme Corp"
        );
    }
}
