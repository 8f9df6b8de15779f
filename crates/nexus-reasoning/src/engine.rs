//! ReasoningEngine: resolves endpoints, picks the mode, runs the search.

use std::collections::HashSet;

use tracing::debug;

use nexus_core::config::ReasoningConfig;
use nexus_core::errors::{NexusResult, ReasoningError};
use nexus_core::models::{Entity, ReasoningMode, ReasoningResult};
use nexus_core::reasoning_span;
use nexus_graph::GraphRead;

use crate::explain::{explain_result, Summary};
use crate::options::ReasoningOptions;
use crate::traversal::{exploratory, targeted, Budget, PathState};

/// Read-only multi-hop reasoning. Holds no graph state, so any number of
/// traversals may run in parallel against a graph under mutation.
pub struct ReasoningEngine {
    config: ReasoningConfig,
}

impl ReasoningEngine {
    pub fn new(config: ReasoningConfig) -> Self {
        Self { config }
    }

    /// Options seeded from this engine's configuration.
    pub fn default_options(&self) -> ReasoningOptions {
        ReasoningOptions::from_config(&self.config)
    }

    /// Find paths from `start` entities. With `targets`, the fewest-hop
    /// paths reaching a target are returned, ties broken by confidence.
    /// Without, the top `max_paths` paths by confidence.
    ///
    /// Budget exhaustion is not an error: best-effort paths come back with
    /// `truncated` set.
    pub fn reason(
        &self,
        graph: &dyn GraphRead,
        start: &[String],
        targets: &[String],
        options: &ReasoningOptions,
    ) -> NexusResult<ReasoningResult> {
        options.validate()?;
        if start.is_empty() {
            return Err(ReasoningError::InvalidOptions {
                reason: "at least one start entity is required".to_string(),
            }
            .into());
        }
        let mode = if targets.is_empty() {
            ReasoningMode::Exploratory
        } else {
            ReasoningMode::Targeted
        };
        let span = reasoning_span!(mode, start.len());
        let _entered = span.enter();

        let starts = resolve_all(graph, start)?;
        let ends = resolve_all(graph, targets)?;
        let target_ids: HashSet<String> = ends.iter().map(|e| e.id.clone()).collect();
        let roots: Vec<PathState> = starts.iter().map(PathState::root).collect();

        let mut budget = Budget::new(options.max_expanded_nodes);
        let paths = match mode {
            ReasoningMode::Targeted => targeted(graph, roots, &target_ids, options, &mut budget),
            ReasoningMode::Exploratory => exploratory(graph, roots, options, &mut budget),
        };
        let truncated = budget.exhausted;
        if truncated {
            debug!(
                nodes_expanded = budget.expanded,
                paths = paths.len(),
                "reasoning budget exhausted, returning partial paths"
            );
        }

        let start_names: Vec<String> = starts.iter().map(|e| e.canonical_name.clone()).collect();
        let target_names: Vec<String> = ends.iter().map(|e| e.canonical_name.clone()).collect();
        let explanation = explain_result(&Summary {
            mode,
            start_names: &start_names,
            target_names: &target_names,
            paths: &paths,
            truncated,
            nodes_expanded: budget.expanded,
            max_depth: options.max_depth,
            min_confidence: options.min_confidence,
        });

        Ok(ReasoningResult {
            mode,
            paths,
            truncated,
            nodes_expanded: budget.expanded,
            explanation,
        })
    }
}

/// Resolve ids to surviving entities, dropping duplicates that resolve to
/// the same entity.
fn resolve_all(graph: &dyn GraphRead, ids: &[String]) -> NexusResult<Vec<Entity>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for id in ids {
        let entity = graph
            .entity(id)?
            .ok_or_else(|| ReasoningError::UnknownEntity { id: id.clone() })?;
        if seen.insert(entity.id.clone()) {
            out.push(entity);
        }
    }
    Ok(out)
}
