//! QueryOptimizer: cached front for hybrid search and reasoning.

use std::sync::{Arc, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use nexus_core::config::OptimizerConfig;
use nexus_core::errors::NexusResult;
use nexus_core::models::ReasoningResult;
use nexus_core::traits::IGraphObserver;
use nexus_graph::GraphRead;
use nexus_reasoning::{ReasoningEngine, ReasoningOptions};
use nexus_retrieval::{RetrievalEngine, SearchOptions, SearchResponse};

use crate::cache::{CacheStats, QueryCache};
use crate::signature::{reasoning_signature, search_signature};

/// How a search will be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryPlan {
    /// A live cached result exists.
    CacheHit,
    /// The graph is empty; no anchors can exist.
    VectorOnly,
    /// Vector recall plus graph expansion.
    Hybrid,
}

/// A result plus how it was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Optimized<T> {
    pub value: T,
    pub plan: QueryPlan,
    pub signature: String,
}

/// Combined counters for both caches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerStats {
    pub search: CacheStats,
    pub reasoning: CacheStats,
}

pub struct QueryOptimizer {
    retrieval: Arc<RetrievalEngine>,
    reasoning: Arc<ReasoningEngine>,
    graph: Arc<dyn GraphRead>,
    config: OptimizerConfig,
    searches: QueryCache<SearchResponse>,
    paths: QueryCache<ReasoningResult>,
}

impl QueryOptimizer {
    pub fn new(
        retrieval: Arc<RetrievalEngine>,
        reasoning: Arc<ReasoningEngine>,
        graph: Arc<dyn GraphRead>,
        config: OptimizerConfig,
    ) -> Self {
        let ttl = Duration::from_secs(config.ttl_secs);
        Self {
            retrieval,
            reasoning,
            graph,
            searches: QueryCache::new(config.max_entries, ttl),
            paths: QueryCache::new(config.max_entries, ttl),
            config,
        }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Decide how a search would be served, without executing it.
    pub fn plan_search(&self, embedding: &[f32], options: &SearchOptions) -> QueryPlan {
        let signature = search_signature(embedding, options, self.config.embedding_precision);
        self.plan_for(&signature)
    }

    fn plan_for(&self, signature: &str) -> QueryPlan {
        if self.config.enabled && self.searches.contains(signature) {
            return QueryPlan::CacheHit;
        }
        match self.graph.is_empty() {
            Ok(true) => QueryPlan::VectorOnly,
            _ => QueryPlan::Hybrid,
        }
    }

    pub fn search(
        &self,
        embedding: &[f32],
        options: &SearchOptions,
    ) -> NexusResult<Optimized<SearchResponse>> {
        let signature = search_signature(embedding, options, self.config.embedding_precision);
        if self.config.enabled {
            if let Some(value) = self.searches.get(&signature) {
                debug!(signature = %signature, "search served from cache");
                return Ok(Optimized {
                    value,
                    plan: QueryPlan::CacheHit,
                    signature,
                });
            }
        }

        let plan = self.plan_for(&signature);
        let epoch = self.searches.epoch();
        let run_options = if plan == QueryPlan::VectorOnly {
            SearchOptions {
                expand: false,
                ..options.clone()
            }
        } else {
            options.clone()
        };
        let value = self.retrieval.search(embedding, &run_options)?;

        // Degraded results reflect a transient outage.
        if self.config.enabled && !value.degraded {
            let anchors = search_anchors(&value);
            self.searches
                .insert(signature.clone(), value.clone(), &anchors, epoch);
        }
        Ok(Optimized {
            value,
            plan,
            signature,
        })
    }

    pub fn reason(
        &self,
        start: &[String],
        targets: &[String],
        options: &ReasoningOptions,
    ) -> NexusResult<Optimized<ReasoningResult>> {
        let signature = reasoning_signature(start, targets, options);
        if self.config.enabled {
            if let Some(value) = self.paths.get(&signature) {
                debug!(signature = %signature, "reasoning served from cache");
                return Ok(Optimized {
                    value,
                    plan: QueryPlan::CacheHit,
                    signature,
                });
            }
        }

        let epoch = self.paths.epoch();
        let value = self
            .reasoning
            .reason(self.graph.as_ref(), start, targets, options)?;
        if self.config.enabled {
            let anchors = reasoning_anchors(start, targets, &value);
            self.paths
                .insert(signature.clone(), value.clone(), &anchors, epoch);
        }
        Ok(Optimized {
            value,
            plan: QueryPlan::Hybrid,
            signature,
        })
    }

    /// Drop cached results depending on any of `ids`. Returns the number
    /// of entries dropped.
    pub fn invalidate(&self, ids: &[String]) -> usize {
        self.searches.invalidate(ids) + self.paths.invalidate(ids)
    }

    pub fn clear(&self) {
        self.searches.clear();
        self.paths.clear();
    }

    pub fn stats(&self) -> OptimizerStats {
        OptimizerStats {
            search: self.searches.stats(),
            reasoning: self.paths.stats(),
        }
    }
}

impl QueryOptimizer {
    /// Graph observer that invalidates this optimizer's caches. Holds a weak
    /// reference, so registering it on the graph the optimizer reads does
    /// not create a reference cycle.
    pub fn observer(self: &Arc<Self>) -> Arc<dyn IGraphObserver> {
        Arc::new(InvalidationHook(Arc::downgrade(self)))
    }
}

struct InvalidationHook(Weak<QueryOptimizer>);

impl IGraphObserver for InvalidationHook {
    fn on_mutation(&self, affected_ids: &[String]) {
        let Some(optimizer) = self.0.upgrade() else {
            return;
        };
        let dropped = optimizer.invalidate(affected_ids);
        if dropped > 0 {
            debug!(dropped, ids = affected_ids.len(), "cache entries invalidated");
        }
    }
}

/// Response anchors plus the anchors credited on each result. Empty when
/// the graph contributed nothing, so any mutation drops the entry.
fn search_anchors(response: &SearchResponse) -> Vec<String> {
    let mut ids: Vec<String> = response
        .anchors
        .iter()
        .chain(response.results.iter().flat_map(|r| r.anchor_entities.iter()))
        .cloned()
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

/// Endpoints and every entity and relationship on a returned path. A result
/// without paths stays anchorless, so any mutation drops it.
fn reasoning_anchors(start: &[String], targets: &[String], result: &ReasoningResult) -> Vec<String> {
    if result.paths.is_empty() {
        return Vec::new();
    }
    let mut ids: Vec<String> = start.iter().chain(targets).cloned().collect();
    for path in &result.paths {
        ids.push(path.start_entity_id.clone());
        for hop in &path.hops {
            ids.push(hop.relationship_id.clone());
            ids.push(hop.to_entity_id.clone());
        }
    }
    ids.sort();
    ids.dedup();
    ids
}
