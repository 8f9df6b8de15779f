//! Normalized query signatures.
//!
//! A signature is the blake3 hex digest of a canonical text form of the
//! query. Embeddings are quantized to a fixed number of decimals so that
//! numerically indistinguishable queries share an entry.

use std::fmt::Write;

use nexus_reasoning::ReasoningOptions;
use nexus_retrieval::SearchOptions;

pub fn search_signature(embedding: &[f32], options: &SearchOptions, precision: u32) -> String {
    let mut canonical = String::from("search|emb:");
    push_quantized(&mut canonical, embedding, precision);

    let mut types: Vec<&str> = options.entity_types.iter().map(|t| t.as_str()).collect();
    types.sort_unstable();
    types.dedup();
    let _ = write!(
        canonical,
        "|filters:{}|limit:{}|k:{}|expand:{}|max_expansion:{}|types:{}",
        options.filters.canonical(),
        options.limit,
        options.vector_k,
        options.expand,
        options.max_expansion,
        types.join(",")
    );
    digest(&canonical)
}

/// Start and target sets are order-insensitive.
pub fn reasoning_signature(start: &[String], targets: &[String], options: &ReasoningOptions) -> String {
    let mut types: Vec<&str> = options.relationship_types.iter().map(|t| t.as_str()).collect();
    types.sort_unstable();
    types.dedup();
    let canonical = format!(
        "reason|start:{}|targets:{}|depth:{}|min:{}|paths:{}|nodes:{}|inverse:{}|types:{}",
        sorted(start).join(","),
        sorted(targets).join(","),
        options.max_depth,
        options.min_confidence,
        options.max_paths,
        options.max_expanded_nodes,
        options.traverse_inverse,
        types.join(",")
    );
    digest(&canonical)
}

fn push_quantized(out: &mut String, embedding: &[f32], precision: u32) {
    let precision = precision as usize;
    for (i, x) in embedding.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let x = *x as f64;
        let x = if x == 0.0 || !x.is_finite() { 0.0 } else { x };
        let _ = write!(out, "{x:.precision$}");
    }
}

fn sorted(ids: &[String]) -> Vec<&str> {
    let mut ids: Vec<&str> = ids.iter().map(String::as_str).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn digest(canonical: &str) -> String {
    blake3::hash(canonical.as_bytes()).to_hex().to_string()
}
