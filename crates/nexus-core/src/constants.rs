/// Nexus version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Hard ceiling on reasoning depth regardless of configuration.
pub const MAX_REASONING_DEPTH: usize = 16;

/// Hard ceiling on the reasoning node-expansion budget.
pub const MAX_EXPANDED_NODES: usize = 100_000;

/// Maximum number of chunk ids accepted in one ingest call.
pub const MAX_INGEST_BATCH: usize = 10_000;
