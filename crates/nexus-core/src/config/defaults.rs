//! Named default values for every config section.

// Extraction
pub const DEFAULT_MIN_ENTITY_CONFIDENCE: f64 = 0.5;
pub const DEFAULT_MIN_RELATIONSHIP_CONFIDENCE: f64 = 0.4;
pub const DEFAULT_CONTEXT_WINDOW: usize = 150;
pub const DEFAULT_MAX_ENTITIES_PER_CHUNK: usize = 50;
pub const DEFAULT_ENABLE_CO_OCCURRENCE: bool = true;
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 100_000;
pub const DEFAULT_PATTERN_ENTITY_CONFIDENCE: f64 = 0.75;
pub const DEFAULT_PATTERN_RELATIONSHIP_CONFIDENCE: f64 = 0.85;
pub const DEFAULT_CO_OCCURRENCE_CONFIDENCE: f64 = 0.6;
pub const DEFAULT_DICTIONARY_CONFIDENCE: f64 = 0.9;

// Graph
pub const DEFAULT_DEDUP_THRESHOLD: f64 = 0.85;
pub const DEFAULT_CANDIDATE_THRESHOLD: f64 = 0.6;
pub const DEFAULT_AUTO_MERGE: bool = true;
pub const DEFAULT_USE_EMBEDDINGS: bool = true;
pub const DEFAULT_LOCK_STRIPES: usize = 64;
pub const DEFAULT_MERGE_RETRY_LIMIT: u32 = 3;

// Search
pub const DEFAULT_VECTOR_K: usize = 20;
pub const DEFAULT_SEARCH_LIMIT: usize = 10;
pub const DEFAULT_EXPAND: bool = true;
pub const DEFAULT_MAX_EXPANSION: usize = 30;
pub const DEFAULT_EXPANSION_DECAY: f64 = 0.8;
pub const DEFAULT_MIN_ANCHOR_CONFIDENCE: f64 = 0.3;
pub const DEFAULT_MAX_ANCHORS: usize = 20;

// Ranking
pub const DEFAULT_VECTOR_WEIGHT: f64 = 0.6;
pub const DEFAULT_GRAPH_WEIGHT: f64 = 0.3;
pub const DEFAULT_RECENCY_WEIGHT: f64 = 0.1;
pub const DEFAULT_RECENCY_HALF_LIFE_DAYS: f64 = 30.0;

// Reasoning
pub const DEFAULT_MAX_DEPTH: usize = 3;
pub const DEFAULT_REASONING_MIN_CONFIDENCE: f64 = 0.1;
pub const DEFAULT_MAX_PATHS: usize = 10;
pub const DEFAULT_MAX_EXPANDED_NODES: usize = 1_000;
pub const DEFAULT_TRAVERSE_INVERSE: bool = true;

// Optimizer
pub const DEFAULT_CACHE_ENABLED: bool = true;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_CACHE_MAX_ENTRIES: u64 = 1_000;
pub const DEFAULT_EMBEDDING_PRECISION: u32 = 4;

// Provenance
pub const DEFAULT_PROVENANCE_ENABLED: bool = true;
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 500;

// Pipeline
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;
pub const DEFAULT_DEBOUNCE_MS: u64 = 2_000;
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_MAX_FILE_RETRIES: u32 = 3;
