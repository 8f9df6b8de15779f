//! Test fixtures for Nexus: in-memory implementations of the external
//! capabilities (vector search, embeddings, chunk store, provenance store)
//! plus a loader for the JSON corpus under `corpus/`.

pub mod chunks;
pub mod embedders;
pub mod extractors;
pub mod provenance;
pub mod vector;

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use nexus_core::models::Chunk;

pub use chunks::InMemoryChunkSource;
pub use embedders::{FixedEmbedder, HashingEmbedder};
pub use extractors::FaultyExtractor;
pub use provenance::FlakyProvenanceStore;
pub use vector::InMemoryVectorSearch;

/// Root directory of the fixture corpus.
fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("corpus")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixture_path(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Load a fixture file as raw JSON Value.
pub fn load_fixture_value(relative_path: &str) -> serde_json::Value {
    load_fixture(relative_path)
}

/// Check that a fixture file exists.
pub fn fixture_exists(relative_path: &str) -> bool {
    fixture_path(relative_path).exists()
}

/// Get the absolute path to a fixture file.
pub fn fixture_path(relative_path: &str) -> PathBuf {
    fixtures_root().join(relative_path)
}

#[derive(Deserialize)]
struct CorpusFile {
    chunks: Vec<Chunk>,
}

/// Load the chunks of a corpus file (`{"chunks": [...]}`).
pub fn load_corpus(relative_path: &str) -> Vec<Chunk> {
    load_fixture::<CorpusFile>(relative_path).chunks
}

/// Generate `n` synthetic chunks `chunk-000 .. chunk-{n-1}` in source `source_id`,
/// each naming a distinct person and organization.
pub fn synthetic_chunks(n: usize, source_id: &str) -> Vec<Chunk> {
    const FIRST: [&str; 10] = [
        "Alice", "Bob", "Carol", "Dave", "Erin", "Frank", "Grace", "Heidi", "Ivan", "Judy",
    ];
    const ORGS: [&str; 10] = [
        "Acme Corp",
        "Globex Inc",
        "Initech Ltd",
        "Umbrella Labs",
        "Hooli Group",
        "Stark Industries",
        "Wayne Enterprises",
        "Tyrell Corporation",
        "Cyberdyne Systems",
        "Soylent Company",
    ];
    (0..n)
        .map(|i| {
            let person = FIRST[i % FIRST.len()];
            let org = ORGS[(i / FIRST.len()) % ORGS.len()];
            Chunk::new(
                format!("chunk-{i:03}"),
                source_id,
                format!("{person} works at {org}."),
            )
        })
        .collect()
}
