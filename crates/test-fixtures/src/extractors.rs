//! Extractor wrappers for failure injection.

use std::collections::HashSet;
use std::sync::Arc;

use nexus_core::errors::{ExtractionError, NexusResult};
use nexus_core::models::{Chunk, ExtractionOutput};
use nexus_core::traits::IEntityExtractor;

/// Delegates to `inner` except for the listed chunk ids, which fail.
pub struct FaultyExtractor {
    inner: Arc<dyn IEntityExtractor>,
    fail_on: HashSet<String>,
}

impl FaultyExtractor {
    pub fn new(inner: Arc<dyn IEntityExtractor>, fail_on: &[&str]) -> Self {
        Self {
            inner,
            fail_on: fail_on.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl IEntityExtractor for FaultyExtractor {
    fn try_extract(&self, chunk: &Chunk) -> NexusResult<ExtractionOutput> {
        if self.fail_on.contains(&chunk.id) {
            return Err(ExtractionError::ExtractorFailed {
                chunk_id: chunk.id.clone(),
                reason: "injected failure".into(),
            }
            .into());
        }
        self.inner.try_extract(chunk)
    }

    fn name(&self) -> &str {
        "faulty"
    }
}
