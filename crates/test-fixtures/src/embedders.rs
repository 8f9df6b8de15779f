//! Deterministic embedding providers.

use std::collections::HashMap;

use nexus_core::errors::{NexusResult, SearchError};
use nexus_core::text::normalize_name;
use nexus_core::traits::IEmbeddingProvider;

/// Bag-of-words embedder: each normalized token is hashed with blake3 into
/// one of `dimensions` buckets, then the vector is L2-normalized.
/// Texts sharing tokens have positive cosine similarity.
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn bucket(&self, token: &str) -> usize {
        let hash = blake3::hash(token.as_bytes());
        let bytes = hash.as_bytes();
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes[..8]);
        (u64::from_le_bytes(raw) % self.dimensions as u64) as usize
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(64)
    }
}

impl IEmbeddingProvider for HashingEmbedder {
    fn embed(&self, text: &str) -> NexusResult<Vec<f32>> {
        let mut v = vec![0.0f32; self.dimensions];
        for token in normalize_name(text).split_whitespace() {
            v[self.bucket(token)] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

/// Returns pre-registered vectors for known texts (matched by normalized
/// form), falling back to a hashing embedder. `failing()` always errors.
pub struct FixedEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    fallback: HashingEmbedder,
    fail: bool,
}

impl FixedEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            vectors: HashMap::new(),
            fallback: HashingEmbedder::new(dimensions),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(8)
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(normalize_name(text), vector);
        self
    }
}

impl IEmbeddingProvider for FixedEmbedder {
    fn embed(&self, text: &str) -> NexusResult<Vec<f32>> {
        if self.fail {
            return Err(SearchError::EmbeddingFailed {
                reason: "embedder offline".into(),
            }
            .into());
        }
        match self.vectors.get(&normalize_name(text)) {
            Some(v) => Ok(v.clone()),
            None => self.fallback.embed(text),
        }
    }

    fn dimensions(&self) -> usize {
        self.fallback.dimensions()
    }

    fn name(&self) -> &str {
        "fixed"
    }
}
