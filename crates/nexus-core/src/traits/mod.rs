//! Capability traits at the seams between components and external collaborators.

pub mod chunk_source;
pub mod embedding;
pub mod extractor;
pub mod observer;
pub mod provenance;
pub mod vector_search;

pub use chunk_source::IChunkSource;
pub use embedding::IEmbeddingProvider;
pub use extractor::IEntityExtractor;
pub use observer::IGraphObserver;
pub use provenance::{IProvenanceSink, IProvenanceStore};
pub use vector_search::IVectorSearch;
