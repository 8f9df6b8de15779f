//! # nexus-provenance
//!
//! Append-only derivation log shared by every producing component.
//! Writes are serialized through a single writer; a failed write is queued
//! and retried in the background so it never fails the operation it records.

pub mod memory_store;
pub mod tracker;
pub mod worker;

pub use memory_store::MemoryProvenanceStore;
pub use tracker::ProvenanceTracker;
