//! # Teidaishu Core
//!
//! Domain types, collaborator traits, and error definitions for the Teidaishu
//! retrieval-to-context pipeline. This crate contains **no network code**; it
//! defines the model that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (embedding service, similarity index, content
//! store, generation service) is a trait here. Implementations live in
//! `teidaishu-providers` and `teidaishu-store`. This enables:
//! - Swapping backends via configuration
//! - Testing the pipeline with scripted collaborators
//! - Clean dependency graph (all crates depend inward on core)

pub mod content;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod index;
pub mod matches;

// Re-export key types at crate root for ergonomics
pub use content::ContentStore;
pub use embedding::{Embedder, EmbeddingVector, TaskType};
pub use error::{Error, Result};
pub use generation::{GenerationRequest, Generator};
pub use index::{QueryOptions, ReturnMetadata, VectorIndex};
pub use matches::{Match, Metadata, SourceRecord};
