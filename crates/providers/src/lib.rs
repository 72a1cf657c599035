//! Remote collaborator implementations for Teidaishu.
//!
//! `GeminiProvider` implements both `Embedder` and `Generator`;
//! `VectorizeIndex` implements `VectorIndex`.

pub mod gemini;
pub mod vectorize;

pub use gemini::GeminiProvider;
pub use vectorize::VectorizeIndex;
