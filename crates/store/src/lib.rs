//! Content stores and local similarity indexes for Teidaishu.
//!
//! Backends:
//! - **Fs**: passage text mirrored on local disk
//! - **Http**: passage text in an object bucket reachable over HTTP
//! - **InMemory**: text and vectors held in memory (testing, small corpora)
//! - **Jsonl**: a pre-embedded corpus loaded from a JSON-lines file

pub mod fs;
pub mod http;
pub mod in_memory;
pub mod jsonl;
pub mod vector;

pub use fs::FsContentStore;
pub use http::HttpContentStore;
pub use in_memory::{InMemoryContentStore, InMemoryIndex};
pub use jsonl::JsonlIndex;
pub use vector::{IndexedPassage, cosine_similarity};
