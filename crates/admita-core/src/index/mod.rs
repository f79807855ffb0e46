//! Ingestion pipeline
//!
//! Chunking and embedding of scraped program documents.

mod chunker;
mod indexer;

pub use chunker::{normalize_text, Chunk, Chunker};
pub use indexer::Indexer;
