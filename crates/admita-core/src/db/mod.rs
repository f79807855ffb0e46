//! Storage layer for admita
//!
//! SQLite-backed vector store:
//! - documents keyed by SHA-256 content hash
//! - chunks with ordinal position and source offsets
//! - embeddings stored as f32 BLOBs, cosine similarity computed in Rust

mod documents;
mod schema;
pub mod vectors;

pub use documents::{hash_content, Document, DocumentKind, IndexStats, Track};
pub use schema::Database;
pub use vectors::{bytes_to_embedding, cosine_similarity, embedding_to_bytes, StoredChunk};

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Shared handle to the store. The mutex guards short synchronous queries
/// only; it is never held across a backend call.
pub type SharedDatabase = Arc<Mutex<Database>>;

/// Wrap an opened database for shared use
pub fn shared(db: Database) -> SharedDatabase {
    Arc::new(Mutex::new(db))
}

impl Database {
    /// Get the default database path
    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CACHE_DIR_NAME)
            .join("index.sqlite")
    }
}
