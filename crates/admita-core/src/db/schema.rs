//! Database schema and initialization

use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;

/// Main database handle
pub struct Database {
    pub(crate) conn: Connection,
}

const CREATE_TABLES: &str = r#"
-- Scraped program documents (content-addressable by SHA-256 hash)
CREATE TABLE IF NOT EXISTS documents (
    hash TEXT PRIMARY KEY,
    source TEXT NOT NULL,
    kind TEXT NOT NULL,
    track TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Chunks with ordinal position and offsets into the owning document
CREATE TABLE IF NOT EXISTS chunks (
    hash TEXT NOT NULL REFERENCES documents(hash) ON DELETE CASCADE,
    seq INTEGER NOT NULL,
    start_pos INTEGER NOT NULL,
    end_pos INTEGER NOT NULL,
    body TEXT NOT NULL,
    PRIMARY KEY (hash, seq)
);

-- Dense vectors, one per chunk, keyed like the chunk
CREATE TABLE IF NOT EXISTS embeddings (
    hash TEXT NOT NULL REFERENCES documents(hash) ON DELETE CASCADE,
    seq INTEGER NOT NULL,
    model TEXT NOT NULL,
    embedding BLOB NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (hash, seq)
);

-- Embedding model registration for embedding-space consistency
CREATE TABLE IF NOT EXISTS model_metadata (
    model TEXT PRIMARY KEY,
    dimensions INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_track ON documents(track);
"#;

impl Database {
    /// Open database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (tests)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Create tables and enable cascading deletes
    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(CREATE_TABLES)?;
        Ok(())
    }
}
