//! Vector storage operations
//!
//! Stores embeddings as BLOBs and computes cosine similarity in Rust.

use super::{Database, DocumentKind, Track};
use crate::error::{AdmitaError, Result};
use chrono::Utc;
use rusqlite::params;

/// A chunk as stored, with its owning document's metadata
#[derive(Debug, Clone)]
pub struct StoredChunk {
    /// Owning document hash
    pub hash: String,
    /// Ordinal position within the document
    pub seq: u32,
    pub text: String,
    /// Source identifier of the owning document
    pub source: String,
    pub kind: DocumentKind,
    pub track: Track,
}

impl Database {
    /// Insert a chunk row
    pub fn insert_chunk(
        &self,
        hash: &str,
        seq: u32,
        start_pos: usize,
        end_pos: usize,
        body: &str,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO chunks (hash, seq, start_pos, end_pos, body)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![hash, seq, start_pos, end_pos, body],
        )?;
        Ok(())
    }

    /// Upsert the embedding for a chunk key
    pub fn insert_embedding(
        &self,
        hash: &str,
        seq: u32,
        model: &str,
        embedding: &[f32],
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let bytes = embedding_to_bytes(embedding);
        self.conn.execute(
            "INSERT OR REPLACE INTO embeddings (hash, seq, model, embedding, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![hash, seq, model, bytes, now],
        )?;
        Ok(())
    }

    /// Get all embeddings, optionally restricted to one track
    pub fn get_embeddings(&self, track: Option<Track>) -> Result<Vec<(String, u32, Vec<f32>)>> {
        let mut sql = String::from(
            "SELECT e.hash, e.seq, e.embedding FROM embeddings e
             JOIN documents d ON d.hash = e.hash",
        );
        let rows = if let Some(track) = track {
            sql.push_str(" WHERE d.track = ?1");
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![track.as_str()], map_embedding_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        } else {
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_embedding_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };
        Ok(rows)
    }

    /// Fetch a stored chunk with its document metadata
    pub fn get_chunk(&self, hash: &str, seq: u32) -> Result<Option<StoredChunk>> {
        let result = self.conn.query_row(
            "SELECT c.body, d.source, d.kind, d.track
             FROM chunks c JOIN documents d ON d.hash = c.hash
             WHERE c.hash = ?1 AND c.seq = ?2",
            params![hash, seq],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        );
        match result {
            Ok((body, source, kind, track)) => Ok(Some(StoredChunk {
                hash: hash.to_string(),
                seq,
                text: body,
                source,
                kind: DocumentKind::parse(&kind)?,
                track: Track::parse(&track)?,
            })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Chunks of a document that have no embedding yet, in ordinal order
    pub fn chunks_missing_embedding(&self, hash: &str) -> Result<Vec<(u32, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.seq, c.body FROM chunks c
             WHERE c.hash = ?1
               AND NOT EXISTS (
                   SELECT 1 FROM embeddings e WHERE e.hash = c.hash AND e.seq = c.seq
               )
             ORDER BY c.seq",
        )?;
        let rows = stmt
            .query_map(params![hash], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Register the embedding model backing this store.
    ///
    /// The store is bound to a single embedding space; registering a second
    /// model is a configuration error, not a silent mix.
    pub fn register_model(&self, model: &str, dimensions: usize) -> Result<()> {
        if let Some((stored_model, stored_dims)) = self.registered_model()? {
            if stored_model != model || stored_dims != dimensions {
                return Err(AdmitaError::Config(format!(
                    "vector store was built with model '{stored_model}' ({stored_dims} dims), \
                     refusing to mix with '{model}' ({dimensions} dims)"
                )));
            }
            return Ok(());
        }
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO model_metadata (model, dimensions, created_at) VALUES (?1, ?2, ?3)",
            params![model, dimensions as i64, now],
        )?;
        Ok(())
    }

    /// The embedding model this store was built with, if any
    pub fn registered_model(&self) -> Result<Option<(String, usize)>> {
        let result = self.conn.query_row(
            "SELECT model, dimensions FROM model_metadata LIMIT 1",
            [],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
        );
        match result {
            Ok((model, dims)) => Ok(Some((model, dims as usize))),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn map_embedding_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, u32, Vec<f32>)> {
    let hash: String = row.get(0)?;
    let seq: u32 = row.get(1)?;
    let bytes: Vec<u8> = row.get(2)?;
    Ok((hash, seq, bytes_to_embedding(&bytes)))
}

/// Convert f32 embedding to bytes (little-endian)
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert bytes to f32 embedding
pub fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Compute cosine similarity between two embeddings
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
