//! Document records and content hashing

use super::Database;
use crate::error::{AdmitaError, Result};
use chrono::Utc;
use rusqlite::params;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Program track a document belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Track {
    Ai,
    AiProduct,
    None,
}

impl Track {
    pub fn as_str(&self) -> &'static str {
        match self {
            Track::Ai => "ai",
            Track::AiProduct => "ai-product",
            Track::None => "none",
        }
    }

    /// Human-readable track name
    pub fn display_name(&self) -> &'static str {
        match self {
            Track::Ai => "AI",
            Track::AiProduct => "AI Product",
            Track::None => "general",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "ai" => Ok(Track::Ai),
            "ai-product" => Ok(Track::AiProduct),
            "none" => Ok(Track::None),
            other => Err(AdmitaError::Ingestion(format!("unknown track: {other}"))),
        }
    }
}

/// Kind of scraped source a document came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Webpage,
    Pdf,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Webpage => "webpage",
            DocumentKind::Pdf => "pdf",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "webpage" => Ok(DocumentKind::Webpage),
            "pdf" => Ok(DocumentKind::Pdf),
            other => Err(AdmitaError::Ingestion(format!("unknown kind: {other}"))),
        }
    }
}

/// A scraped program document as delivered by the scraper/PDF extractor.
///
/// The text is already normalized to valid UTF-8 by the producer; the core
/// never re-parses markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Source identifier (URL or file path)
    pub source: String,

    /// SHA-256 hash of the extracted text
    #[serde(default)]
    pub hash: String,

    /// Extracted text
    pub text: String,

    pub kind: DocumentKind,

    pub track: Track,
}

impl Document {
    pub fn new(source: impl Into<String>, text: impl Into<String>, kind: DocumentKind, track: Track) -> Self {
        let text = text.into();
        let hash = hash_content(&text);
        Self {
            source: source.into(),
            hash,
            text,
            kind,
            track,
        }
    }

    /// Recompute the content hash if the producer did not supply one
    pub fn ensure_hash(&mut self) {
        if self.hash.is_empty() {
            self.hash = hash_content(&self.text);
        }
    }
}

/// SHA-256 content hash, hex-encoded
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl Database {
    /// Whether a document with this content hash is already stored
    pub fn has_document(&self, hash: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE hash = ?1",
            params![hash],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Insert a document record
    pub fn insert_document(&self, doc: &Document) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR REPLACE INTO documents (hash, source, kind, track, body, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                doc.hash,
                doc.source,
                doc.kind.as_str(),
                doc.track.as_str(),
                doc.text,
                now
            ],
        )?;
        Ok(())
    }

    /// Delete a document; chunks and embeddings cascade
    pub fn delete_document(&self, hash: &str) -> Result<usize> {
        let rows = self
            .conn
            .execute("DELETE FROM documents WHERE hash = ?1", params![hash])?;
        Ok(rows)
    }

    /// Source identifier for a stored document
    pub fn get_document_source(&self, hash: &str) -> Result<Option<String>> {
        let result = self.conn.query_row(
            "SELECT source FROM documents WHERE hash = ?1",
            params![hash],
            |row| row.get(0),
        );
        match result {
            Ok(source) => Ok(Some(source)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Index counters for status reporting
    pub fn stats(&self) -> Result<IndexStats> {
        let documents: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        let chunks: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        let embedded: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM embeddings", [], |row| row.get(0))?;
        let model = self.registered_model()?.map(|(name, _)| name);

        Ok(IndexStats {
            documents: documents as usize,
            chunks: chunks as usize,
            embedded: embedded as usize,
            pending_embedding: (chunks - embedded).max(0) as usize,
            embedding_model: model,
        })
    }
}

/// Snapshot of index counters
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub documents: usize,
    pub chunks: usize,
    pub embedded: usize,
    pub pending_embedding: usize,
    pub embedding_model: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(hash_content("abc"), hash_content("abc"));
        assert_ne!(hash_content("abc"), hash_content("abd"));
    }

    #[test]
    fn test_document_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();

        let doc = Document::new(
            "https://example.edu/ai",
            "Curriculum overview",
            DocumentKind::Webpage,
            Track::Ai,
        );
        assert!(!db.has_document(&doc.hash).unwrap());
        db.insert_document(&doc).unwrap();
        assert!(db.has_document(&doc.hash).unwrap());
        assert_eq!(
            db.get_document_source(&doc.hash).unwrap().as_deref(),
            Some("https://example.edu/ai")
        );
    }

    #[test]
    fn test_track_parse() {
        assert_eq!(Track::parse("ai-product").unwrap(), Track::AiProduct);
        assert!(Track::parse("bogus").is_err());
    }
}
