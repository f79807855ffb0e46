//! Embedding pipeline with content-hash idempotence

use super::Chunker;
use crate::config::Config;
use crate::db::{Document, SharedDatabase};
use crate::error::Result;
use crate::llm::{Embedder, RetryPolicy};
use std::sync::Arc;

const BATCH_SIZE: usize = 32;

/// Embeds document chunks and upserts them into the vector store.
///
/// Re-ingesting an unchanged document is a no-op; a backend failure aborts
/// the document but keeps already-upserted chunks, so a re-run resumes from
/// where it stopped.
pub struct Indexer {
    db: SharedDatabase,
    embedder: Arc<dyn Embedder>,
    chunker: Chunker,
    retry: RetryPolicy,
}

impl Indexer {
    pub fn new(db: SharedDatabase, embedder: Arc<dyn Embedder>, config: &Config) -> Result<Self> {
        Ok(Self {
            db,
            embedder,
            chunker: Chunker::new(&config.chunking)?,
            retry: RetryPolicy::new(config.llm_service.max_attempts),
        })
    }

    /// Index one document, returning the count of chunks newly embedded
    pub async fn index(&self, doc: &Document) -> Result<usize> {
        let mut doc = doc.clone();
        doc.ensure_hash();

        // Bind the store to this embedding space before writing anything
        {
            let db = self.db.lock().expect("db lock");
            db.register_model(self.embedder.model_name(), self.embedder.dimensions())?;
        }

        let pending = {
            let db = self.db.lock().expect("db lock");
            if db.has_document(&doc.hash)? && db.chunks_missing_embedding(&doc.hash)?.is_empty() {
                tracing::debug!(source = %doc.source, "document unchanged, skipping");
                return Ok(0);
            }

            if !db.has_document(&doc.hash)? {
                let chunks = self.chunker.chunk(&doc.text);
                db.insert_document(&doc)?;
                for chunk in &chunks {
                    db.insert_chunk(&doc.hash, chunk.seq, chunk.start, chunk.end, &chunk.text)?;
                }
            }
            db.chunks_missing_embedding(&doc.hash)?
        };

        tracing::info!(source = %doc.source, chunks = pending.len(), "indexing document");

        let mut embedded = 0usize;
        for batch in pending.chunks(BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|(_, body)| body.clone()).collect();
            let embeddings = self.retry.run(|| self.embedder.embed_batch(&texts)).await?;

            let db = self.db.lock().expect("db lock");
            for ((seq, _), embedding) in batch.iter().zip(embeddings.iter()) {
                db.insert_embedding(&doc.hash, *seq, self.embedder.model_name(), embedding)?;
                embedded += 1;
            }
        }

        Ok(embedded)
    }
}
