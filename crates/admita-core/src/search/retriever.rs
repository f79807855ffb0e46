//! Vector similarity search
//!
//! Computes cosine similarity between the query embedding and stored
//! embeddings. Ties are broken by the smaller (document hash, ordinal) key
//! so results are reproducible across runs.

use super::{RetrievalResult, ScoredChunk};
use crate::db::{cosine_similarity, SharedDatabase, Track};
use crate::error::{AdmitaError, Result};
use crate::llm::Embedder;
use std::cmp::Ordering;
use std::sync::Arc;

/// Top-K passage retrieval over the vector store
pub struct Retriever {
    db: SharedDatabase,
    embedder: Arc<dyn Embedder>,
    min_score: f32,
}

impl Retriever {
    pub fn new(db: SharedDatabase, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            db,
            embedder,
            min_score: 0.0,
        }
    }

    /// Chunks scoring at or below the threshold are not evidence
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Retrieve the top-`k` most relevant passages for the query.
    ///
    /// Returns fewer than `k` only if the store holds fewer eligible chunks;
    /// an empty store yields an empty result, not a failure.
    pub async fn retrieve(
        &self,
        query: &str,
        k: usize,
        track: Option<Track>,
    ) -> Result<RetrievalResult> {
        let stored = {
            let db = self.db.lock().expect("db lock");

            // The store is bound to one embedding space; a different query
            // embedder is a configuration error, not a silent mismatch.
            if let Some((model, dims)) = db.registered_model()? {
                if model != self.embedder.model_name() || dims != self.embedder.dimensions() {
                    return Err(AdmitaError::Config(format!(
                        "store was indexed with model '{model}' ({dims} dims) but the \
                         retriever uses '{}' ({})",
                        self.embedder.model_name(),
                        self.embedder.dimensions()
                    )));
                }
            }

            db.get_embeddings(track)?
        };

        if stored.is_empty() {
            return Ok(RetrievalResult::default());
        }

        let query_embedding = self.embedder.embed(query).await?;

        let mut scored: Vec<(String, u32, f32)> = stored
            .into_iter()
            .map(|(hash, seq, embedding)| {
                let sim = cosine_similarity(&query_embedding, &embedding);
                (hash, seq, sim)
            })
            .collect();

        scored.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
                .then_with(|| a.1.cmp(&b.1))
        });

        scored.retain(|(_, _, score)| *score > self.min_score);

        let mut passages = Vec::with_capacity(k.min(scored.len()));
        let db = self.db.lock().expect("db lock");
        for (hash, seq, score) in scored.into_iter().take(k) {
            if let Some(chunk) = db.get_chunk(&hash, seq)? {
                passages.push(ScoredChunk { chunk, score });
            }
        }

        tracing::debug!(query_len = query.len(), results = passages.len(), "retrieval done");
        Ok(RetrievalResult { passages })
    }
}
