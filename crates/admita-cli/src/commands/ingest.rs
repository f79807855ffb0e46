//! Ingest command
//!
//! Walks a directory of scraper output (*.json) and indexes every document
//! record found. Files hold either a single record or an array of records.

use crate::app::IngestArgs;
use admita_core::{Config, Document, HttpClient, Indexer, SharedDatabase};
use anyhow::{Context, Result};
use std::sync::Arc;
use walkdir::WalkDir;

pub async fn run(
    args: IngestArgs,
    db: SharedDatabase,
    config: &Config,
    verbose: bool,
) -> Result<()> {
    if !args.dir.is_dir() {
        anyhow::bail!("{} is not a directory", args.dir.display());
    }

    let embedder = Arc::new(HttpClient::new(config.llm_service.clone())?);
    let indexer = Indexer::new(db, embedder, config)?;

    let mut files = 0usize;
    let mut documents = 0usize;
    let mut embedded = 0usize;

    for entry in WalkDir::new(&args.dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
    {
        let path = entry.path();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let records = parse_records(&content)
            .with_context(|| format!("parsing {}", path.display()))?;

        files += 1;
        for doc in records {
            let new_chunks = indexer.index(&doc).await?;
            documents += 1;
            embedded += new_chunks;
            if verbose {
                if new_chunks > 0 {
                    println!("{}: {} chunks embedded", doc.source, new_chunks);
                } else {
                    println!("{}: unchanged", doc.source);
                }
            }
        }
    }

    println!("{files} files, {documents} documents, {embedded} chunks embedded");
    Ok(())
}

fn parse_records(content: &str) -> Result<Vec<Document>> {
    if let Ok(records) = serde_json::from_str::<Vec<Document>>(content) {
        return Ok(records);
    }
    let single: Document = serde_json::from_str(content)?;
    Ok(vec![single])
}

#[cfg(test)]
mod tests {
    use super::*;
    use admita_core::{DocumentKind, Track};

    #[test]
    fn test_parses_single_record_and_array() {
        let single = r#"{"source": "https://example.edu/ai", "text": "Curriculum",
                         "kind": "webpage", "track": "ai"}"#;
        let docs = parse_records(single).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].kind, DocumentKind::Webpage);
        assert_eq!(docs[0].track, Track::Ai);

        let array = format!("[{single}, {single}]");
        assert_eq!(parse_records(&array).unwrap().len(), 2);
    }

    #[test]
    fn test_rejects_malformed_record() {
        assert!(parse_records(r#"{"source": "x"}"#).is_err());
    }
}
