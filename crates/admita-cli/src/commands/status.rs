//! Status command

use crate::app::OutputFormat;
use admita_core::SharedDatabase;
use anyhow::Result;

pub async fn run(db: SharedDatabase, format: OutputFormat) -> Result<()> {
    let stats = {
        let db = db.lock().expect("db lock");
        db.stats()?
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Text => {
            println!("Documents:       {}", stats.documents);
            println!("Chunks:          {}", stats.chunks);
            println!();
            println!("Embeddings:");
            println!("  Embedded:      {}", stats.embedded);
            println!("  Pending:       {}", stats.pending_embedding);
            println!(
                "  Model:         {}",
                stats.embedding_model.as_deref().unwrap_or("(none)")
            );
        }
    }
    Ok(())
}
