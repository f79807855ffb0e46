//! Command implementations

pub mod ask;
pub mod chat;
pub mod ingest;
pub mod status;

use admita_core::{AdvisorService, Config, HttpClient, SharedDatabase};
use anyhow::Result;
use std::sync::Arc;

/// Wire the advisor service to the configured inference backend
pub fn build_service(db: SharedDatabase, config: Config) -> Result<AdvisorService> {
    let client = Arc::new(HttpClient::new(config.llm_service.clone())?);
    Ok(AdvisorService::new(db, client.clone(), client, config)?)
}
