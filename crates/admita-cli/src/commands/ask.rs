//! One-off question, track summary, and comparison commands

use crate::app::{AskArgs, SummaryArgs};
use crate::commands::build_service;
use admita_core::{Config, SharedDatabase, Track};
use anyhow::Result;

const ONE_OFF_CONVERSATION: &str = "cli-ask";

pub async fn run(args: AskArgs, db: SharedDatabase, config: Config) -> Result<()> {
    let question = args.question.join(" ");
    if question.trim().is_empty() {
        anyhow::bail!("empty question");
    }

    let service = build_service(db, config)?;
    let reply = service.handle_question(ONE_OFF_CONVERSATION, &question).await?;
    println!("{reply}");
    Ok(())
}

pub async fn run_summary(args: SummaryArgs, db: SharedDatabase, config: Config) -> Result<()> {
    let track = Track::parse(&args.track)?;
    if track == Track::None {
        anyhow::bail!("expected \"ai\" or \"ai-product\"");
    }

    let service = build_service(db, config)?;
    let reply = service.track_summary(track).await?;
    println!("{reply}");
    Ok(())
}

pub async fn run_compare(db: SharedDatabase, config: Config) -> Result<()> {
    let service = build_service(db, config)?;
    let reply = service.compare_tracks().await?;
    println!("{reply}");
    Ok(())
}
