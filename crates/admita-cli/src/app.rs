//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "admita")]
#[command(
    author,
    version,
    about = "Grounded admission advisor for the AI and AI Product master's tracks"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest scraped program documents from a directory of JSON files
    Ingest(IngestArgs),

    /// Ask a one-off question grounded in the indexed materials
    Ask(AskArgs),

    /// Summarize one track from the indexed materials
    Summary(SummaryArgs),

    /// Compare the two tracks side by side
    Compare,

    /// Interactive advisor session (Q&A plus /intake)
    Chat,

    /// Show index status
    Status,
}

#[derive(Args)]
pub struct IngestArgs {
    /// Directory holding scraper output (*.json document records)
    pub dir: PathBuf,
}

#[derive(Args)]
pub struct AskArgs {
    /// The question to ask
    pub question: Vec<String>,
}

#[derive(Args)]
pub struct SummaryArgs {
    /// Track to summarize: "ai" or "ai-product"
    pub track: String,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
