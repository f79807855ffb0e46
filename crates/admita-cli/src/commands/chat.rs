//! Interactive advisor session
//!
//! A line-oriented REPL over one conversation. Messages go to the Q&A path
//! unless an intake is in progress, in which case they feed the intake
//! machine until it completes or is cancelled.

use crate::commands::build_service;
use admita_core::{Config, SharedDatabase};
use anyhow::Result;
use std::io::{BufRead, Write};

const CONVERSATION: &str = "cli-chat";

const BANNER: &str = "\
Admita advisor. Ask about the AI and AI Product master's tracks.
Commands: /intake (guided recommendation), /reset, /quit";

pub async fn run(db: SharedDatabase, config: Config) -> Result<()> {
    let service = build_service(db, config)?;

    println!("{BANNER}");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        match text {
            "/quit" | "/exit" => break,
            "/reset" => {
                service.reset(CONVERSATION).await;
                println!("Conversation reset.");
            }
            _ => {
                let intake = text.eq_ignore_ascii_case("/intake")
                    || service.intake_active(CONVERSATION).await;
                let reply = if intake {
                    service.handle_intake_message(CONVERSATION, text).await?
                } else {
                    service.handle_question(CONVERSATION, text).await?
                };
                println!("{reply}");
            }
        }
    }

    service.end(CONVERSATION).await;
    Ok(())
}
