use std::io::Write;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::services::Interaction;

/// Terminal front-end for engine questions.
pub struct ConsoleInteraction {
    lines: Lines<BufReader<Stdin>>,
    unattended: bool,
}

impl ConsoleInteraction {
    /// With `unattended` set, every confirmation is answered "no" and no
    /// replacement key is ever offered.
    pub fn new(unattended: bool) -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            unattended,
        }
    }

    async fn ask(&mut self, prompt: &str) -> Option<String> {
        eprint!("{prompt} ");
        if let Err(e) = std::io::stderr().flush() {
            tracing::debug!("Failed to flush stderr: {}", e);
        }
        match self.lines.next_line().await {
            Ok(line) => line.map(|l| l.trim().to_string()),
            Err(e) => {
                tracing::warn!("Failed to read from stdin: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl Interaction for ConsoleInteraction {
    async fn confirm(&mut self, title: &str, question: &str) -> bool {
        if self.unattended {
            tracing::info!("{}: {} (unattended, answering no)", title, question);
            return false;
        }
        eprintln!("\n--- {title} ---");
        matches!(
            self.ask(&format!("{question} (y/n):")).await.as_deref(),
            Some("y" | "Y" | "yes" | "Yes")
        )
    }

    async fn request_credential(&mut self, title: &str, prompt: &str) -> Option<String> {
        if self.unattended {
            return None;
        }
        eprintln!("\n--- {title} ---");
        self.ask(prompt).await.filter(|key| !key.is_empty())
    }
}
