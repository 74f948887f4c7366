//! Terminal text prompt

use async_trait::async_trait;
use bridge_traits::ui::{PromptResponse, TextPrompt};
use std::io::{self, BufRead, Write};
use tracing::warn;

/// Reads a single line from standard input
///
/// End of input (Ctrl-D) or a read error counts as a dismissed prompt.
/// The trailing newline is stripped; other whitespace is left for the caller.
#[derive(Debug, Default, Clone)]
pub struct StdinPrompt;

impl StdinPrompt {
    pub fn new() -> Self {
        Self
    }

    fn read_line(title: &str, label: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", title)?;
        write!(stdout, "{} ", label)?;
        stdout.flush()?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }

        let trimmed_len = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed_len);
        Ok(Some(line))
    }
}

#[async_trait]
impl TextPrompt for StdinPrompt {
    async fn get_text(&self, title: &str, label: &str) -> PromptResponse {
        let title = title.to_string();
        let label = label.to_string();

        let result = tokio::task::spawn_blocking(move || Self::read_line(&title, &label)).await;

        match result {
            Ok(Ok(Some(text))) => PromptResponse::confirmed(text),
            Ok(Ok(None)) => PromptResponse::cancelled(),
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to read from stdin");
                PromptResponse::cancelled()
            }
            Err(e) => {
                warn!(error = %e, "Prompt task failed");
                PromptResponse::cancelled()
            }
        }
    }
}
