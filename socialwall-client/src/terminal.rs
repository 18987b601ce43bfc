//! Line-based front end on stdin and stdout.

use crate::ui::Ui;
use std::io::{self, BufRead, StdinLock, Write};
use tracing::warn;

pub const PROMPT: &str = "> ";

pub struct TerminalUi {
    lines: io::Lines<StdinLock<'static>>,
}

impl TerminalUi {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: io::stdin().lock().lines(),
        }
    }

    /// Prompts and reads the next line. `None` once stdin is closed or
    /// unreadable.
    pub fn next_line(&mut self, prompt: &str) -> Option<String> {
        print_flushed(prompt);
        match self.lines.next()? {
            Ok(line) => Some(line),
            Err(err) => {
                warn!(error = %err, "Could not read from stdin");
                None
            }
        }
    }
}

impl Default for TerminalUi {
    fn default() -> Self {
        Self::new()
    }
}

fn print_flushed(text: &str) {
    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout.write_all(text.as_bytes()).and_then(|()| stdout.flush()) {
        warn!(error = %err, "Could not write to stdout");
    }
}

impl Ui for TerminalUi {
    fn alert(&mut self, message: &str) {
        println!("! {message}");
    }

    fn confirm(&mut self, question: &str) -> bool {
        let Some(answer) = self.next_line(&format!("{question} [y/N] ")) else {
            return false;
        };
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}
