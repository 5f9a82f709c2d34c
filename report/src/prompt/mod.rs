//! Interactive export confirmation with a timeout.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::export::export_path;
use crate::logs::{log_info, log_warning};

pub const DEFAULT_PROMPT_TIMEOUT: Duration = Duration::from_secs(60);

/// Source of answers to yes/no and free-text questions.
#[allow(async_fn_in_trait)]
pub trait Prompter {
    /// Ask `question`; `None` when no answer arrived within `timeout` or
    /// input is closed.
    async fn ask(&mut self, question: &str, timeout: Duration) -> Option<String>;
}

/// Reads answers from standard input.
///
/// The read happens on a detached thread so a timed-out question never keeps
/// the runtime from shutting down.
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    async fn ask(&mut self, question: &str, timeout: Duration) -> Option<String> {
        print!("{}", question);
        let _ = io::stdout().flush();

        let (tx, rx) = oneshot::channel();
        thread::spawn(move || {
            let mut line = String::new();
            let answer = match io::stdin().lock().read_line(&mut line) {
                Ok(0) | Err(_) => None,
                Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            };
            let _ = tx.send(answer);
        });

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(_)) => None,
            Err(_) => {
                println!();
                log_warning(format!("No answer after {}s", timeout.as_secs()));
                None
            }
        }
    }
}

/// `y`, `Y` and `1` confirm.
pub fn is_confirmation(answer: &str) -> bool {
    matches!(answer.trim(), "y" | "Y" | "1")
}

/// Ask whether to export and under which name.
///
/// Returns the target `.xlsx` path, or `None` when the user declines or does
/// not answer in time.
pub async fn confirm_export<P: Prompter>(prompter: &mut P, timeout: Duration) -> Option<PathBuf> {
    let answer = prompter.ask("\nSave to Excel? (y/N): ", timeout).await;
    if !answer.as_deref().is_some_and(is_confirmation) {
        log_info("❌ Not saved to Excel");
        return None;
    }

    let name = prompter
        .ask("File name (without .xlsx): ", timeout)
        .await
        .unwrap_or_default();
    Some(export_path(&name))
}
