//! Terminal stand-ins for the platform collaborators.

use async_trait::async_trait;
use plazmer_core::host::{ConfirmPrompt, WebContentHost};
use plazmer_core::notify::{NotificationId, Notifier, OpenAction};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// y/N prompt on the terminal; `--yes` answers for the user.
pub struct TerminalPrompt {
    assume_yes: bool,
}

impl TerminalPrompt {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

#[async_trait]
impl ConfirmPrompt for TerminalPrompt {
    async fn confirm(&self, title: &str, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        let mut stderr = tokio::io::stderr();
        let question = format!("{title}\n{message} [y/N] ");
        if stderr.write_all(question.as_bytes()).await.is_err() {
            return false;
        }
        let _ = stderr.flush().await;

        let mut line = String::new();
        match BufReader::new(tokio::io::stdin()).read_line(&mut line).await {
            Ok(_) => is_yes(&line),
            // No terminal to ask: treat as declined.
            Err(_) => false,
        }
    }
}

pub(crate) fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Prints notifications as lines on stdout and counts failures.
#[derive(Default)]
pub struct StdoutNotifier {
    failures: AtomicUsize,
}

impl StdoutNotifier {
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }
}

impl Notifier for StdoutNotifier {
    fn started(&self, id: NotificationId, name: &str) {
        println!("{}", started_line(id, name));
    }

    fn completed(&self, id: NotificationId, _name: &str, open: &OpenAction) {
        println!("{}", completed_line(id, open));
    }

    fn error(&self, id: NotificationId, message: &str) {
        self.failures.fetch_add(1, Ordering::SeqCst);
        println!("{}", error_line(id, message));
    }
}

pub(crate) fn started_line(id: NotificationId, name: &str) -> String {
    format!("[{id}] downloading {name}")
}

pub(crate) fn completed_line(id: NotificationId, open: &OpenAction) -> String {
    format!("[{id}] saved {} ({})", open.path.display(), open.mime_type)
}

pub(crate) fn error_line(id: NotificationId, message: &str) -> String {
    format!("[{id}] failed: {message}")
}

/// No page to run scripts in: injected scripts are printed instead.
#[derive(Debug, Default)]
pub struct HeadlessHost;

impl WebContentHost for HeadlessHost {
    fn inject_script(&self, script: &str) -> anyhow::Result<()> {
        println!("{script}");
        Ok(())
    }
}
