//! In-process stand-ins for the platform collaborators.

use async_trait::async_trait;
use plazmer_core::config::PlazmerConfig;
use plazmer_core::host::{ConfirmPrompt, WebContentHost};
use plazmer_core::notify::{FileOpener, NotificationId, Notifier, OpenAction};
use plazmer_core::HostParts;
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Note {
    Started(NotificationId, String),
    Completed(NotificationId, String, OpenAction),
    Error(NotificationId, String),
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub notes: Mutex<Vec<Note>>,
}

impl RecordingNotifier {
    pub fn notes(&self) -> Vec<Note> {
        self.notes.lock().unwrap().clone()
    }

    pub fn completed_paths(&self) -> Vec<std::path::PathBuf> {
        self.notes()
            .into_iter()
            .filter_map(|n| match n {
                Note::Completed(_, _, open) => Some(open.path),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notes()
            .into_iter()
            .filter_map(|n| match n {
                Note::Error(_, msg) => Some(msg),
                _ => None,
            })
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn started(&self, id: NotificationId, name: &str) {
        self.notes.lock().unwrap().push(Note::Started(id, name.to_string()));
    }
    fn completed(&self, id: NotificationId, name: &str, open: &OpenAction) {
        self.notes
            .lock()
            .unwrap()
            .push(Note::Completed(id, name.to_string(), open.clone()));
    }
    fn error(&self, id: NotificationId, message: &str) {
        self.notes.lock().unwrap().push(Note::Error(id, message.to_string()));
    }
}

#[derive(Default)]
pub struct RecordingOpener {
    pub opened: Mutex<Vec<OpenAction>>,
}

impl FileOpener for RecordingOpener {
    fn open(&self, action: &OpenAction) -> anyhow::Result<()> {
        self.opened.lock().unwrap().push(action.clone());
        Ok(())
    }
}

/// Answers every prompt the same way and records what was asked.
pub struct FixedPrompt {
    pub accept: bool,
    pub asked: Mutex<Vec<String>>,
}

impl FixedPrompt {
    pub fn new(accept: bool) -> Self {
        Self {
            accept,
            asked: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ConfirmPrompt for FixedPrompt {
    async fn confirm(&self, _title: &str, message: &str) -> bool {
        self.asked.lock().unwrap().push(message.to_string());
        self.accept
    }
}

#[derive(Default)]
pub struct RecordingHost {
    pub scripts: Mutex<Vec<String>>,
}

impl WebContentHost for RecordingHost {
    fn inject_script(&self, script: &str) -> anyhow::Result<()> {
        self.scripts.lock().unwrap().push(script.to_string());
        Ok(())
    }
}

/// Everything a test needs to inspect after driving the service.
pub struct Harness {
    pub notifier: Arc<RecordingNotifier>,
    pub opener: Arc<RecordingOpener>,
    pub prompt: Arc<FixedPrompt>,
    pub host: Arc<RecordingHost>,
}

impl Harness {
    pub fn new(accept: bool) -> Self {
        Self {
            notifier: Arc::new(RecordingNotifier::default()),
            opener: Arc::new(RecordingOpener::default()),
            prompt: Arc::new(FixedPrompt::new(accept)),
            host: Arc::new(RecordingHost::default()),
        }
    }

    pub fn parts(&self) -> HostParts {
        let mut parts = HostParts::new(self.host.clone(), self.prompt.clone());
        parts.notifier = self.notifier.clone();
        parts.opener = self.opener.clone();
        parts
    }
}

/// Config with every directory under `root`.
pub fn config_in(root: &Path) -> PlazmerConfig {
    let mut cfg = PlazmerConfig::default();
    cfg.downloads_dir = Some(root.join("Downloads"));
    cfg.staging_dir = Some(root.join("staging"));
    cfg.cache.dir = Some(root.join("cache"));
    cfg.user_agent = "plazmer-test".to_string();
    cfg
}
