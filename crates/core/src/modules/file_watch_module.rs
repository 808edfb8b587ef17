use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};

use super::traits::{AsyncModule, ModuleEvent, ModuleId, ModuleMessage};
use crate::messages::ControllerEvent;

/// Polls a directory and reports pattern files that appear or change.
pub struct FileWatchModule {
    dir: PathBuf,
    suffix: String,
    poll_interval: Duration,
    known: HashMap<PathBuf, SystemTime>,
    changes_reported: u64,
    status: HashMap<String, String>,
}

impl FileWatchModule {
    pub fn new(dir: impl Into<PathBuf>, suffix: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            dir: dir.into(),
            suffix: suffix.into(),
            poll_interval,
            known: HashMap::new(),
            changes_reported: 0,
            status: HashMap::new(),
        }
    }

    fn is_pattern_file(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(&self.suffix))
    }

    /// Current modification times of every matching file.
    async fn scan(&self) -> std::io::Result<HashMap<PathBuf, SystemTime>> {
        let mut found = HashMap::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !self.is_pattern_file(&path) {
                continue;
            }
            match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => {
                    if let Ok(modified) = metadata.modified() {
                        found.insert(path, modified);
                    }
                }
                Ok(_) => {}
                Err(e) => log::debug!("Skipping {}: {}", path.display(), e),
            }
        }
        Ok(found)
    }

    /// Files that are new or have a different mtime since the last scan.
    fn diff(&mut self, current: HashMap<PathBuf, SystemTime>) -> Vec<PathBuf> {
        let mut changed: Vec<PathBuf> = current
            .iter()
            .filter(|(path, modified)| self.known.get(*path) != Some(*modified))
            .map(|(path, _)| path.clone())
            .collect();
        changed.sort();
        self.known = current;
        changed
    }

    async fn rebaseline(&mut self) {
        match self.scan().await {
            Ok(current) => {
                self.known = current;
                self.status
                    .insert("tracked_files".to_string(), self.known.len().to_string());
            }
            Err(e) => {
                log::warn!("Cannot scan {}: {}", self.dir.display(), e);
                self.known.clear();
            }
        }
    }
}

#[async_trait]
impl AsyncModule for FileWatchModule {
    fn id(&self) -> ModuleId {
        ModuleId::FileWatcher
    }

    async fn initialize(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        log::info!(
            "Watching {} for *{} (every {:?})",
            self.dir.display(),
            self.suffix,
            self.poll_interval
        );

        // Existing files are the baseline, not changes
        self.rebaseline().await;

        self.status
            .insert("directory".to_string(), self.dir.display().to_string());
        self.status
            .insert("status".to_string(), "initialized".to_string());
        Ok(())
    }

    async fn run(
        &mut self,
        mut rx: mpsc::Receiver<ModuleEvent>,
        tx: mpsc::Sender<ModuleMessage>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let _ = tx
            .send(ModuleMessage::Status(format!(
                "File watcher running on {}",
                self.dir.display()
            )))
            .await;

        let mut poll = interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.status.insert("status".to_string(), "running".to_string());

        loop {
            tokio::select! {
                event = rx.recv() => {
                    match event {
                        Some(ModuleEvent::Shutdown) | None => {
                            log::info!("File watcher received shutdown signal");
                            break;
                        }
                    }
                }

                _ = poll.tick() => {
                    let current = match self.scan().await {
                        Ok(current) => current,
                        Err(e) => {
                            log::debug!("Scan of {} failed: {}", self.dir.display(), e);
                            continue;
                        }
                    };

                    for path in self.diff(current) {
                        log::debug!("Detected change: {}", path.display());
                        self.changes_reported += 1;
                        if tx
                            .send(ModuleMessage::Event(ControllerEvent::FileChanged(path)))
                            .await
                            .is_err()
                        {
                            return Ok(());
                        }
                    }
                }
            }
        }

        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.status
            .insert("status".to_string(), "shutdown".to_string());
        self.status
            .insert("changes_reported".to_string(), self.changes_reported.to_string());
        log::info!("File watcher shutdown complete");
        Ok(())
    }

    fn status(&self) -> HashMap<String, String> {
        self.status.clone()
    }
}
