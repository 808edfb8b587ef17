use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::Instant;

/// Per-file quiet window for change events.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last_seen: HashMap<PathBuf, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_seen: HashMap::new(),
        }
    }

    /// True when `path` has been quiet for the whole window. Accepted
    /// events restart the window; rejected ones do not.
    pub fn accept(&mut self, path: &Path, now: Instant) -> bool {
        if let Some(last) = self.last_seen.get(path) {
            if now.saturating_duration_since(*last) < self.window {
                return false;
            }
        }
        self.last_seen.insert(path.to_path_buf(), now);
        true
    }

    /// Start a window without an event, e.g. after writing the file ourselves.
    pub fn mark(&mut self, path: &Path, now: Instant) {
        self.last_seen.insert(path.to_path_buf(), now);
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
