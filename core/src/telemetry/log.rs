use log::{info, warn};
use std::collections::VecDeque;

const HISTORY_LIMIT: usize = 20;

/// User-facing activity feed, mirrored to the `log` facade.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: VecDeque<String>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.push(message);
    }

    pub fn record_failure(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.push(message);
    }

    /// Oldest first.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &String> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, entry: String) {
        self.entries.push_back(entry);
        while self.entries.len() > HISTORY_LIMIT {
            self.entries.pop_front();
        }
    }
}
