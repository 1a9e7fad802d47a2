//! Diagnostic connection log.
//!
//! A small ring buffer of timestamped one-liners describing what the
//! discovery and transport layers have been doing, surfaced read-only to the
//! embedding UI. This is display material, not telemetry: entries may name
//! endpoint paths and status codes but never the lockfile secret.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

/// Maximum retained entries; the oldest is evicted beyond this.
const CAPACITY: usize = 50;

/// Shared, bounded diagnostic log.
#[derive(Clone, Default)]
pub struct ConnectionLog {
    entries: Arc<Mutex<VecDeque<String>>>,
}

impl ConnectionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a timestamped entry, evicting the oldest at capacity.
    pub fn push(&self, message: impl AsRef<str>) {
        let stamped = format!(
            "[{}] {}",
            chrono::Local::now().format("%H:%M:%S"),
            message.as_ref()
        );
        let mut entries = self.entries.lock();
        if entries.len() == CAPACITY {
            entries.pop_front();
        }
        entries.push_back(stamped);
    }

    /// Snapshot of the current entries, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl std::fmt::Debug for ConnectionLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionLog")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_timestamped() {
        let log = ConnectionLog::new();
        log.push("probe by process");
        let snapshot = log.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot[0].starts_with('['));
        assert!(snapshot[0].ends_with("probe by process"));
    }

    #[test]
    fn oldest_entry_is_evicted_at_capacity() {
        let log = ConnectionLog::new();
        for i in 0..CAPACITY + 10 {
            log.push(format!("entry {i}"));
        }
        let snapshot = log.snapshot();
        assert_eq!(snapshot.len(), CAPACITY);
        assert!(snapshot[0].ends_with("entry 10"));
        assert!(snapshot.last().unwrap().ends_with(&format!("entry {}", CAPACITY + 9)));
    }

    #[test]
    fn clones_share_the_same_buffer() {
        let log = ConnectionLog::new();
        let clone = log.clone();
        clone.push("shared");
        assert_eq!(log.len(), 1);
    }
}
