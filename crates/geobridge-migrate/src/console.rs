//! Shared, append-only log of verification and migration steps.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Info,
    Notice,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsoleEntry {
    pub timestamp: DateTime<Utc>,
    pub level: ConsoleLevel,
    pub message: String,
}

/// Console shown to the user; every entry is also emitted as a tracing event
///
/// Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct ConsoleLog {
    entries: Arc<Mutex<VecDeque<ConsoleEntry>>>,
}

impl ConsoleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(target: "geobridge::console", "{}", message);
        self.push(ConsoleLevel::Info, message);
    }

    pub fn notice(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(target: "geobridge::console", "{}", message);
        self.push(ConsoleLevel::Notice, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(target: "geobridge::console", "{}", message);
        self.push(ConsoleLevel::Error, message);
    }

    /// Append a JSON value, pretty-printed
    pub fn json(&self, value: &serde_json::Value) {
        let rendered = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        self.info(rendered);
    }

    /// Entries, most recent first
    pub fn entries(&self) -> Vec<ConsoleEntry> {
        self.lock().iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<ConsoleEntry> {
        self.lock().front().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn push(&self, level: ConsoleLevel, message: String) {
        self.lock().push_front(ConsoleEntry { timestamp: Utc::now(), level, message });
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<ConsoleEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_most_recent_first() {
        let console = ConsoleLog::new();
        console.info("first");
        console.error("second");

        let entries = console.entries();
        assert_eq!(entries[0].message, "second");
        assert_eq!(entries[0].level, ConsoleLevel::Error);
        assert_eq!(entries[1].message, "first");
    }

    #[test]
    fn test_clones_share_entries() {
        let console = ConsoleLog::new();
        let writer = console.clone();
        writer.notice("skipped");
        assert_eq!(console.len(), 1);

        console.clear();
        assert!(writer.is_empty());
    }

    #[test]
    fn test_json_is_pretty_printed() {
        let console = ConsoleLog::new();
        console.json(&json!({ "id": 7 }));
        assert_eq!(console.latest().unwrap().message, "{\n  \"id\": 7\n}");
    }

    #[test]
    fn test_concurrent_writers_lose_nothing() {
        let console = ConsoleLog::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let console = console.clone();
                std::thread::spawn(move || {
                    for j in 0..25 {
                        console.info(format!("{}-{}", i, j));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(console.len(), 200);
    }
}
