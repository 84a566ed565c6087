//! This module mirrors the trailing window of the log buffer to the
//! persistent key-value store.
use super::buffer::LogBuffer;
use super::entry::LogEntry;
use crate::adapters::KeyValueStore;
use crate::error::LoggerError;
use std::sync::Arc;
use tracing::debug;

/// Writes the most recent entries under a single storage key.
///
/// Every failure is swallowed here: a full or broken store must never reach
/// the caller of a log method.
#[derive(Clone)]
pub struct PersistenceSink {
    store: Arc<dyn KeyValueStore>,
    key: String,
    window: usize,
}

impl PersistenceSink {
    /// Creates a new `PersistenceSink`.
    ///
    /// # Arguments
    ///
    /// * `store` - The store the snapshot is written to.
    /// * `key` - The key that holds the snapshot.
    /// * `window` - How many of the most recent entries are kept.
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>, window: usize) -> Self {
        Self {
            store,
            key: key.into(),
            window,
        }
    }

    /// Overwrites the stored snapshot with the buffer's trailing window.
    pub fn save(&self, buffer: &LogBuffer) {
        let recent = buffer.tail(self.window);
        let serialized = match serde_json::to_string(&recent) {
            Ok(json) => json,
            Err(e) => {
                debug!("Skipping log snapshot, serialization failed: {}", e);
                return;
            }
        };

        if let Err(e) = self.store.set_item(&self.key, &serialized) {
            debug!("Log snapshot not persisted: {:#}", e);
        }
    }

    /// Removes the stored snapshot.
    pub fn clear(&self) {
        if let Err(e) = self.store.remove_item(&self.key) {
            debug!("Log snapshot not removed: {:#}", e);
        }
    }

    /// Reads the stored snapshot back.
    ///
    /// # Errors
    ///
    /// This function will return an error if the store cannot be read or the
    /// stored value is not a list of entries.
    pub fn load(&self) -> Result<Vec<LogEntry>, LoggerError> {
        match self.store.get_item(&self.key)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryKeyValueStore;
    use crate::logging::entry::LogLevel;
    use anyhow::anyhow;
    use chrono::Utc;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get_item(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Err(anyhow!("unavailable"))
        }

        fn set_item(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            Err(anyhow!("QuotaExceededError"))
        }

        fn remove_item(&self, _key: &str) -> anyhow::Result<()> {
            Err(anyhow!("unavailable"))
        }
    }

    fn filled_buffer(count: usize) -> LogBuffer {
        let mut buffer = LogBuffer::new(1000);
        for i in 0..count {
            buffer.append(LogEntry {
                timestamp: Utc::now(),
                level: LogLevel::Debug,
                message: format!("entry {}", i),
                args: vec![i.to_string().into()],
                error: None,
                url: "app://test".into(),
                user_agent: "test".into(),
            });
        }
        buffer
    }

    #[test]
    fn saves_only_the_trailing_window() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let sink = PersistenceSink::new(store.clone(), "xc_app_logs", 100);
        let buffer = filled_buffer(150);

        sink.save(&buffer);

        let persisted = sink.load().unwrap();
        assert_eq!(persisted, buffer.tail(100));
        assert_eq!(persisted[0].message, "entry 50");
    }

    #[test]
    fn small_buffers_are_saved_whole() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let sink = PersistenceSink::new(store, "k", 100);
        let buffer = filled_buffer(3);

        sink.save(&buffer);
        assert_eq!(sink.load().unwrap(), buffer.snapshot());

        sink.clear();
        assert!(sink.load().unwrap().is_empty());
    }

    #[test]
    fn store_failures_are_swallowed() {
        let sink = PersistenceSink::new(Arc::new(BrokenStore), "k", 100);
        sink.save(&filled_buffer(1));
        sink.clear();
        assert!(sink.load().is_err());
    }
}
