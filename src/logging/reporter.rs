//! This module delivers error entries to the remote collector.
//!
//! Each call makes at most one delivery attempt and never waits for it: the
//! priority channel is preferred, and the keepalive POST is only used when
//! no priority channel exists. Nothing is retried or queued here.
use super::entry::LogEntry;
use crate::adapters::{Beacon, KeepaliveClient, PriorityChannel};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::debug;

const JSON: &str = "application/json";

/// How a `send` call was dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Handed to the priority channel.
    Beacon,
    /// Spawned as a keepalive POST.
    Keepalive,
    /// Dropped: no mechanism available, serialization failed, or no runtime
    /// to run the POST on.
    Dropped,
}

#[derive(Clone)]
pub struct ErrorReporter {
    path: String,
    priority_channel: Option<Arc<dyn PriorityChannel>>,
    keepalive: Option<Arc<dyn KeepaliveClient>>,
    runtime: Option<Handle>,
}

impl ErrorReporter {
    /// Creates a new `ErrorReporter`.
    ///
    /// The Tokio runtime current at construction (if any) is remembered and
    /// used to run keepalive requests, so `send` works from any thread.
    pub fn new(
        path: impl Into<String>,
        priority_channel: Option<Arc<dyn PriorityChannel>>,
        keepalive: Option<Arc<dyn KeepaliveClient>>,
    ) -> Self {
        Self {
            path: path.into(),
            priority_channel,
            keepalive,
            runtime: Handle::try_current().ok(),
        }
    }

    /// Makes one fire-and-forget delivery attempt for `entry`.
    pub fn send(&self, entry: &LogEntry) -> Dispatch {
        let payload = match serde_json::to_vec(entry) {
            Ok(payload) => payload,
            Err(e) => {
                debug!("Error report not serialized: {}", e);
                return Dispatch::Dropped;
            }
        };

        if let Some(channel) = &self.priority_channel {
            if !channel.send_beacon(&self.path, Beacon::json(payload)) {
                debug!("Priority channel refused error report for {}", self.path);
            }
            return Dispatch::Beacon;
        }

        let Some(client) = &self.keepalive else {
            debug!("No delivery mechanism available for error report");
            return Dispatch::Dropped;
        };

        let runtime = self
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok());
        let Some(runtime) = runtime else {
            debug!("No async runtime available for error report");
            return Dispatch::Dropped;
        };

        let request = client.post(&self.path, JSON, payload);
        let path = self.path.clone();
        runtime.spawn(async move {
            if let Err(e) = request.await {
                debug!("Error report to {} failed: {:#}", path, e);
            }
        });
        Dispatch::Keepalive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::entry::{ErrorInfo, LogLevel};
    use anyhow::anyhow;
    use chrono::Utc;
    use futures::future::BoxFuture;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingChannel {
        sent: Mutex<Vec<(String, Beacon)>>,
    }

    impl PriorityChannel for RecordingChannel {
        fn send_beacon(&self, url: &str, beacon: Beacon) -> bool {
            self.sent.lock().unwrap().push((url.to_string(), beacon));
            true
        }
    }

    #[derive(Default)]
    struct FailingClient {
        calls: Mutex<Vec<(String, String)>>,
    }

    impl KeepaliveClient for FailingClient {
        fn post(&self, url: &str, content_type: &str, _body: Vec<u8>) -> BoxFuture<'static, anyhow::Result<()>> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), content_type.to_string()));
            Box::pin(async { Err(anyhow!("connection refused")) })
        }
    }

    fn error_entry() -> LogEntry {
        LogEntry {
            timestamp: Utc::now(),
            level: LogLevel::Error,
            message: "boom".into(),
            args: vec![],
            error: Some(ErrorInfo::new("TypeError", "x is undefined")),
            url: "app://checkout".into(),
            user_agent: "test".into(),
        }
    }

    #[test]
    fn prefers_the_priority_channel() {
        let channel = Arc::new(RecordingChannel::default());
        let client = Arc::new(FailingClient::default());
        let reporter = ErrorReporter::new(
            "/api/log/frontend-error",
            Some(channel.clone()),
            Some(client.clone()),
        );

        assert_eq!(reporter.send(&error_entry()), Dispatch::Beacon);

        let sent = channel.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "/api/log/frontend-error");
        assert_eq!(sent[0].1.content_type, "application/json");
        let payload: serde_json::Value = serde_json::from_slice(&sent[0].1.data).unwrap();
        assert_eq!(payload["level"], "ERROR");
        assert_eq!(payload["message"], "boom");
        assert!(client.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn falls_back_to_keepalive_and_swallows_failures() {
        let client = Arc::new(FailingClient::default());
        let reporter = ErrorReporter::new("/collect", None, Some(client.clone()));

        assert_eq!(reporter.send(&error_entry()), Dispatch::Keepalive);
        tokio::task::yield_now().await;

        assert_eq!(
            *client.calls.lock().unwrap(),
            vec![("/collect".to_string(), "application/json".to_string())]
        );
    }

    #[test]
    fn drops_without_any_mechanism() {
        let reporter = ErrorReporter::new("/collect", None, None);
        assert_eq!(reporter.send(&error_entry()), Dispatch::Dropped);
    }
}
