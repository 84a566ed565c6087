//! This module provides the two delivery mechanisms used by the error
//! reporter: a priority channel that queues small payloads and keeps
//! attempting them through shutdown, and a plain keepalive POST.
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// An opaque payload handed to a `PriorityChannel`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Beacon {
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Beacon {
    pub fn json(data: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: "application/json".to_string(),
            data: data.into(),
        }
    }
}

/// A best-effort channel whose sends are attempted even while the host is
/// tearing down.
pub trait PriorityChannel: Send + Sync {
    /// Queues `beacon` for delivery to `url`.
    ///
    /// Returns `true` if the payload was accepted for delivery. Acceptance
    /// says nothing about whether the collector received it.
    fn send_beacon(&self, url: &str, beacon: Beacon) -> bool;
}

/// An asynchronous POST that is not tied to the caller's lifetime.
pub trait KeepaliveClient: Send + Sync {
    /// Builds the request future. The returned future owns everything it
    /// needs, so it can be spawned and abandoned.
    fn post(&self, url: &str, content_type: &str, body: Vec<u8>) -> BoxFuture<'static, Result<()>>;
}

/// A `KeepaliveClient` backed by `reqwest`.
///
/// Relative paths are resolved against the collector base URL.
#[derive(Clone)]
pub struct ReqwestKeepalive {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestKeepalive {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", self.base_url, url.trim_start_matches('/'))
        }
    }
}

impl KeepaliveClient for ReqwestKeepalive {
    fn post(&self, url: &str, content_type: &str, body: Vec<u8>) -> BoxFuture<'static, Result<()>> {
        let request = self
            .client
            .post(self.resolve(url))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body);

        Box::pin(async move {
            request
                .send()
                .await
                .context("collector unreachable")?
                .error_for_status()?;
            Ok(())
        })
    }
}

type QueuedBeacon = (String, Beacon);

/// A `PriorityChannel` that queues beacons for a background worker.
///
/// The queue is bounded; `send_beacon` returns `false` instead of waiting
/// when it is full. `shutdown` stops intake and waits until every queued
/// beacon has been attempted.
pub struct BeaconQueue {
    sender: Mutex<Option<mpsc::Sender<QueuedBeacon>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl BeaconQueue {
    /// Starts the delivery worker on the current Tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `client` - The client used to deliver each beacon.
    /// * `capacity` - The maximum number of beacons waiting for delivery.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn spawn(client: Arc<dyn KeepaliveClient>, capacity: usize) -> Self {
        let (sender, mut receiver) = mpsc::channel::<QueuedBeacon>(capacity.max(1));

        let worker = tokio::spawn(async move {
            while let Some((url, beacon)) = receiver.recv().await {
                if let Err(e) = client.post(&url, &beacon.content_type, beacon.data).await {
                    debug!("Beacon delivery to {} failed: {:#}", url, e);
                }
            }
        });

        Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Closes the queue and waits for queued beacons to be attempted.
    pub async fn shutdown(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                debug!("Beacon worker ended abnormally: {}", e);
            }
        }
    }
}

impl PriorityChannel for BeaconQueue {
    fn send_beacon(&self, url: &str, beacon: Beacon) -> bool {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match sender.as_ref() {
            Some(sender) => sender.try_send((url.to_string(), beacon)).is_ok(),
            None => false,
        }
    }
}
