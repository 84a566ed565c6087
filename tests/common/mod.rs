#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use xc_logger::adapters::{
    Beacon, Clock, GlobalErrorHub, MemoryKeyValueStore, PriorityChannel, StaticPageInfo,
};
use xc_logger::{HostCapabilities, Logger, LoggerConfig, RuntimeMode};

/// A clock that advances one millisecond per reading.
pub struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
}

impl SteppingClock {
    pub fn new() -> Self {
        Self {
            next: Mutex::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut next = self.next.lock().unwrap();
        let now = *next;
        *next = now + Duration::milliseconds(1);
        now
    }
}

#[derive(Default)]
pub struct RecordingChannel {
    pub sent: Mutex<Vec<(String, Beacon)>>,
}

impl RecordingChannel {
    pub fn payloads(&self) -> Vec<serde_json::Value> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, beacon)| serde_json::from_slice(&beacon.data).unwrap())
            .collect()
    }
}

impl PriorityChannel for RecordingChannel {
    fn send_beacon(&self, url: &str, beacon: Beacon) -> bool {
        self.sent.lock().unwrap().push((url.to_string(), beacon));
        true
    }
}

pub struct Harness {
    pub logger: Logger,
    pub store: Arc<MemoryKeyValueStore>,
    pub channel: Arc<RecordingChannel>,
    pub hub: Arc<GlobalErrorHub>,
}

pub fn harness(mode: RuntimeMode) -> Harness {
    let store = Arc::new(MemoryKeyValueStore::new());
    let channel = Arc::new(RecordingChannel::default());
    let hub = GlobalErrorHub::new();

    let host = HostCapabilities::detached()
        .with_clock(Arc::new(SteppingClock::new()))
        .with_page(Arc::new(StaticPageInfo::new(
            "https://portal.example/course/7",
            "Mozilla/5.0 (test)",
        )))
        .with_store(store.clone())
        .with_priority_channel(channel.clone())
        .with_global_errors(hub.clone());

    let logger = Logger::new(LoggerConfig::default().with_mode(mode), host);
    Harness {
        logger,
        store,
        channel,
        hub,
    }
}
