//! This module defines the capability interfaces over host facilities and
//! their native implementations.
//!
//! The logger core only talks to these traits, so a test can hand it fakes
//! instead of a real store, network or panic hook.
pub mod clock;
pub mod console;
pub mod global;
pub mod page;
pub mod storage;
pub mod transport;

pub use clock::{Clock, SystemClock};
pub use console::{ConsoleSink, TracingConsole};
pub use global::{
    GlobalErrorHub, GlobalErrorSource, RejectionHandler, UncaughtError, UncaughtHandler,
    UnhandledRejection,
};
pub use page::{PageInfo, StaticPageInfo};
pub use storage::{KeyValueStore, MemoryKeyValueStore, SledKeyValueStore};
pub use transport::{Beacon, BeaconQueue, KeepaliveClient, PriorityChannel, ReqwestKeepalive};

use std::sync::Arc;

/// The host facilities a `Logger` is built on.
#[derive(Clone)]
pub struct HostCapabilities {
    pub clock: Arc<dyn Clock>,
    pub page: Arc<dyn PageInfo>,
    pub store: Arc<dyn KeyValueStore>,
    pub console: Arc<dyn ConsoleSink>,
    /// Preferred delivery mechanism, when the host offers one.
    pub priority_channel: Option<Arc<dyn PriorityChannel>>,
    /// Fallback delivery mechanism.
    pub keepalive: Option<Arc<dyn KeepaliveClient>>,
    pub global_errors: Option<Arc<dyn GlobalErrorSource>>,
}

impl HostCapabilities {
    /// In-memory storage, no delivery, no global error source.
    pub fn detached() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            page: Arc::new(StaticPageInfo::default()),
            store: Arc::new(MemoryKeyValueStore::new()),
            console: Arc::new(TracingConsole),
            priority_channel: None,
            keepalive: None,
            global_errors: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_page(mut self, page: Arc<dyn PageInfo>) -> Self {
        self.page = page;
        self
    }

    pub fn with_console(mut self, console: Arc<dyn ConsoleSink>) -> Self {
        self.console = console;
        self
    }

    pub fn with_priority_channel(mut self, channel: Arc<dyn PriorityChannel>) -> Self {
        self.priority_channel = Some(channel);
        self
    }

    pub fn with_keepalive(mut self, client: Arc<dyn KeepaliveClient>) -> Self {
        self.keepalive = Some(client);
        self
    }

    pub fn with_global_errors(mut self, source: Arc<dyn GlobalErrorSource>) -> Self {
        self.global_errors = Some(source);
        self
    }
}
