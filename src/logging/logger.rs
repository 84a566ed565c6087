//! This module provides the `Logger` facade and the process-wide instance.
//!
//! Every accepted call runs synchronously: the entry is built, appended to
//! the buffer, the trailing window is persisted, and the entry is mirrored
//! to the console sink before the call returns. Only the remote report of an
//! `ERROR` entry in production runs in the background.
use super::buffer::LogBuffer;
use super::entry::{ErrorArg, ErrorInfo, LogEntry, LogLevel, LogValue};
use super::hooks;
use super::persistence::PersistenceSink;
use super::reporter::ErrorReporter;
use crate::adapters::{Clock, ConsoleSink, HostCapabilities, PageInfo};
use crate::config::LoggerConfig;
use chrono::Utc;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};
use tracing::debug;

static GLOBAL: OnceLock<Logger> = OnceLock::new();

/// Returns the process-wide logger, creating it on first use.
///
/// Only the first call's `config` and `host` are used; later calls return
/// the same instance and drop their arguments.
pub fn init(config: LoggerConfig, host: HostCapabilities) -> &'static Logger {
    GLOBAL.get_or_init(|| Logger::new(config, host))
}

/// Returns the process-wide logger if `init` has run.
pub fn global() -> Option<&'static Logger> {
    GLOBAL.get()
}

thread_local! {
    static RECORDING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as inside a log call, so anything the call
/// triggers on the same thread (a panicking adapter feeding the panic hook,
/// a console sink that logs) is dropped instead of recursing.
struct RecordingGuard;

impl RecordingGuard {
    fn enter() -> Option<Self> {
        RECORDING.with(|flag| {
            if flag.get() {
                None
            } else {
                flag.set(true);
                Some(RecordingGuard)
            }
        })
    }
}

impl Drop for RecordingGuard {
    fn drop(&mut self) {
        RECORDING.with(|flag| flag.set(false));
    }
}

struct Inner {
    threshold: AtomicU8,
    buffer: Mutex<LogBuffer>,
    persistence: PersistenceSink,
    reporter: ErrorReporter,
    production: bool,
    clock: Arc<dyn Clock>,
    page: Arc<dyn PageInfo>,
    console: Arc<dyn ConsoleSink>,
}

/// The logging facade.
///
/// `Logger` is a cheap handle; clones share the same buffer and threshold.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

/// A non-owning `Logger` handle.
#[derive(Clone)]
pub struct WeakLogger {
    inner: Weak<Inner>,
}

impl WeakLogger {
    pub fn upgrade(&self) -> Option<Logger> {
        self.inner.upgrade().map(|inner| Logger { inner })
    }
}

impl Logger {
    /// Creates a logger on top of `host` and subscribes it to the host's
    /// global error source, if there is one.
    pub fn new(config: LoggerConfig, host: HostCapabilities) -> Self {
        let persistence = PersistenceSink::new(
            host.store.clone(),
            config.storage_key.clone(),
            config.persist_window,
        );
        let reporter = ErrorReporter::new(
            config.report_path.clone(),
            host.priority_channel.clone(),
            host.keepalive.clone(),
        );

        let logger = Self {
            inner: Arc::new(Inner {
                threshold: AtomicU8::new(config.min_level as u8),
                buffer: Mutex::new(LogBuffer::new(config.max_logs)),
                persistence,
                reporter,
                production: config.mode.is_production(),
                clock: host.clock,
                page: host.page,
                console: host.console,
            }),
        };

        if let Some(source) = host.global_errors {
            hooks::install(source.as_ref(), &logger);
        }

        logger
    }

    pub fn downgrade(&self) -> WeakLogger {
        WeakLogger {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Sets the minimum severity that will be recorded.
    pub fn set_log_level(&self, level: LogLevel) {
        self.inner.threshold.store(level as u8, Ordering::SeqCst);
    }

    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_u8(self.inner.threshold.load(Ordering::SeqCst))
    }

    pub fn debug(&self, message: impl Into<String>, args: Vec<LogValue>) {
        self.emit(LogLevel::Debug, message.into(), args, None);
    }

    pub fn info(&self, message: impl Into<String>, args: Vec<LogValue>) {
        self.emit(LogLevel::Info, message.into(), args, None);
    }

    pub fn warn(&self, message: impl Into<String>, args: Vec<LogValue>) {
        self.emit(LogLevel::Warn, message.into(), args, None);
    }

    /// Records an `ERROR` entry, normalizing `error` into the entry's error
    /// details. In production mode the entry is also reported to the
    /// collector.
    pub fn error(&self, message: impl Into<String>, error: Option<ErrorArg>, args: Vec<LogValue>) {
        self.emit(
            LogLevel::Error,
            message.into(),
            args,
            error.map(ErrorArg::normalize),
        );
    }

    /// Records an entry at `level`. `ERROR` behaves like `error` without
    /// error details.
    pub fn log(&self, level: LogLevel, message: impl Into<String>, args: Vec<LogValue>) {
        self.emit(level, message.into(), args, None);
    }

    /// Returns a copy of the buffer, oldest entry first.
    pub fn get_logs(&self) -> Vec<LogEntry> {
        self.lock_buffer().snapshot()
    }

    pub fn len(&self) -> usize {
        self.lock_buffer().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_buffer().is_empty()
    }

    /// Empties the buffer and removes the persisted snapshot.
    pub fn clear_logs(&self) {
        let _guard = RecordingGuard::enter();
        let mut buffer = self.lock_buffer();
        buffer.clear();
        if panic::catch_unwind(AssertUnwindSafe(|| self.inner.persistence.clear())).is_err() {
            debug!("Log snapshot remover panicked");
        }
    }

    /// Serializes the whole buffer as pretty-printed JSON.
    pub fn export_logs(&self) -> String {
        let logs = self.get_logs();
        serde_json::to_string_pretty(&logs).unwrap_or_else(|e| {
            debug!("Log export failed: {}", e);
            "[]".to_string()
        })
    }

    /// Reads back the persisted snapshot. Returns an empty list if it is
    /// missing or unreadable.
    pub fn persisted_logs(&self) -> Vec<LogEntry> {
        let _guard = RecordingGuard::enter();
        match panic::catch_unwind(AssertUnwindSafe(|| self.inner.persistence.load())) {
            Ok(Ok(entries)) => entries,
            Ok(Err(e)) => {
                debug!("Persisted logs unreadable: {}", e);
                Vec::new()
            }
            Err(_) => {
                debug!("Log snapshot reader panicked");
                Vec::new()
            }
        }
    }

    fn lock_buffer(&self) -> MutexGuard<'_, LogBuffer> {
        self.inner
            .buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, level: LogLevel, message: String, args: Vec<LogValue>, error: Option<ErrorInfo>) {
        if level < self.log_level() {
            return;
        }
        let Some(_guard) = RecordingGuard::enter() else {
            return;
        };

        let inner = &self.inner;
        let entry = LogEntry {
            timestamp: guarded("clock", || inner.clock.now()).unwrap_or_else(Utc::now),
            level,
            message,
            args,
            error,
            url: guarded("page url", || inner.page.url()).unwrap_or_default(),
            user_agent: guarded("user agent", || inner.page.user_agent()).unwrap_or_default(),
        };

        {
            let mut buffer = self.lock_buffer();
            buffer.append(entry.clone());
            if panic::catch_unwind(AssertUnwindSafe(|| inner.persistence.save(&buffer))).is_err() {
                debug!("Log snapshot writer panicked");
            }
        }

        let line = format!("[{}] {}", level, entry.message);
        if panic::catch_unwind(AssertUnwindSafe(|| inner.console.write(level, &line, &entry))).is_err() {
            debug!("Console sink panicked");
        }

        if level == LogLevel::Error && inner.production {
            if panic::catch_unwind(AssertUnwindSafe(|| inner.reporter.send(&entry))).is_err() {
                debug!("Error reporter panicked");
            }
        }
    }
}

/// Runs an adapter read, turning a panic into `None`.
fn guarded<T>(what: &str, read: impl FnOnce() -> T) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(read)) {
        Ok(value) => Some(value),
        Err(_) => {
            debug!("{} adapter panicked", what);
            None
        }
    }
}
