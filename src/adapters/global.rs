//! This module provides the sources of "uncaught error" and "unhandled
//! rejection" notifications.
//!
//! `GlobalErrorHub` is the native source. Uncaught errors come from panics
//! (once `install_panic_hook` is called) or explicit `emit_uncaught` calls;
//! unhandled rejections come from watched tasks that end in `Err` or
//! explicit `emit_rejection` calls.
use crate::logging::entry::{ErrorArg, ErrorInfo, LogValue};
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::warn;

/// A runtime error nobody caught.
#[derive(Debug, Clone, PartialEq)]
pub struct UncaughtError {
    pub message: String,
    pub filename: String,
    pub line: u32,
    pub column: u32,
    /// The thrown value, when the host could recover it.
    pub error: Option<ErrorArg>,
}

/// An asynchronous operation that failed without anyone observing it.
#[derive(Debug, Clone, PartialEq)]
pub struct UnhandledRejection {
    pub reason: LogValue,
}

pub type UncaughtHandler = Box<dyn Fn(&UncaughtError) + Send + Sync>;
pub type RejectionHandler = Box<dyn Fn(&UnhandledRejection) + Send + Sync>;

/// A host facility that notifies subscribers about uncaught failures.
pub trait GlobalErrorSource: Send + Sync {
    fn on_uncaught_error(&self, handler: UncaughtHandler);
    fn on_unhandled_rejection(&self, handler: RejectionHandler);
}

/// The native `GlobalErrorSource`.
#[derive(Default)]
pub struct GlobalErrorHub {
    uncaught: Mutex<Vec<Arc<dyn Fn(&UncaughtError) + Send + Sync>>>,
    rejections: Mutex<Vec<Arc<dyn Fn(&UnhandledRejection) + Send + Sync>>>,
    panic_hook_installed: AtomicBool,
}

impl GlobalErrorHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Notifies every uncaught-error subscriber.
    ///
    /// A subscriber that panics is isolated from the others and from the
    /// caller.
    pub fn emit_uncaught(&self, event: UncaughtError) {
        let handlers = self
            .uncaught
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for handler in handlers {
            if panic::catch_unwind(AssertUnwindSafe(|| handler(&event))).is_err() {
                warn!("Uncaught-error subscriber panicked");
            }
        }
    }

    /// Notifies every unhandled-rejection subscriber.
    pub fn emit_rejection(&self, reason: impl Into<LogValue>) {
        let event = UnhandledRejection {
            reason: reason.into(),
        };
        let handlers = self
            .rejections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for handler in handlers {
            if panic::catch_unwind(AssertUnwindSafe(|| handler(&event))).is_err() {
                warn!("Rejection subscriber panicked");
            }
        }
    }

    /// Reports every panic as an uncaught error, then defers to the
    /// previously installed hook. Only the first call installs anything.
    pub fn install_panic_hook(self: &Arc<Self>) {
        if self.panic_hook_installed.swap(true, Ordering::SeqCst) {
            return;
        }

        let hub = Arc::clone(self);
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let payload = info.payload();
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "Box<dyn Any>".to_string());
            let (filename, line, column) = info
                .location()
                .map(|loc| (loc.file().to_string(), loc.line(), loc.column()))
                .unwrap_or_default();
            let thread = std::thread::current()
                .name()
                .map(|name| format!("thread '{}'", name))
                .unwrap_or_else(|| "unnamed thread".to_string());

            hub.emit_uncaught(UncaughtError {
                error: Some(ErrorArg::Error(
                    ErrorInfo::new("Panic", message.clone())
                        .with_stack(format!("at {}:{}:{} ({})", filename, line, column, thread)),
                )),
                message,
                filename,
                line,
                column,
            });

            previous(info);
        }));
    }

    /// Watches a spawned task and reports it as an unhandled rejection if it
    /// ends in `Err`. Panics are reported here too unless the panic hook is
    /// installed, which already reports them as uncaught errors.
    pub fn watch_task<T, E>(self: &Arc<Self>, task: JoinHandle<Result<T, E>>) -> JoinHandle<()>
    where
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let hub = Arc::clone(self);
        tokio::spawn(async move {
            match task.await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => hub.emit_rejection(e.to_string()),
                Err(join_error) if join_error.is_panic() => {
                    if !hub.panic_hook_installed.load(Ordering::SeqCst) {
                        hub.emit_rejection(join_error.to_string());
                    }
                }
                Err(_) => {}
            }
        })
    }
}

impl GlobalErrorSource for GlobalErrorHub {
    fn on_uncaught_error(&self, handler: UncaughtHandler) {
        self.uncaught
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::from(handler));
    }

    fn on_unhandled_rejection(&self, handler: RejectionHandler) {
        self.rejections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::from(handler));
    }
}
