//! This module contains the logger core.
//!
//! It includes the entry model, the bounded buffer, the persisted trailing
//! window, the error reporter, the global error hooks, the `Logger` facade
//! and a `tracing` layer that feeds host events into it.
pub mod buffer;
pub mod collector;
pub mod entry;
mod hooks;
pub mod logger;
pub mod persistence;
pub mod reporter;

pub use buffer::LogBuffer;
pub use collector::LoggerLayer;
pub use entry::{ErrorArg, ErrorInfo, LogEntry, LogLevel, LogValue};
pub use hooks::{REJECTION_MESSAGE, UNCAUGHT_MESSAGE};
pub use logger::{global, init, Logger, WeakLogger};
pub use persistence::PersistenceSink;
pub use reporter::{Dispatch, ErrorReporter};
