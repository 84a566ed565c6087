//! Client-side log capture.
//!
//! `Logger` records entries at four severities into a bounded in-memory
//! buffer, mirrors the most recent ones to a persistent key-value store,
//! captures uncaught errors and unhandled rejections from a global error
//! source, and in production reports `ERROR` entries to a remote collector
//! without waiting on the result.
//!
//! ```no_run
//! use xc_logger::{init, HostCapabilities, LoggerConfig, LogValue};
//!
//! let logger = init(LoggerConfig::default(), HostCapabilities::detached());
//! logger.info("course saved", vec![LogValue::from(42)]);
//! logger.error("upload failed", Some("network down".into()), vec![]);
//! println!("{}", logger.export_logs());
//! ```
pub mod adapters;
pub mod config;
pub mod error;
pub mod logging;

pub use adapters::HostCapabilities;
pub use config::{LoggerConfig, RuntimeMode};
pub use error::{LoggerError, ParseLevelError};
pub use logging::{
    global, init, ErrorArg, ErrorInfo, LogEntry, LogLevel, LogValue, Logger, LoggerLayer,
};
