use crate::logging::entry::{LogEntry, LogLevel};
use tracing::{debug, error, info, warn};

/// The console-equivalent output every accepted entry is mirrored to.
pub trait ConsoleSink: Send + Sync {
    /// Writes one accepted entry. `line` is already tagged with the level,
    /// e.g. `[WARN] disk almost full`.
    fn write(&self, level: LogLevel, line: &str, entry: &LogEntry);
}

/// Mirrors entries as `tracing` events under the `xc_logger::console` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingConsole;

impl ConsoleSink for TracingConsole {
    fn write(&self, level: LogLevel, line: &str, entry: &LogEntry) {
        let args = if entry.args.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&entry.args).unwrap_or_default()
        };
        let error = entry
            .error
            .as_ref()
            .map(|e| format!("{}: {}", e.name, e.message))
            .unwrap_or_default();

        match level {
            LogLevel::Debug => debug!(target: "xc_logger::console", args = %args, "{}", line),
            LogLevel::Info => info!(target: "xc_logger::console", args = %args, "{}", line),
            LogLevel::Warn => warn!(target: "xc_logger::console", args = %args, "{}", line),
            LogLevel::Error => {
                error!(target: "xc_logger::console", args = %args, error = %error, "{}", line)
            }
        }
    }
}
