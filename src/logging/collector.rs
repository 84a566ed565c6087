//! This module provides a `tracing` layer that forwards the host
//! application's `tracing` events into a `Logger`.
use super::entry::{LogLevel, LogValue};
use super::logger::Logger;
use std::collections::BTreeMap;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    Layer,
};

/// A `tracing` layer that records events through a `Logger`.
///
/// Events emitted by this crate (console mirroring, internal diagnostics)
/// are skipped, so the layer can sit next to `TracingConsole` without
/// feeding entries back into themselves.
pub struct LoggerLayer {
    logger: Logger,
}

impl LoggerLayer {
    /// Creates a new `LoggerLayer`.
    ///
    /// # Arguments
    ///
    /// * `logger` - The `Logger` that receives forwarded events.
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    /// Initializes the global `tracing` subscriber with a `LoggerLayer`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the global default subscriber
    /// cannot be set.
    pub fn init_subscriber(logger: Logger) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let subscriber = tracing_subscriber::registry().with(LoggerLayer::new(logger));
        tracing::subscriber::set_global_default(subscriber)?;
        Ok(())
    }
}

fn is_own_target(target: &str) -> bool {
    target == env!("CARGO_CRATE_NAME") || target.starts_with(concat!(env!("CARGO_CRATE_NAME"), "::"))
}

fn map_level(level: &Level) -> LogLevel {
    match *level {
        Level::ERROR => LogLevel::Error,
        Level::WARN => LogLevel::Warn,
        Level::INFO => LogLevel::Info,
        _ => LogLevel::Debug,
    }
}

impl<S> Layer<S> for LoggerLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_own_target(metadata.target()) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut args = Vec::new();
        if !visitor.fields.is_empty() {
            args.push(LogValue::Record(visitor.fields));
        }
        self.logger
            .log(map_level(metadata.level()), visitor.message, args);
    }
}

/// Splits an event into its `message` and the remaining fields.
#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: BTreeMap<String, LogValue>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields
                .insert(field.name().to_string(), format!("{:?}", value).into());
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.insert(field.name().to_string(), value.into());
        }
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        let value = i64::try_from(value)
            .map(LogValue::Int)
            .unwrap_or(LogValue::Float(value as f64));
        self.fields.insert(field.name().to_string(), value);
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.fields.insert(field.name().to_string(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::HostCapabilities;
    use crate::config::LoggerConfig;

    #[test]
    fn forwards_host_events_with_fields() {
        let logger = Logger::new(LoggerConfig::default(), HostCapabilities::detached());
        let subscriber = tracing_subscriber::registry().with(LoggerLayer::new(logger.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "checkout", order = 17, paid = false, "payment slow");
            tracing::trace!(target: "checkout", "polling");
        });

        let logs = logger.get_logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].level, LogLevel::Warn);
        assert_eq!(logs[0].message, "payment slow");
        assert_eq!(
            logs[0].args,
            vec![LogValue::record([
                ("order", LogValue::Int(17)),
                ("paid", LogValue::Bool(false)),
            ])]
        );
        assert_eq!(logs[1].level, LogLevel::Debug);
        assert!(logs[1].args.is_empty());
    }

    #[test]
    fn skips_this_crates_own_events() {
        let logger = Logger::new(LoggerConfig::default(), HostCapabilities::detached());
        let subscriber = tracing_subscriber::registry().with(LoggerLayer::new(logger.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "xc_logger::console", "[INFO] mirrored");
            // The console mirror of this entry must not be recorded again.
            logger.info("direct", vec![]);
        });

        let logs = logger.get_logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].message, "direct");
    }
}
