//! Subscriptions that turn global failure notifications into `ERROR` entries.
use super::entry::{ErrorArg, ErrorInfo, LogValue};
use super::logger::Logger;
use crate::adapters::{GlobalErrorSource, UncaughtError, UnhandledRejection};

pub const UNCAUGHT_MESSAGE: &str = "global uncaught error";
pub const REJECTION_MESSAGE: &str = "unhandled rejection";

/// Subscribes `logger` to both notification kinds of `source`.
///
/// The subscriptions hold a weak handle, so they never keep a dropped
/// logger alive and become no-ops once it is gone.
pub(crate) fn install(source: &dyn GlobalErrorSource, logger: &Logger) {
    let weak = logger.downgrade();
    source.on_uncaught_error(Box::new(move |event: &UncaughtError| {
        if let Some(logger) = weak.upgrade() {
            logger.error(
                UNCAUGHT_MESSAGE,
                event.error.clone(),
                vec![uncaught_context(event)],
            );
        }
    }));

    let weak = logger.downgrade();
    source.on_unhandled_rejection(Box::new(move |event: &UnhandledRejection| {
        if let Some(logger) = weak.upgrade() {
            logger.error(
                REJECTION_MESSAGE,
                Some(ErrorArg::Error(ErrorInfo::new(
                    "Error",
                    event.reason.to_string(),
                ))),
                vec![LogValue::record([("reason", event.reason.clone())])],
            );
        }
    }));
}

fn uncaught_context(event: &UncaughtError) -> LogValue {
    LogValue::record([
        ("message", LogValue::from(event.message.as_str())),
        ("filename", LogValue::from(event.filename.as_str())),
        ("line", LogValue::from(event.line)),
        ("column", LogValue::from(event.column)),
    ])
}
