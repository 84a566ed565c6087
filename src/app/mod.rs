pub mod args;
mod setup;

pub use args::AppArgs;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use xc_logger::{LogLevel, Logger};

pub async fn launch() -> Result<()> {
    launch_with_args(AppArgs::from_cli()).await
}

pub async fn launch_with_args(args: AppArgs) -> Result<()> {
    let setup::PreparedApp {
        args,
        logger,
        store,
        beacons,
    } = setup::prepare(args)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut captured = 0usize;
    while let Some(line) = lines.next_line().await? {
        if record_line(logger, &line) {
            captured += 1;
        }
    }
    info!("Read {} lines, {} entries in buffer", captured, logger.len());

    if args.export {
        println!("{}", logger.export_logs());
    }
    if args.show_persisted {
        println!(
            "{}",
            serde_json::to_string_pretty(&logger.persisted_logs())?
        );
    }
    if args.clear {
        logger.clear_logs();
    }

    if let Some(queue) = beacons {
        queue.shutdown().await;
    }
    store.flush()?;
    Ok(())
}

/// Logs one input line of the form `[LEVEL] message`. Lines without a
/// recognised level are logged at `INFO`. Blank lines are skipped.
fn record_line(logger: &Logger, line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return false;
    }

    let (level, message) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => match head.trim_matches(|c| c == '[' || c == ']').parse::<LogLevel>() {
            Ok(level) => (level, rest.trim()),
            Err(_) => (LogLevel::Info, line),
        },
        None => (LogLevel::Info, line),
    };

    logger.log(level, message, vec![]);
    true
}
