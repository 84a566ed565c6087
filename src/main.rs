//! The main entry point for the xc-logger command.
mod app;

use anyhow::Result;

/// The main function of the application.
///
/// Reads log lines from stdin and records them through the process-wide
/// logger, configured from command-line arguments and the environment.
///
/// # Errors
///
/// Returns an error if setup fails or stdin cannot be read.
#[tokio::main]
async fn main() -> Result<()> {
    app::launch().await
}
