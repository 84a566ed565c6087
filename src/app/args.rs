use clap::Parser;
use xc_logger::LogLevel;

#[derive(Parser, Debug, Clone)]
#[command(name = "xc-logger")]
#[command(about = "Captures log lines from stdin with bounded retention and error reporting")]
pub struct AppArgs {
    #[arg(long, default_value = "data", help = "Data directory for the persisted log snapshot")]
    pub data_dir: String,

    #[arg(
        long,
        help = "Collector base URL errors are reported to (or set XC_COLLECTOR_URL)"
    )]
    pub collector: Option<String>,

    #[arg(long, help = "Run in production mode (or set APP_ENV=production)")]
    pub production: bool,

    #[arg(long, help = "Minimum level to record (or set XC_LOG_LEVEL)")]
    pub level: Option<LogLevel>,

    #[arg(long, help = "Page URL stamped onto every entry")]
    pub url: Option<String>,

    #[arg(long, help = "Print the captured logs as JSON on exit")]
    pub export: bool,

    #[arg(long, help = "Print the persisted snapshot on exit")]
    pub show_persisted: bool,

    #[arg(long, help = "Clear the logs and the persisted snapshot on exit")]
    pub clear: bool,

    #[arg(long, help = "Report panics as uncaught errors")]
    pub capture_panics: bool,
}

impl AppArgs {
    pub fn from_cli() -> Self {
        <Self as Parser>::parse()
    }
}
