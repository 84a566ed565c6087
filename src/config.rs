//! Logger configuration and the runtime mode toggle.
use crate::logging::entry::LogLevel;
use crate::error::LoggerError;

/// Key under which the trailing window of entries is persisted.
pub const DEFAULT_STORAGE_KEY: &str = "xc_app_logs";
/// Collector path that receives reported errors.
pub const DEFAULT_REPORT_PATH: &str = "/api/log/frontend-error";
pub const DEFAULT_MAX_LOGS: usize = 1000;
pub const DEFAULT_PERSIST_WINDOW: usize = 100;

const MODE_ENV: &str = "APP_ENV";
const LEVEL_ENV: &str = "XC_LOG_LEVEL";

/// Distinguishes production runs, where errors are reported remotely, from
/// everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeMode {
    Production,
    #[default]
    Development,
}

impl RuntimeMode {
    /// Reads `APP_ENV`; only the value `production` selects production mode.
    pub fn from_env() -> Self {
        Self::from_value(std::env::var(MODE_ENV).ok().as_deref())
    }

    pub fn from_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("production") => RuntimeMode::Production,
            _ => RuntimeMode::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, RuntimeMode::Production)
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Initial severity threshold.
    pub min_level: LogLevel,
    /// Capacity of the in-memory buffer.
    pub max_logs: usize,
    /// Number of most recent entries mirrored to storage.
    pub persist_window: usize,
    pub storage_key: String,
    pub report_path: String,
    pub mode: RuntimeMode,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Debug,
            max_logs: DEFAULT_MAX_LOGS,
            persist_window: DEFAULT_PERSIST_WINDOW,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            report_path: DEFAULT_REPORT_PATH.to_string(),
            mode: RuntimeMode::Development,
        }
    }
}

impl LoggerConfig {
    /// Builds the default configuration with `APP_ENV` and `XC_LOG_LEVEL`
    /// applied.
    ///
    /// # Errors
    ///
    /// Returns an error if `XC_LOG_LEVEL` is set to an unknown level.
    pub fn from_env() -> Result<Self, LoggerError> {
        let mut config = Self {
            mode: RuntimeMode::from_env(),
            ..Self::default()
        };
        if let Ok(level) = std::env::var(LEVEL_ENV) {
            config.min_level = level.parse()?;
        }
        Ok(config)
    }

    pub fn with_mode(mut self, mode: RuntimeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_production_enables_reporting() {
        assert_eq!(
            RuntimeMode::from_value(Some("production")),
            RuntimeMode::Production
        );
        assert_eq!(
            RuntimeMode::from_value(Some(" Production ")),
            RuntimeMode::Production
        );
        assert_eq!(
            RuntimeMode::from_value(Some("staging")),
            RuntimeMode::Development
        );
        assert_eq!(RuntimeMode::from_value(None), RuntimeMode::Development);
    }

    #[test]
    fn defaults_match_browser_logger() {
        let config = LoggerConfig::default();
        assert_eq!(config.max_logs, 1000);
        assert_eq!(config.persist_window, 100);
        assert_eq!(config.storage_key, "xc_app_logs");
        assert_eq!(config.report_path, "/api/log/frontend-error");
        assert_eq!(config.min_level, LogLevel::Debug);
        assert!(!config.mode.is_production());
    }
}
