//! This module defines the records captured by the logger: severity levels,
//! loggable values, normalized error details and the log entry itself.
use crate::error::ParseLevelError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The severity of a log entry.
///
/// Levels are totally ordered `Debug < Info < Warn < Error`, and the numeric
/// discriminants are part of the public contract.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum LogLevel {
    #[default]
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    /// Returns the upper-case name used in serialized entries and console tags.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" | "0" => Ok(LogLevel::Debug),
            "INFO" | "1" => Ok(LogLevel::Info),
            "WARN" | "WARNING" | "2" => Ok(LogLevel::Warn),
            "ERROR" | "3" => Ok(LogLevel::Error),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// A loggable value attached to an entry as an extra argument.
///
/// Serialized as plain JSON, so records and lists nest the same way they
/// would in a browser console payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<LogValue>),
    Record(BTreeMap<String, LogValue>),
}

impl LogValue {
    /// Builds a `Record` from key/value pairs.
    pub fn record<K, V, I>(fields: I) -> Self
    where
        K: Into<String>,
        V: Into<LogValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        LogValue::Record(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Display for LogValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogValue::Text(text) => f.write_str(text),
            other => match serde_json::to_string(other) {
                Ok(json) => f.write_str(&json),
                Err(_) => f.write_str("null"),
            },
        }
    }
}

impl From<bool> for LogValue {
    fn from(value: bool) -> Self {
        LogValue::Bool(value)
    }
}

impl From<i32> for LogValue {
    fn from(value: i32) -> Self {
        LogValue::Int(value.into())
    }
}

impl From<i64> for LogValue {
    fn from(value: i64) -> Self {
        LogValue::Int(value)
    }
}

impl From<u32> for LogValue {
    fn from(value: u32) -> Self {
        LogValue::Int(value.into())
    }
}

impl From<f64> for LogValue {
    fn from(value: f64) -> Self {
        LogValue::Float(value)
    }
}

impl From<&str> for LogValue {
    fn from(value: &str) -> Self {
        LogValue::Text(value.to_string())
    }
}

impl From<String> for LogValue {
    fn from(value: String) -> Self {
        LogValue::Text(value)
    }
}

impl<T: Into<LogValue>> From<Option<T>> for LogValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(LogValue::Null)
    }
}

impl<T: Into<LogValue>> From<Vec<T>> for LogValue {
    fn from(value: Vec<T>) -> Self {
        LogValue::List(value.into_iter().map(Into::into).collect())
    }
}

/// Normalized details of an error attached to an `ERROR` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorInfo {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Captures a concrete error: the short type name becomes `name`, the
    /// display form becomes `message`, and the source chain (if any) becomes
    /// `stack`.
    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        let full = std::any::type_name::<E>();
        let name = full
            .split('<')
            .next()
            .and_then(|path| path.rsplit("::").next())
            .filter(|name| !name.is_empty() && *name != "dyn Error")
            .unwrap_or("Error");

        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(format!("caused by: {}", cause));
            source = cause.source();
        }

        Self {
            name: name.to_string(),
            message: err.to_string(),
            stack: (!chain.is_empty()).then(|| chain.join("\n")),
        }
    }
}

impl From<&anyhow::Error> for ErrorInfo {
    fn from(err: &anyhow::Error) -> Self {
        let rendered = format!("{:?}", err);
        let message = err.to_string();
        Self {
            name: "Error".to_string(),
            stack: (rendered != message).then_some(rendered),
            message,
        }
    }
}

/// The second argument of `Logger::error`, before normalization.
///
/// Callers may hand over something error-shaped or any other value; both
/// collapse into an `ErrorInfo` when the entry is built.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorArg {
    Error(ErrorInfo),
    Value(LogValue),
}

impl ErrorArg {
    /// Normalizes into the `error` field of a `LogEntry`. A blank message
    /// falls back to the error's name.
    pub fn normalize(self) -> ErrorInfo {
        match self {
            ErrorArg::Error(mut info) => {
                if info.name.is_empty() {
                    info.name = "Error".to_string();
                }
                if info.message.is_empty() {
                    info.message = info.name.clone();
                }
                info
            }
            ErrorArg::Value(value) => ErrorInfo::new("Error", value.to_string()),
        }
    }
}

impl From<ErrorInfo> for ErrorArg {
    fn from(info: ErrorInfo) -> Self {
        ErrorArg::Error(info)
    }
}

impl From<LogValue> for ErrorArg {
    fn from(value: LogValue) -> Self {
        ErrorArg::Value(value)
    }
}

impl From<&str> for ErrorArg {
    fn from(value: &str) -> Self {
        ErrorArg::Value(value.into())
    }
}

impl From<String> for ErrorArg {
    fn from(value: String) -> Self {
        ErrorArg::Value(value.into())
    }
}

impl From<anyhow::Error> for ErrorArg {
    fn from(err: anyhow::Error) -> Self {
        ErrorArg::Error(ErrorInfo::from(&err))
    }
}

impl From<&anyhow::Error> for ErrorArg {
    fn from(err: &anyhow::Error) -> Self {
        ErrorArg::Error(ErrorInfo::from(err))
    }
}

/// Represents a single accepted log call.
///
/// Entries are never modified once they enter the buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// When the call was accepted.
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Extra arguments, in call order.
    pub args: Vec<LogValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    /// Page location at the time of the call.
    pub url: String,
    pub user_agent: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("disk on fire")]
    struct DiskError {
        #[source]
        source: std::io::Error,
    }

    #[test]
    fn levels_are_ordered_and_parse() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert_eq!(LogLevel::Warn as u8, 2);
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!(" ERROR ".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::from_u8(1), LogLevel::Info);
    }

    #[test]
    fn value_text_form() {
        assert_eq!(LogValue::from("plain").to_string(), "plain");
        assert_eq!(LogValue::from(42).to_string(), "42");
        let record = LogValue::record([("a", LogValue::from(1)), ("b", LogValue::Null)]);
        assert_eq!(record.to_string(), r#"{"a":1,"b":null}"#);
    }

    #[test]
    fn values_deserialize_into_matching_variants() {
        let parsed: Vec<LogValue> =
            serde_json::from_str(r#"[null, true, 7, 1.5, "x", [1], {"k": "v"}]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                LogValue::Null,
                LogValue::Bool(true),
                LogValue::Int(7),
                LogValue::Float(1.5),
                LogValue::Text("x".into()),
                LogValue::List(vec![LogValue::Int(1)]),
                LogValue::record([("k", "v")]),
            ]
        );
    }

    #[test]
    fn non_error_values_normalize_to_their_text_form() {
        let info = ErrorArg::from("socket closed").normalize();
        assert_eq!(info, ErrorInfo::new("Error", "socket closed"));

        let info = ErrorArg::Value(LogValue::from(404)).normalize();
        assert_eq!(info.message, "404");
        assert_eq!(info.stack, None);
    }

    #[test]
    fn blank_error_names_default_to_error() {
        let info = ErrorArg::Error(ErrorInfo::new("", "x")).normalize();
        assert_eq!(info.name, "Error");
    }

    #[test]
    fn blank_error_messages_fall_back_to_the_name() {
        let info = ErrorArg::Error(ErrorInfo::new("TimeoutError", "")).normalize();
        assert_eq!(info.message, "TimeoutError");

        let info = ErrorArg::Error(ErrorInfo::new("", "")).normalize();
        assert_eq!(info, ErrorInfo::new("Error", "Error"));
        assert_eq!(LogLevel::default(), LogLevel::Debug);
    }

    #[test]
    fn std_errors_keep_type_name_and_source_chain() {
        let err = DiskError {
            source: std::io::Error::new(std::io::ErrorKind::Other, "no space"),
        };
        let info = ErrorInfo::from_error(&err);
        assert_eq!(info.name, "DiskError");
        assert_eq!(info.message, "disk on fire");
        assert_eq!(info.stack.as_deref(), Some("caused by: no space"));
    }

    #[test]
    fn anyhow_errors_render_context_as_stack() {
        let err = anyhow::anyhow!("inner").context("outer");
        let info = ErrorInfo::from(&err);
        assert_eq!(info.message, "outer");
        assert!(info.stack.unwrap().contains("inner"));
    }

    #[test]
    fn entry_uses_browser_field_names() {
        let entry = LogEntry {
            timestamp: Utc::now(),
            level: LogLevel::Warn,
            message: "m".into(),
            args: vec![],
            error: None,
            url: "app://index".into(),
            user_agent: "ua".into(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["level"], "WARN");
        assert_eq!(json["userAgent"], "ua");
        assert!(json.get("error").is_none());
    }
}
