//! Logging bootstrap for the CLI and native embedders.
//!
//! The library itself only emits `tracing` events and spans; nothing is
//! printed unless a subscriber is installed. [`init_logging`] installs a
//! `tracing-subscriber` fmt layer writing to stderr.
//!
//! The filter comes from the explicit level, then `SCHEMABRIDGE_LOG`, then
//! `RUST_LOG`, then `warn`. Directives use the usual syntax:
//!
//! ```bash
//! SCHEMABRIDGE_LOG="schemabridge::sql=trace" schemabridge schema.sql
//! ```
//!
//! On wasm32 there is no subscriber; the call is a no-op.

use std::fmt;
use std::str::FromStr;

#[cfg(not(target_arch = "wasm32"))]
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self as sub_fmt, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Environment variable consulted before `RUST_LOG`.
pub const LOG_ENV: &str = "SCHEMABRIDGE_LOG";

const DEFAULT_FILTER: &str = "warn";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Unknown log format: {0} (expected one of: {expected})", expected = LogFormat::variants().join(", "))]
    UnknownFormat(String),
    #[error("Invalid log filter \"{filter}\": {reason}")]
    InvalidFilter { filter: String, reason: String },
    #[error("Could not install log subscriber: {0}")]
    Install(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Single line per event.
    #[default]
    Compact,
    /// Multi-line with source locations.
    Pretty,
}

impl LogFormat {
    pub fn variants() -> &'static [&'static str] {
        &["compact", "pretty"]
    }
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            _ => Err(LoggingError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
        })
    }
}

/// Pick the filter directive string: explicit level first, then the
/// environment, then `warn`.
pub fn filter_directive(level: Option<&str>) -> String {
    level
        .map(str::to_string)
        .or_else(|| std::env::var(LOG_ENV).ok())
        .or_else(|| std::env::var("RUST_LOG").ok())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Install the global subscriber.
///
/// Fails if the filter does not parse or a subscriber is already set.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging(level: Option<&str>, format: LogFormat) -> Result<(), LoggingError> {
    let directive = filter_directive(level);
    let filter = EnvFilter::try_new(&directive).map_err(|e| LoggingError::InvalidFilter {
        filter: directive.clone(),
        reason: e.to_string(),
    })?;

    let installed = match format {
        LogFormat::Compact => Registry::default()
            .with(filter)
            .with(
                sub_fmt::Layer::default()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_level(true)
                    .with_span_events(FmtSpan::NONE)
                    .compact(),
            )
            .try_init(),
        LogFormat::Pretty => Registry::default()
            .with(filter)
            .with(
                sub_fmt::Layer::default()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::ACTIVE)
                    .pretty(),
            )
            .try_init(),
    };
    installed.map_err(|e| LoggingError::Install(e.to_string()))
}

#[cfg(target_arch = "wasm32")]
pub fn init_logging(level: Option<&str>, format: LogFormat) -> Result<(), LoggingError> {
    let _ = (level, format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert_eq!("PRETTY".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!(matches!(
            "json".parse::<LogFormat>(),
            Err(LoggingError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_log_format_display_matches_variants() {
        let names: Vec<String> = [LogFormat::Compact, LogFormat::Pretty]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, LogFormat::variants());
    }

    #[test]
    fn test_unknown_format_lists_variants() {
        let err = "json".parse::<LogFormat>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown log format: json (expected one of: compact, pretty)"
        );
    }

    #[test]
    fn test_explicit_level_wins() {
        assert_eq!(filter_directive(Some("debug")), "debug");
    }

    #[test]
    fn test_invalid_filter_is_reported() {
        let result = init_logging(Some("schemabridge=notalevel"), LogFormat::Compact);
        assert!(matches!(result, Err(LoggingError::InvalidFilter { .. })));
    }
}
