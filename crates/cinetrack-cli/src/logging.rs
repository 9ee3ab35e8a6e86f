use anyhow::Result;
use cinetrack_config::LoggingConfig;
use std::io;
use std::io::IsTerminal;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Filter directive for the given verbosity; `None` defers to RUST_LOG or the config level
fn filter_directive(verbose_level: u8, quiet: bool) -> Option<&'static str> {
    if quiet {
        return Some("error");
    }
    match verbose_level {
        0 => None,
        // -v: debug, but keep the HTTP client's connection chatter out
        1 => Some("debug,hyper::proto::h1=warn,hyper::client::pool=warn,reqwest::connect=info"),
        _ => Some("trace"),
    }
}

fn use_json(config: &LoggingConfig) -> bool {
    std::env::var("RUST_LOG_JSON")
        .map(|v| v == "true")
        .ok()
        .or(config.json)
        .unwrap_or_else(|| !io::stderr().is_terminal())
}

/// Rotation prefix for a log path, e.g. "cinetrack" for "cinetrack.log"
fn rotation_prefix(file_name: &str) -> &str {
    file_name.rsplitn(2, '.').nth(1).unwrap_or(file_name)
}

pub fn init_logging(verbose_level: u8, quiet: bool, config: &LoggingConfig) -> Result<()> {
    let filter = match filter_directive(verbose_level, quiet) {
        Some("error") => EnvFilter::new("error"),
        Some(directive) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive)),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level)),
    };

    let json = use_json(config);
    let registry = Registry::default().with(filter);

    match config.file.as_deref() {
        Some(log_path) => {
            let file_appender = rolling_appender(log_path)?;
            if json {
                registry
                    .with(fmt::layer().json().with_timer(ChronoUtc::rfc_3339()).with_writer(file_appender))
                    .init();
            } else {
                registry
                    .with(
                        fmt::layer()
                            .with_timer(ChronoUtc::rfc_3339())
                            .with_ansi(false)
                            .with_writer(file_appender),
                    )
                    .init();
            }
        }
        None => {
            if json {
                registry
                    .with(fmt::layer().json().with_timer(ChronoUtc::rfc_3339()).with_writer(io::stderr))
                    .init();
            } else {
                registry
                    .with(fmt::layer().with_timer(ChronoUtc::rfc_3339()).with_writer(io::stderr))
                    .init();
            }
        }
    }

    Ok(())
}

// Files are named cinetrack.log.2026-01-17 and so on, rotated at midnight
fn rolling_appender(log_path: &Path) -> Result<RollingFileAppender> {
    let log_dir = log_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Log file path has no parent directory"))?;
    std::fs::create_dir_all(log_dir)?;

    let log_filename = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid log filename"))?;

    Ok(RollingFileAppender::new(Rotation::DAILY, log_dir, rotation_prefix(log_filename)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_by_verbosity() {
        assert_eq!(filter_directive(3, true), Some("error"));
        assert_eq!(filter_directive(0, false), None);
        assert!(filter_directive(1, false).unwrap().starts_with("debug"));
        assert_eq!(filter_directive(2, false), Some("trace"));
    }

    #[test]
    fn test_rotation_prefix() {
        assert_eq!(rotation_prefix("cinetrack.log"), "cinetrack");
        assert_eq!(rotation_prefix("cinetrack"), "cinetrack");
        assert_eq!(rotation_prefix("app.debug.log"), "app.debug");
    }
}
