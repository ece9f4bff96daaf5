//! Tracing setup: human-readable console output plus an optional rolling JSON file.

use std::path::PathBuf;

use studydesk_config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const CRATES: [&str; 4] = [
    "studydesk",
    "studydesk_session",
    "studydesk_chat",
    "studydesk_config",
];

fn filter_for(level: &str) -> String {
    let mut directives: Vec<String> = CRATES.iter().map(|c| format!("{c}={level}")).collect();
    directives.push("warn".to_string());
    directives.join(",")
}

fn log_dir(config: &LoggingConfig) -> PathBuf {
    config
        .directory
        .clone()
        .or_else(|| studydesk_config::user_config_dir().map(|d| d.join("logs")))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the console filter. The returned guard must be kept
/// alive for the JSON file writer to flush.
pub fn init(config: &LoggingConfig, verbose: bool) -> Option<WorkerGuard> {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_for(level)));

    let (file_layer, guard) = if config.json_file {
        let file_appender = tracing_appender::rolling::daily(log_dir(config), "studydesk.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_filter(EnvFilter::new(filter_for("trace")));
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(file_layer)
        .init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_covers_all_crates() {
        let filter = filter_for("debug");
        assert_eq!(
            filter,
            "studydesk=debug,studydesk_session=debug,studydesk_chat=debug,studydesk_config=debug,warn"
        );
    }

    #[test]
    fn test_log_dir_prefers_configured_directory() {
        let config = LoggingConfig {
            directory: Some(PathBuf::from("/tmp/studydesk-logs")),
            ..LoggingConfig::default()
        };
        assert_eq!(log_dir(&config), PathBuf::from("/tmp/studydesk-logs"));
    }
}
