//! Logging setup shared by the command line tool and the panel.
//!
//! The command line tool logs to the console. The panel owns the terminal, so
//! it logs to a rolling file instead.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RotationPeriod {
    Hourly,
    #[default]
    Daily,
    Never,
}

impl std::str::FromStr for RotationPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hourly" | "hour" => Ok(RotationPeriod::Hourly),
            "daily" | "day" => Ok(RotationPeriod::Daily),
            "never" | "none" => Ok(RotationPeriod::Never),
            _ => Err(format!(
                "Invalid rotation period '{s}'. Valid options: hourly, daily, never"
            )),
        }
    }
}

impl From<RotationPeriod> for Rotation {
    fn from(period: RotationPeriod) -> Self {
        match period {
            RotationPeriod::Hourly => Rotation::HOURLY,
            RotationPeriod::Daily => Rotation::DAILY,
            RotationPeriod::Never => Rotation::NEVER,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_dir: String,
    pub log_prefix: String,
    pub rotation: RotationPeriod,
    /// Number of files kept on disk (0 keeps everything).
    pub max_log_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: ".".to_string(),
            log_prefix: "iris-panel".to_string(),
            rotation: RotationPeriod::Daily,
            max_log_files: 7,
        }
    }
}

/// Keeps the background log writer alive. Remaining lines are flushed when
/// it is dropped.
pub struct LogGuard {
    _guard: Option<WorkerGuard>,
}

/// Console logging filtered by `RUST_LOG`.
pub fn setup_console_logging() -> LogGuard {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    LogGuard { _guard: None }
}

/// File logging with rotation, filtered by `RUST_LOG`.
pub fn setup_file_logging(config: LogConfig) -> std::io::Result<LogGuard> {
    let appender = build_appender(&config)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = Layer::default()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(file_layer)
        .init();

    Ok(LogGuard {
        _guard: Some(guard),
    })
}

/// Rolling `<prefix>.<date>.log` appender. Files beyond `max_log_files` are
/// pruned by the appender when it rolls over.
fn build_appender(config: &LogConfig) -> std::io::Result<RollingFileAppender> {
    let mut builder = RollingFileAppender::builder()
        .rotation(config.rotation.into())
        .filename_prefix(&config.log_prefix)
        .filename_suffix("log");
    if config.max_log_files > 0 {
        builder = builder.max_log_files(config.max_log_files);
    }
    builder
        .build(Path::new(&config.log_dir))
        .map_err(std::io::Error::other)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rotation_period_from_str() {
        assert_eq!(
            "daily".parse::<RotationPeriod>().unwrap(),
            RotationPeriod::Daily
        );
        assert_eq!(
            "HOURLY".parse::<RotationPeriod>().unwrap(),
            RotationPeriod::Hourly
        );
        assert_eq!(
            "none".parse::<RotationPeriod>().unwrap(),
            RotationPeriod::Never
        );
        assert!("weekly".parse::<RotationPeriod>().is_err());
    }

    fn log_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_appender_writes_prefixed_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = LogConfig {
            log_dir: temp_dir.path().to_string_lossy().into_owned(),
            log_prefix: "iris".to_string(),
            max_log_files: 2,
            ..Default::default()
        };

        let mut appender = build_appender(&config).unwrap();
        appender.write_all(b"panel started\n").unwrap();
        appender.flush().unwrap();

        let names = log_files(temp_dir.path());
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("iris.") && names[0].ends_with(".log"));
    }

    #[test]
    fn test_zero_max_files_keeps_existing_logs() {
        let temp_dir = TempDir::new().unwrap();
        for day in ["2020-01-01", "2020-01-02", "2020-01-03"] {
            std::fs::write(temp_dir.path().join(format!("iris.{day}.log")), "line").unwrap();
        }
        let config = LogConfig {
            log_dir: temp_dir.path().to_string_lossy().into_owned(),
            log_prefix: "iris".to_string(),
            rotation: RotationPeriod::Never,
            max_log_files: 0,
        };

        let mut appender = build_appender(&config).unwrap();
        appender.write_all(b"line\n").unwrap();
        appender.flush().unwrap();

        let names = log_files(temp_dir.path());
        assert_eq!(names.len(), 4);
        assert!(names.contains(&"iris.log".to_string()));
    }
}
