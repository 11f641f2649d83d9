use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter as TracingLevel;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Keeps the log file writer alive. Buffered events are flushed on drop.
pub struct LogFileGuard {
    _writer: WorkerGuard,
    path: PathBuf,
}

impl Drop for LogFileGuard {
    fn drop(&mut self) {
        tracing::info!("Wrote log to {}", self.path.display());
    }
}

/// Terminal log level, as accepted by `--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[clap(rename_all = "UPPER")]
#[serde(rename_all = "UPPERCASE")]
pub enum LevelFilter {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LevelFilter> for TracingLevel {
    fn from(level: LevelFilter) -> Self {
        match level {
            LevelFilter::Off => TracingLevel::OFF,
            LevelFilter::Error => TracingLevel::ERROR,
            LevelFilter::Warn => TracingLevel::WARN,
            LevelFilter::Info => TracingLevel::INFO,
            LevelFilter::Debug => TracingLevel::DEBUG,
            LevelFilter::Trace => TracingLevel::TRACE,
        }
    }
}

/// `--log-level` wins over `RUST_LOG`. Without either, only warnings and errors show.
fn terminal_filter(level: Option<LevelFilter>) -> EnvFilter {
    let builder = EnvFilter::builder();
    match level {
        Some(level) => builder
            .with_default_directive(TracingLevel::from(level).into())
            .parse_lossy(""),
        None => builder
            .with_default_directive(TracingLevel::WARN.into())
            .from_env_lossy(),
    }
}

/// Creates the log file, and any missing parent directories.
fn create_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    File::create(path)
}

/// Installs the global subscriber.
///
/// Terminal output goes to stderr, filtered by `level`. With `log_path`, every
/// event is also written to that file as JSON lines, including bridge traffic at
/// trace level. Hold on to the returned guard until the program exits.
pub fn setup_logging(
    log_path: Option<&Path>,
    level: Option<LevelFilter>,
) -> anyhow::Result<Option<LogFileGuard>> {
    let terminal = tracing_subscriber::fmt::layer()
        .compact()
        .without_time()
        .with_writer(std::io::stderr)
        .with_filter(terminal_filter(level));

    let (file_layer, guard) = match log_path {
        Some(path) => {
            let (writer, worker) = tracing_appender::non_blocking::NonBlockingBuilder::default()
                .lossy(false)
                .finish(create_log_file(path)?);

            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_writer(writer);

            let guard = LogFileGuard {
                _writer: worker,
                path: path.to_path_buf(),
            };
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(terminal)
        .with(file_layer)
        .init();

    if let Some(path) = log_path {
        tracing::info!("Writing log to {}", path.display());
    }

    Ok(guard)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test_case(LevelFilter::Off, TracingLevel::OFF)]
    #[test_case(LevelFilter::Warn, TracingLevel::WARN)]
    #[test_case(LevelFilter::Trace, TracingLevel::TRACE)]
    fn level_maps_to_tracing(level: LevelFilter, expected: TracingLevel) {
        assert_eq!(TracingLevel::from(level), expected);
    }

    #[test]
    fn explicit_level_sets_the_maximum() {
        let filter = terminal_filter(Some(LevelFilter::Debug));
        assert_eq!(filter.max_level_hint(), Some(TracingLevel::DEBUG));
    }

    #[test]
    fn log_file_directories_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("bridge").join("rvlink.log");

        create_log_file(&path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn existing_directory_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rvlink.log");

        create_log_file(&path).unwrap();
        assert!(path.is_file());
    }
}
