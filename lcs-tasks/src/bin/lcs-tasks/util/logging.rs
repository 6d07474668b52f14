use std::{fs::File, path::Path};

use tracing::level_filters::LevelFilter as TracingLevel;
use tracing_appender::non_blocking::{NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Keeps the log file writer alive. Pending records are flushed when it is dropped.
pub struct LogFileGuard<'a> {
    _writer: WorkerGuard,
    path: &'a Path,
}

impl Drop for LogFileGuard<'_> {
    fn drop(&mut self) {
        tracing::info!("Task log written to {}", self.path.display());
    }
}

/// Verbosity accepted by `--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[clap(rename_all = "UPPER")]
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

/// `--log-level` wins over `RUST_LOG`; without either only warnings reach stderr.
fn console_filter(level: Option<LevelFilter>) -> EnvFilter {
    match level {
        Some(level) => EnvFilter::builder()
            .with_default_directive(TracingLevel::from(level).into())
            .parse_lossy(""),
        None => EnvFilter::builder()
            .with_default_directive(TracingLevel::WARN.into())
            .from_env_lossy(),
    }
}

/// Installs the global subscriber: compact records on stderr and, with `log_file`, a JSON
/// copy of everything at DEBUG and above.
pub fn setup_logging(
    log_file: Option<&Path>,
    level: Option<LevelFilter>,
) -> anyhow::Result<Option<LogFileGuard<'_>>> {
    let console = tracing_subscriber::fmt::layer()
        .compact()
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(console_filter(level));

    let Some(path) = log_file else {
        tracing_subscriber::registry().with(console).init();
        return Ok(None);
    };

    let (writer, guard) = NonBlockingBuilder::default()
        .lossy(false)
        .finish(File::create(path)?);

    let json = tracing_subscriber::fmt::layer()
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(writer)
        .with_filter(TracingLevel::DEBUG);

    tracing_subscriber::registry().with(console).with(json).init();
    tracing::info!("Logging task output to {}", path.display());

    Ok(Some(LogFileGuard {
        _writer: guard,
        path,
    }))
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::ValueEnum;

    #[test]
    fn levels_are_spelled_in_upper_case() {
        let level = LevelFilter::from_str("DEBUG", false).unwrap();

        assert_eq!(level, LevelFilter::Debug);
        assert_eq!(TracingLevel::from(level), TracingLevel::DEBUG);
    }
}
