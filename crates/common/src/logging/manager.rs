//! Logging initialization.

use anyhow::Context;
use tracing::*;
use tracing_appender::{non_blocking::WorkerGuard, rolling::RollingFileAppender};
use tracing_subscriber::{
    filter::Directive,
    fmt::{
        format::{DefaultFields, Format},
        layer, Layer as FmtLayer, MakeWriter,
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use super::types::{LogFormat, LoggerConfig};

/// Picks the event formatter of a fmt layer, boxing it so both formats have one type.
trait WithFormat<S> {
    fn with_formatted(self, format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>;
}

impl<S, W> WithFormat<S> for FmtLayer<S, DefaultFields, Format, W>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fn with_formatted(self, format: LogFormat) -> Box<dyn Layer<S> + Send + Sync> {
        match format {
            LogFormat::Compact => self.compact().boxed(),
            LogFormat::Json => self.json().boxed(),
        }
    }
}

/// Keeps the background file writer alive. Dropping it flushes and closes the log file.
#[derive(Debug)]
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Builds the filter: INFO by default, overridden by `RUST_LOG`, then the configured
/// directives.
pub(crate) fn build_filter(config: &LoggerConfig) -> anyhow::Result<EnvFilter> {
    let mut filt = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();
    for directive in &config.directives {
        let parsed = directive
            .parse::<Directive>()
            .with_context(|| format!("invalid log directive '{directive}'"))?;
        filt = filt.add_directive(parsed);
    }
    Ok(filt)
}

/// Initializes the global subscriber with the provided config.
///
/// Fails if the filter directives don't parse or a global subscriber is already installed.
pub fn init(config: LoggerConfig) -> anyhow::Result<LoggingGuard> {
    let filt = build_filter(&config)?;

    let stdout_sub = layer()
        .with_span_events(config.stdout_config.fmt_span.clone())
        .with_formatted(config.stdout_config.format)
        .with_filter(filt.clone());

    let mut file_guard = None;
    let file_layer = config.file_logging_config.as_ref().map(|file_config| {
        let file_appender = RollingFileAppender::new(
            file_config.rotation.clone(),
            &file_config.directory,
            &file_config.file_name_prefix,
        );
        let (writer, guard) = tracing_appender::non_blocking(file_appender);
        file_guard = Some(guard);

        layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_formatted(file_config.format)
            .with_filter(filt.clone())
    });

    tracing_subscriber::registry()
        .with(stdout_sub)
        .with(file_layer)
        .try_init()
        .context("installing global subscriber")?;

    info!(
        service_name = %config.service_name,
        service_version = ?config.service_version,
        "logging initialized"
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
