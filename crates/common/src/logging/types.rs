//! Configuration types for the logging subsystem.

use std::path::PathBuf;

use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::format::FmtSpan;

/// Line format of a log sink.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Compact
        }
    }

    pub fn is_json(self) -> bool {
        self == Self::Json
    }
}

#[derive(Debug, Clone)]
pub struct StdoutConfig {
    pub format: LogFormat,

    /// Span lifecycle events to emit. `CLOSE` records how long each span was open.
    pub fmt_span: FmtSpan,
}

impl Default for StdoutConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Compact,
            fmt_span: FmtSpan::CLOSE,
        }
    }
}

/// Rolling log files written from a background thread.
#[derive(Debug, Clone)]
pub struct FileLoggingConfig {
    pub directory: PathBuf,

    /// Files are named `<prefix>.<date>`.
    pub file_name_prefix: String,
    pub rotation: Rotation,
    pub format: LogFormat,
}

impl FileLoggingConfig {
    pub fn new(directory: PathBuf, file_name_prefix: String) -> Self {
        Self {
            directory,
            file_name_prefix,
            rotation: Rotation::DAILY,
            format: LogFormat::Compact,
        }
    }

    pub fn with_rotation(self, rotation: Rotation) -> Self {
        Self { rotation, ..self }
    }

    pub fn with_format(self, format: LogFormat) -> Self {
        Self { format, ..self }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub service_name: String,
    pub service_version: Option<String>,
    pub stdout_config: StdoutConfig,
    pub file_logging_config: Option<FileLoggingConfig>,

    /// Filter directives applied on top of the INFO default and `RUST_LOG`.
    pub directives: Vec<String>,
}

impl LoggerConfig {
    pub fn new(service_name: String) -> Self {
        Self {
            service_name,
            service_version: None,
            stdout_config: StdoutConfig::default(),
            file_logging_config: None,
            // sled logs every page flush at debug
            directives: vec!["sled=info".to_owned()],
        }
    }

    pub fn with_service_version(mut self, version: String) -> Self {
        self.service_version = Some(version);
        self
    }

    pub fn with_stdout_format(mut self, format: LogFormat) -> Self {
        self.stdout_config.format = format;
        self
    }

    pub fn with_fmt_span(mut self, fmt_span: FmtSpan) -> Self {
        self.stdout_config.fmt_span = fmt_span;
        self
    }

    pub fn with_file_logging(mut self, config: FileLoggingConfig) -> Self {
        self.file_logging_config = Some(config);
        self
    }

    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::new("arbor".to_owned())
    }
}
