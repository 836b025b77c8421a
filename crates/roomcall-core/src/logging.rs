//! Logging setup
//!
//! Library code only emits `tracing` events; binaries call
//! [`setup_logging`] once at startup to install a subscriber.

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::{SessionError, SessionResult};

/// How [`setup_logging`] formats and filters controller logs
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level; `RUST_LOG` directives are added on top
    pub level: Level,
    /// One JSON object per event instead of the human format
    pub json: bool,
    /// Source file and line on every event
    pub file_info: bool,
    /// Span enter/exit events
    pub log_spans: bool,
    /// Write to stderr so logs stay out of the console banners on stdout
    pub stderr: bool,
    /// Name printed in the startup line
    pub app_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: Level::INFO,
            json: false,
            file_info: false,
            log_spans: false,
            stderr: true,
            app_name: "roomcall".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Logging at `level` for the application `app_name`
    pub fn new(level: Level, app_name: impl Into<String>) -> Self {
        LoggingConfig {
            level,
            app_name: app_name.into(),
            ..Default::default()
        }
    }

    /// Emit JSON lines
    pub fn with_json(mut self) -> Self {
        self.json = true;
        self
    }

    /// Tag each event with its source location
    pub fn with_file_info(mut self) -> Self {
        self.file_info = true;
        self
    }

    /// Log span lifecycles, useful when following a join through its steps
    pub fn with_spans(mut self) -> Self {
        self.log_spans = true;
        self
    }

    /// Write to stdout instead of stderr
    pub fn with_stdout(mut self) -> Self {
        self.stderr = false;
        self
    }
}

/// Install a global subscriber for `config`
///
/// `RUST_LOG` directives are honored on top of the configured level. Fails
/// if a global subscriber is already installed.
pub fn setup_logging(config: LoggingConfig) -> SessionResult<()> {
    let filter = EnvFilter::from_default_env().add_directive(config.level.into());

    let span_events = if config.log_spans {
        FmtSpan::ACTIVE
    } else {
        FmtSpan::NONE
    };

    let writer = if config.stderr {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_span_events(span_events)
        .with_file(config.file_info)
        .with_line_number(config.file_info)
        .with_writer(writer);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| SessionError::config(format!("cannot install logger: {}", e)))?;
    tracing::info!("Starting {} v{}", config.app_name, crate::VERSION);
    Ok(())
}

/// Parse a log level from a string
pub fn parse_log_level(level: &str) -> SessionResult<Level> {
    Level::from_str(level).map_err(|_| SessionError::config(format!("Invalid log level: {}", level)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_levels_case_insensitively() {
        assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("WARN").unwrap(), Level::WARN);
        assert!(matches!(
            parse_log_level("loud"),
            Err(SessionError::Configuration { .. })
        ));
    }

    #[test]
    fn builder_flags() {
        let config = LoggingConfig::new(Level::DEBUG, "test").with_json().with_file_info();
        assert!(config.json);
        assert!(config.file_info);
        assert!(!config.log_spans);
        assert!(config.stderr);
        assert_eq!(config.app_name, "test");
        assert!(!config.with_stdout().stderr);
    }
}
