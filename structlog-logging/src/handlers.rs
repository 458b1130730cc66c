//! Handler layers built from a [`LoggingConfig`]
//!
//! Each handler attached to the root logger becomes one `fmt` layer with
//! its own writer, formatter and level filter. A layer only sees events at
//! or above both the root level and its handler level.

use std::path::Path;

use structlog_config::{HandlerConfig, LoggingConfig, SinkConfig, StreamTarget};
use structlog_core::{Level, Result, StructLogError};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::{fmt, Layer};

use crate::format::ProcessorFormatter;

pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Build one layer per root handler, in the order they are listed.
pub fn build_layers(config: &LoggingConfig) -> Result<Vec<BoxedLayer>> {
    config.validate()?;

    config
        .root
        .handlers
        .iter()
        .map(|name| {
            let handler = config.handler(name).ok_or_else(|| {
                StructLogError::Config(format!("Unknown handler '{}'", name))
            })?;
            handler_layer(config, handler)
        })
        .collect()
}

fn handler_layer(config: &LoggingConfig, handler: &HandlerConfig) -> Result<BoxedLayer> {
    let formatter = config.formatter(&handler.formatter).ok_or_else(|| {
        StructLogError::Config(format!("Unknown formatter '{}'", handler.formatter))
    })?;
    let threshold = effective_level(config.root.level, handler.level);
    let filter = level_filter(threshold);
    let format = ProcessorFormatter::from_config(formatter).with_threshold(threshold);

    let layer = match &handler.sink {
        SinkConfig::Stream {
            stream: StreamTarget::Stderr,
        } => fmt::layer()
            .with_ansi(false)
            .event_format(format)
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
        SinkConfig::Stream {
            stream: StreamTarget::Stdout,
        } => fmt::layer()
            .with_ansi(false)
            .event_format(format)
            .with_writer(std::io::stdout)
            .with_filter(filter)
            .boxed(),
        SinkConfig::File { filename } => fmt::layer()
            .with_ansi(false)
            .event_format(format)
            .with_writer(open_file_sink(filename)?)
            .with_filter(filter)
            .boxed(),
    };

    Ok(layer)
}

/// The stricter of the root and handler thresholds
pub fn effective_level(root: Level, handler: Level) -> Level {
    root.max(handler)
}

/// Coarse per-layer filter; CRITICAL maps to ERROR and is refined by the
/// formatter threshold.
pub fn level_filter(level: Level) -> LevelFilter {
    LevelFilter::from_level(level.to_tracing())
}

/// Append-only file sink; rotation stays disabled.
pub fn open_file_sink(path: &Path) -> Result<RollingFileAppender> {
    let file_name = path
        .file_name()
        .ok_or_else(|| {
            StructLogError::Sink(format!("Log file path has no file name: {}", path.display()))
        })?
        .to_string_lossy()
        .into_owned();
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(&directory)
        .map_err(|e| {
            StructLogError::Sink(format!("Cannot open log file {}: {}", path.display(), e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use structlog_config::LogSettings;

    #[test]
    fn test_effective_level_is_stricter_threshold() {
        assert_eq!(effective_level(Level::Debug, Level::Info), Level::Info);
        assert_eq!(effective_level(Level::Warning, Level::Debug), Level::Warning);
    }

    #[test]
    fn test_level_filter_mapping() {
        assert_eq!(level_filter(Level::Info), LevelFilter::INFO);
        assert_eq!(level_filter(Level::Critical), LevelFilter::ERROR);
    }

    #[test]
    fn test_one_layer_per_root_handler() {
        let dir = tempfile::tempdir().unwrap();
        let settings = LogSettings {
            log_file: dir.path().join("structlog.log"),
            ..LogSettings::default()
        };
        let config = LoggingConfig::from_settings(&settings);
        assert_eq!(build_layers(&config).unwrap().len(), 2);

        let debug = LogSettings {
            debug: true,
            ..settings
        };
        assert_eq!(
            build_layers(&LoggingConfig::from_settings(&debug))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_open_file_sink_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("app.log");
        let _appender = open_file_sink(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_open_file_sink_rejects_directory_like_path() {
        assert!(matches!(
            open_file_sink(Path::new("/")),
            Err(StructLogError::Sink(_))
        ));
    }
}
