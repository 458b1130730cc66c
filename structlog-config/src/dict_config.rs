//! Declarative logging configuration
//!
//! [`LoggingConfig`] mirrors the classic dictionary-based logging schema:
//! formatters pick a renderer, handlers bind a sink to a level threshold and
//! a formatter, and the root logger lists the handlers in use. The
//! configuration is plain data; turning it into live subscribers is the job
//! of the logging crate.

use std::collections::BTreeSet;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use structlog_core::{Level, Result, StructLogError};

use crate::settings::{FileFormat, LogSettings};

pub const CONFIG_VERSION: u32 = 1;

pub const CONSOLE_FORMATTER: &str = "console";
pub const STRUCTURED_FORMATTER: &str = "structured";

pub const PRODUCTION_HANDLER: &str = "production";
pub const DEVELOPMENT_HANDLER: &str = "development";
pub const FILE_HANDLER: &str = "file";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Plain leveled text for terminals
    Console,
    /// Single-line `key=value` records
    KeyValue,
    /// Single-line JSON objects
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatterConfig {
    pub renderer: RendererKind,
    /// Run level and timestamp processors on events that did not come from
    /// a structured logger.
    #[serde(default = "default_true")]
    pub foreign_pre_chain: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamTarget {
    Stderr,
    Stdout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "lowercase")]
pub enum SinkConfig {
    Stream { stream: StreamTarget },
    File { filename: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerConfig {
    pub level: Level,
    #[serde(flatten)]
    pub sink: SinkConfig,
    pub formatter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootConfig {
    pub level: Level,
    pub handlers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub version: u32,
    pub formatters: IndexMap<String, FormatterConfig>,
    pub handlers: IndexMap<String, HandlerConfig>,
    pub root: RootConfig,
}

fn default_true() -> bool {
    true
}

impl LoggingConfig {
    /// Assemble the standard configuration for the given settings.
    ///
    /// Debug mode routes everything to a verbose console handler; otherwise
    /// events go to the structured file and an INFO console handler.
    pub fn from_settings(settings: &LogSettings) -> Self {
        let mut formatters = IndexMap::new();
        formatters.insert(
            CONSOLE_FORMATTER.to_string(),
            FormatterConfig {
                renderer: RendererKind::Console,
                foreign_pre_chain: true,
            },
        );
        formatters.insert(
            STRUCTURED_FORMATTER.to_string(),
            FormatterConfig {
                renderer: match settings.file_format {
                    FileFormat::KeyValue => RendererKind::KeyValue,
                    FileFormat::Json => RendererKind::Json,
                },
                foreign_pre_chain: true,
            },
        );

        let mut handlers = IndexMap::new();
        handlers.insert(
            PRODUCTION_HANDLER.to_string(),
            HandlerConfig {
                level: Level::Info,
                sink: SinkConfig::Stream {
                    stream: StreamTarget::Stderr,
                },
                formatter: CONSOLE_FORMATTER.to_string(),
            },
        );
        handlers.insert(
            DEVELOPMENT_HANDLER.to_string(),
            HandlerConfig {
                level: Level::Debug,
                sink: SinkConfig::Stream {
                    stream: StreamTarget::Stderr,
                },
                formatter: CONSOLE_FORMATTER.to_string(),
            },
        );
        handlers.insert(
            FILE_HANDLER.to_string(),
            HandlerConfig {
                level: Level::Debug,
                sink: SinkConfig::File {
                    filename: settings.log_file.clone(),
                },
                formatter: STRUCTURED_FORMATTER.to_string(),
            },
        );

        let root_handlers = if settings.debug {
            vec![DEVELOPMENT_HANDLER.to_string()]
        } else {
            vec![FILE_HANDLER.to_string(), PRODUCTION_HANDLER.to_string()]
        };

        Self {
            version: CONFIG_VERSION,
            formatters,
            handlers,
            root: RootConfig {
                level: Level::Debug,
                handlers: root_handlers,
            },
        }
    }

    /// Names of the handlers attached to the root logger
    pub fn active_handlers(&self) -> BTreeSet<&str> {
        self.root.handlers.iter().map(String::as_str).collect()
    }

    pub fn handler(&self, name: &str) -> Option<&HandlerConfig> {
        self.handlers.get(name)
    }

    pub fn formatter(&self, name: &str) -> Option<&FormatterConfig> {
        self.formatters.get(name)
    }

    /// Check that the version is supported and every reference resolves.
    pub fn validate(&self) -> Result<()> {
        if self.version != CONFIG_VERSION {
            return Err(StructLogError::Config(format!(
                "Unsupported logging config version {}",
                self.version
            )));
        }

        for name in &self.root.handlers {
            if !self.handlers.contains_key(name) {
                return Err(StructLogError::Config(format!(
                    "Root logger references unknown handler '{}'",
                    name
                )));
            }
        }

        for (name, handler) in &self.handlers {
            if !self.formatters.contains_key(&handler.formatter) {
                return Err(StructLogError::Config(format!(
                    "Handler '{}' references unknown formatter '{}'",
                    name, handler.formatter
                )));
            }
        }

        Ok(())
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_config_is_valid() {
        for debug in [true, false] {
            let settings = LogSettings {
                debug,
                ..LogSettings::default()
            };
            LoggingConfig::from_settings(&settings).validate().unwrap();
        }
    }

    #[test]
    fn test_handler_levels_and_formatters() {
        let config = LoggingConfig::from_settings(&LogSettings::default());

        let production = config.handler(PRODUCTION_HANDLER).unwrap();
        assert_eq!(production.level, Level::Info);
        assert_eq!(production.formatter, CONSOLE_FORMATTER);

        let development = config.handler(DEVELOPMENT_HANDLER).unwrap();
        assert_eq!(development.level, Level::Debug);

        let file = config.handler(FILE_HANDLER).unwrap();
        assert_eq!(file.level, Level::Debug);
        assert_eq!(file.formatter, STRUCTURED_FORMATTER);
        assert_eq!(config.root.level, Level::Debug);
    }

    #[test]
    fn test_json_file_format_switches_structured_renderer() {
        let settings = LogSettings {
            file_format: FileFormat::Json,
            ..LogSettings::default()
        };
        let config = LoggingConfig::from_settings(&settings);
        assert_eq!(
            config.formatter(STRUCTURED_FORMATTER).unwrap().renderer,
            RendererKind::Json
        );
    }

    #[test]
    fn test_validate_rejects_dangling_references() {
        let mut config = LoggingConfig::from_settings(&LogSettings::default());
        config.root.handlers.push("syslog".to_string());
        assert!(config.validate().is_err());

        let mut config = LoggingConfig::from_settings(&LogSettings::default());
        if let Some(handler) = config.handlers.get_mut(FILE_HANDLER) {
            handler.formatter = "missing".to_string();
        }
        assert!(config.validate().is_err());

        let mut config = LoggingConfig::from_settings(&LogSettings::default());
        config.version = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_round_trip_preserves_handler_order() {
        let config = LoggingConfig::from_settings(&LogSettings::default());
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("class: file"));
        assert!(yaml.contains("filename: structlog.log"));

        let parsed = LoggingConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed, config);
        let names: Vec<&String> = parsed.handlers.keys().collect();
        assert_eq!(names, vec!["production", "development", "file"]);
    }
}
