// Standard library
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

// External crates
use serde::{Deserialize, Serialize};

// Internal imports
use structlog_core::{Result, StructLogError};

/// Integer flag; any non-zero value selects the development handlers.
pub const DEBUG_ENV: &str = "DEBUG";
/// Path of the structured log file.
pub const LOG_FILE_ENV: &str = "STRCTLOG_FILE";
/// Renderer used by the file handler: `keyvalue` or `json`.
pub const LOG_FORMAT_ENV: &str = "STRCTLOG_FORMAT";
pub const DEFAULT_LOG_FILE: &str = "structlog.log";

/// Renderer choice for the file handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    #[default]
    KeyValue,
    Json,
}

/// Settings supplied by the hosting server's own configuration.
///
/// When present, values set here win over the environment. A missing
/// host configuration is expressed as `None` wherever it is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    pub strctlog_file: Option<PathBuf>,
}

impl HostSettings {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }
}

/// Resolved inputs for logging configuration assembly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub debug: bool,
    pub log_file: PathBuf,
    pub file_format: FileFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            debug: false,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            file_format: FileFormat::default(),
        }
    }
}

impl LogSettings {
    /// Create settings from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(None)
    }

    /// Create settings from environment variables, letting `host` override
    /// the log file path.
    pub fn from_env_with(host: Option<&HostSettings>) -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok(), host)
    }

    /// Resolve settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F, host: Option<&HostSettings>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let debug = parse_debug_flag(lookup(DEBUG_ENV).as_deref())?;
        let file_format = parse_file_format(lookup(LOG_FORMAT_ENV).as_deref())?;

        let log_file = match host.and_then(|h| h.strctlog_file.clone()) {
            Some(path) => path,
            None => lookup(LOG_FILE_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
        };

        Ok(Self {
            debug,
            log_file,
            file_format,
        })
    }
}

fn parse_debug_flag(raw: Option<&str>) -> Result<bool> {
    let Some(raw) = raw else {
        return Ok(false);
    };
    raw.trim()
        .parse::<i64>()
        .map(|value| value != 0)
        .map_err(|_| {
            StructLogError::Config(format!(
                "{} must be an integer, got '{}'",
                DEBUG_ENV, raw
            ))
        })
}

fn parse_file_format(raw: Option<&str>) -> Result<FileFormat> {
    match raw.map(|s| s.trim().to_lowercase()) {
        None => Ok(FileFormat::KeyValue),
        Some(s) if s.is_empty() || s == "keyvalue" || s == "kv" => Ok(FileFormat::KeyValue),
        Some(s) if s == "json" => Ok(FileFormat::Json),
        Some(s) => Err(StructLogError::Config(format!(
            "{} must be 'keyvalue' or 'json', got '{}'",
            LOG_FORMAT_ENV, s
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let settings = LogSettings::from_lookup(lookup_from(&[]), None).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.log_file, PathBuf::from("structlog.log"));
        assert_eq!(settings.file_format, FileFormat::KeyValue);
    }

    #[test]
    fn test_debug_flag_is_integer_truthiness() {
        for (raw, expected) in [("1", true), ("0", false), (" 2 ", true), ("-1", true)] {
            let settings =
                LogSettings::from_lookup(lookup_from(&[(DEBUG_ENV, raw)]), None).unwrap();
            assert_eq!(settings.debug, expected, "DEBUG={raw:?}");
        }
    }

    #[test]
    fn test_non_integer_debug_flag_is_rejected() {
        let err = LogSettings::from_lookup(lookup_from(&[(DEBUG_ENV, "yes")]), None).unwrap_err();
        assert!(matches!(err, StructLogError::Config(_)));
    }

    #[test]
    fn test_host_settings_override_environment() {
        let host = HostSettings {
            strctlog_file: Some(PathBuf::from("/var/log/app/struct.log")),
        };
        let settings = LogSettings::from_lookup(
            lookup_from(&[(LOG_FILE_ENV, "/tmp/env.log")]),
            Some(&host),
        )
        .unwrap();
        assert_eq!(settings.log_file, PathBuf::from("/var/log/app/struct.log"));
    }

    #[test]
    fn test_host_settings_without_path_fall_back_to_environment() {
        let host = HostSettings::default();
        let settings = LogSettings::from_lookup(
            lookup_from(&[(LOG_FILE_ENV, "/tmp/env.log")]),
            Some(&host),
        )
        .unwrap();
        assert_eq!(settings.log_file, PathBuf::from("/tmp/env.log"));
    }

    #[test]
    fn test_file_format_parsing() {
        let settings =
            LogSettings::from_lookup(lookup_from(&[(LOG_FORMAT_ENV, "JSON")]), None).unwrap();
        assert_eq!(settings.file_format, FileFormat::Json);
        assert!(LogSettings::from_lookup(lookup_from(&[(LOG_FORMAT_ENV, "xml")]), None).is_err());
    }

    #[test]
    fn test_host_settings_from_yaml() {
        let host = HostSettings::from_yaml_str("strctlog_file: /srv/app/structlog.log\n").unwrap();
        assert_eq!(
            host.strctlog_file,
            Some(PathBuf::from("/srv/app/structlog.log"))
        );

        let empty = HostSettings::from_yaml_str("{}").unwrap();
        assert_eq!(empty, HostSettings::default());
    }
}
