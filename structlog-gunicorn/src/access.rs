//! Per-request access records

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use structlog_core::{Result, StructLogError};
use structlog_logging::Fields;

pub const REQUEST_METHOD: &str = "REQUEST_METHOD";
pub const RAW_URI: &str = "RAW_URI";

/// Response status as reported by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Numeric status code, e.g. `200`
    Code(u16),
    /// Full status line, e.g. `"404 Not Found"`
    Line(String),
}

/// Status as it appears in the access record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StatusField {
    Code(u16),
    Token(String),
}

impl Status {
    /// Status lines are cut down to their leading token; codes pass through.
    pub fn normalize(&self) -> Result<StatusField> {
        match self {
            Status::Code(code) => Ok(StatusField::Code(*code)),
            Status::Line(line) => line
                .split_whitespace()
                .next()
                .map(|token| StatusField::Token(token.to_string()))
                .ok_or_else(|| StructLogError::InvalidStatus(line.clone())),
        }
    }
}

impl From<u16> for Status {
    fn from(code: u16) -> Self {
        Status::Code(code)
    }
}

impl From<&str> for Status {
    fn from(line: &str) -> Self {
        Status::Line(line.to_string())
    }
}

impl From<String> for Status {
    fn from(line: String) -> Self {
        Status::Line(line)
    }
}

/// What the host knows about a finished response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseInfo {
    pub status: Status,
    /// Bytes written to the client, when the host tracked it
    pub sent: Option<u64>,
}

impl ResponseInfo {
    pub fn new(status: impl Into<Status>, sent: Option<u64>) -> Self {
        Self {
            status: status.into(),
            sent,
        }
    }
}

/// Request environment mapping as passed to the application
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environ {
    vars: HashMap<String, String>,
}

impl Environ {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| StructLogError::MissingEnviron(key.to_string()))
    }
}

impl<K, V> FromIterator<(K, V)> for Environ
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Fields of one access log event, in emission order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessRecord {
    pub method: String,
    pub request_uri: String,
    pub status: StatusField,
    pub response_length: Option<u64>,
    pub request_time_seconds: String,
    pub pid: String,
}

impl AccessRecord {
    pub fn new(resp: &ResponseInfo, environ: &Environ, request_time: Duration) -> Result<Self> {
        Ok(Self {
            method: environ.require(REQUEST_METHOD)?.to_string(),
            request_uri: environ.require(RAW_URI)?.to_string(),
            status: resp.status.normalize()?,
            response_length: resp.sent,
            request_time_seconds: format_request_time(request_time),
            pid: format!("<{}>", std::process::id()),
        })
    }

    pub fn into_fields(self) -> Result<Fields> {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(fields),
            other => Err(StructLogError::Internal(format!(
                "Access record serialized to non-object: {}",
                other
            ))),
        }
    }
}

/// `<seconds>.<microseconds>` with six-digit microseconds
pub fn format_request_time(elapsed: Duration) -> String {
    format!("{}.{:06}", elapsed.as_secs(), elapsed.subsec_micros())
}
