//! Final renderers turning an [`EventDict`] into one output record

use serde_json::Value;
use structlog_config::RendererKind;

use crate::processors::{
    display_value, EventDict, EVENT_KEY, EXCEPTION_KEY, LEVEL_KEY, LOGGER_KEY, STACK_KEY,
};

const LEVEL_WIDTH: usize = 9;
const EVENT_WIDTH: usize = 30;

pub trait Render: Send + Sync {
    fn render(&self, event: &EventDict) -> String;
}

pub fn renderer_for(kind: RendererKind, timestamp_key: &str) -> Box<dyn Render> {
    match kind {
        RendererKind::Console => Box::new(ConsoleRenderer::new(timestamp_key)),
        RendererKind::KeyValue => Box::new(KeyValueRenderer),
        RendererKind::Json => Box::new(JsonRenderer),
    }
}

/// Human readable, colorless console output
///
/// `<timestamp> [<level>] <event> [<logger>] key=value ...` with the
/// remaining keys sorted, followed by stack and exception text on their own
/// lines.
#[derive(Debug, Clone)]
pub struct ConsoleRenderer {
    timestamp_key: String,
}

impl ConsoleRenderer {
    pub fn new(timestamp_key: impl Into<String>) -> Self {
        Self {
            timestamp_key: timestamp_key.into(),
        }
    }
}

impl Render for ConsoleRenderer {
    fn render(&self, event: &EventDict) -> String {
        let mut line = String::new();

        if let Some(ts) = event.get(&self.timestamp_key) {
            line.push_str(&display_value(ts));
            line.push(' ');
        }
        if let Some(level) = event.get(LEVEL_KEY) {
            line.push_str(&format!(
                "[{:<width$}] ",
                display_value(level),
                width = LEVEL_WIDTH
            ));
        }

        let message = event.get(EVENT_KEY).map(display_value).unwrap_or_default();
        line.push_str(&format!("{:<width$}", message, width = EVENT_WIDTH));

        if let Some(logger) = event.get(LOGGER_KEY) {
            line.push_str(&format!(" [{}]", display_value(logger)));
        }

        let skip = [
            self.timestamp_key.as_str(),
            LEVEL_KEY,
            EVENT_KEY,
            LOGGER_KEY,
            STACK_KEY,
            EXCEPTION_KEY,
        ];
        let mut rest: Vec<(&String, &Value)> = event
            .iter()
            .filter(|(key, _)| !skip.contains(&key.as_str()))
            .collect();
        rest.sort_by(|a, b| a.0.cmp(b.0));
        for (key, value) in rest {
            line.push_str(&format!(" {}={}", key, display_value(value)));
        }

        let mut line = line.trim_end().to_string();
        for key in [STACK_KEY, EXCEPTION_KEY] {
            if let Some(text) = event.get(key) {
                line.push('\n');
                line.push_str(&display_value(text));
            }
        }
        line
    }
}

/// Single-line `key=value` records in insertion order
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyValueRenderer;

impl Render for KeyValueRenderer {
    fn render(&self, event: &EventDict) -> String {
        event
            .iter()
            .map(|(key, value)| format!("{}={}", key, kv_value(value)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn kv_value(value: &Value) -> String {
    match value {
        Value::String(s) if needs_quoting(s) => Value::from(s.as_str()).to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn needs_quoting(s: &str) -> bool {
    s.is_empty()
        || s
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '=' || c == '"')
}

/// Single-line JSON objects
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl Render for JsonRenderer {
    fn render(&self, event: &EventDict) -> String {
        serde_json::to_string(event).unwrap_or_else(|_| "Failed to serialize log entry".to_string())
    }
}
