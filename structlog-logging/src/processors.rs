//! Processor chain
//!
//! Every event is turned into an [`EventDict`] and handed through an ordered
//! list of processors before a renderer turns it into a line. A processor may
//! add, rewrite or remove keys, or drop the event by returning `None`.

use std::backtrace::Backtrace;

use chrono::{Local, SecondsFormat, Utc};
use serde_json::{Map, Value};
use structlog_core::Level;

/// Insertion-ordered key/value record describing a single event
pub type EventDict = Map<String, Value>;

pub const EVENT_KEY: &str = "event";
pub const LEVEL_KEY: &str = "level";
pub const LOGGER_KEY: &str = "logger";
pub const POSITIONAL_ARGS_KEY: &str = "positional_args";
pub const EXC_INFO_KEY: &str = "exc_info";
pub const EXCEPTION_KEY: &str = "exception";
pub const STACK_INFO_KEY: &str = "stack_info";
pub const STACK_KEY: &str = "stack";
pub const DEFAULT_TIMESTAMP_KEY: &str = "@timestamp";

/// Metadata of the `tracing` event an [`EventDict`] was built from
#[derive(Debug, Clone, Copy)]
pub struct RecordMeta<'a> {
    pub level: &'a tracing::Level,
    pub target: &'a str,
}

pub trait Processor: Send + Sync {
    fn process(&self, record: &RecordMeta<'_>, event: EventDict) -> Option<EventDict>;
}

/// Adds `level` from the record unless the emitter already set one.
pub struct AddLogLevel;

impl Processor for AddLogLevel {
    fn process(&self, record: &RecordMeta<'_>, mut event: EventDict) -> Option<EventDict> {
        if !event.contains_key(LEVEL_KEY) {
            let level = Level::from_tracing(record.level);
            event.insert(LEVEL_KEY.to_string(), Value::from(level.as_str()));
        }
        Some(event)
    }
}

/// Adds `logger`, falling back to the event's target.
pub struct AddLoggerName;

impl Processor for AddLoggerName {
    fn process(&self, record: &RecordMeta<'_>, mut event: EventDict) -> Option<EventDict> {
        if !event.contains_key(LOGGER_KEY) {
            event.insert(LOGGER_KEY.to_string(), Value::from(record.target));
        }
        Some(event)
    }
}

/// Stamps events with an ISO-8601 time.
#[derive(Debug, Clone)]
pub struct TimeStamper {
    key: String,
    utc: bool,
}

impl TimeStamper {
    pub fn new(key: impl Into<String>, utc: bool) -> Self {
        Self {
            key: key.into(),
            utc,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn now(&self) -> String {
        if self.utc {
            Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
        } else {
            Local::now().to_rfc3339_opts(SecondsFormat::Micros, false)
        }
    }
}

impl Default for TimeStamper {
    fn default() -> Self {
        Self::new(DEFAULT_TIMESTAMP_KEY, true)
    }
}

impl Processor for TimeStamper {
    fn process(&self, _record: &RecordMeta<'_>, mut event: EventDict) -> Option<EventDict> {
        event.insert(self.key.clone(), Value::from(self.now()));
        Some(event)
    }
}

/// Interpolates `positional_args` into the event message.
pub struct PositionalArgumentsFormatter;

impl Processor for PositionalArgumentsFormatter {
    fn process(&self, _record: &RecordMeta<'_>, mut event: EventDict) -> Option<EventDict> {
        let Some(args) = event.shift_remove(POSITIONAL_ARGS_KEY) else {
            return Some(event);
        };
        let args = match args {
            Value::Array(args) => args,
            Value::Null => Vec::new(),
            other => vec![other],
        };
        if args.is_empty() {
            return Some(event);
        }
        if let Some(Value::String(message)) = event.get(EVENT_KEY) {
            let formatted = format_positional(message, &args);
            event.insert(EVENT_KEY.to_string(), Value::from(formatted));
        }
        Some(event)
    }
}

/// Replaces a truthy `stack_info` with a captured backtrace under `stack`.
pub struct StackInfoRenderer;

impl Processor for StackInfoRenderer {
    fn process(&self, _record: &RecordMeta<'_>, mut event: EventDict) -> Option<EventDict> {
        if let Some(flag) = event.shift_remove(STACK_INFO_KEY) {
            if is_truthy(&flag) {
                let stack = Backtrace::force_capture().to_string();
                event.insert(STACK_KEY.to_string(), Value::from(stack));
            }
        }
        Some(event)
    }
}

/// Moves `exc_info` to `exception`.
///
/// A string value is the already formatted error chain (see
/// [`exc_info_from_error`]); `true` without details is dropped.
pub struct FormatExcInfo;

impl Processor for FormatExcInfo {
    fn process(&self, _record: &RecordMeta<'_>, mut event: EventDict) -> Option<EventDict> {
        match event.shift_remove(EXC_INFO_KEY) {
            Some(Value::String(text)) if !text.is_empty() => {
                event.insert(EXCEPTION_KEY.to_string(), Value::from(text));
            }
            _ => {}
        }
        Some(event)
    }
}

/// Format an error and its sources for the `exc_info` field.
pub fn exc_info_from_error(err: &(dyn std::error::Error + 'static)) -> Value {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str("\nCaused by: ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    Value::from(text)
}

/// Ordered list of processors
pub struct ProcessorChain {
    processors: Vec<Box<dyn Processor>>,
}

impl ProcessorChain {
    pub fn new(processors: Vec<Box<dyn Processor>>) -> Self {
        Self { processors }
    }

    /// Chain for events emitted by a structured logger
    pub fn structured(timestamper: TimeStamper) -> Self {
        Self::new(vec![
            Box::new(AddLogLevel),
            Box::new(AddLoggerName),
            Box::new(PositionalArgumentsFormatter),
            Box::new(timestamper),
            Box::new(StackInfoRenderer),
            Box::new(FormatExcInfo),
        ])
    }

    /// Chain for plain `tracing` events from other crates
    pub fn foreign_pre_chain(timestamper: TimeStamper) -> Self {
        Self::new(vec![Box::new(AddLogLevel), Box::new(timestamper)])
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    pub fn run(&self, record: &RecordMeta<'_>, event: EventDict) -> Option<EventDict> {
        self.processors
            .iter()
            .try_fold(event, |event, processor| processor.process(record, event))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Printf-style interpolation of `%s`, `%d`, `%i`, `%r`, `%f` and `%%`.
///
/// Specifiers left over once `args` run out are kept verbatim; surplus
/// arguments are ignored.
pub fn format_positional(message: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(message.len());
    let mut args = args.iter();
    let mut chars = message.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let Some(&spec) = chars.peek() else {
            out.push('%');
            break;
        };
        if spec == '%' {
            chars.next();
            out.push('%');
            continue;
        }
        if !matches!(spec, 's' | 'd' | 'i' | 'r' | 'f') {
            out.push('%');
            continue;
        }
        chars.next();
        match args.next() {
            Some(arg) => out.push_str(&format_arg(spec, arg)),
            None => {
                out.push('%');
                out.push(spec);
            }
        }
    }

    out
}

fn format_arg(spec: char, arg: &Value) -> String {
    match spec {
        'd' | 'i' => match arg {
            Value::Number(n) => n
                .as_i64()
                .map(|i| i.to_string())
                .or_else(|| n.as_u64().map(|u| u.to_string()))
                .or_else(|| n.as_f64().map(|f| (f.trunc() as i64).to_string()))
                .unwrap_or_else(|| n.to_string()),
            Value::Bool(b) => u8::from(*b).to_string(),
            other => display_value(other),
        },
        'f' => match arg.as_f64() {
            Some(f) => format!("{:.6}", f),
            None => display_value(arg),
        },
        'r' => repr_value(arg),
        _ => display_value(arg),
    }
}

/// `%r` rendering in the host's repr style: quoted strings (single quotes
/// unless the text holds one), `True`/`False`/`None`.
fn repr_value(value: &Value) -> String {
    match value {
        Value::String(s) => {
            let quote = if s.contains('\'') && !s.contains('"') {
                '"'
            } else {
                '\''
            };
            let mut out = String::with_capacity(s.len() + 2);
            out.push(quote);
            for c in s.chars() {
                match c {
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\t' => out.push_str("\\t"),
                    c if c == quote => {
                        out.push('\\');
                        out.push(c);
                    }
                    c => out.push(c),
                }
            }
            out.push(quote);
            out
        }
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(repr_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("'{}': {}", k, repr_value(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
        Value::Number(n) => n.to_string(),
    }
}

/// Render a value without quoting plain strings.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}
