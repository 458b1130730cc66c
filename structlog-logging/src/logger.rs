//! Structured loggers
//!
//! [`BoundLogger`] is the leveled logging surface shared by every logger in
//! the workspace. [`StructLogger`] is the `tracing`-backed implementation:
//! it merges thread-local context, its own bound values and the call's
//! fields into a single keyword map and emits one event on the
//! [`STRUCTLOG_TARGET`] target, where the processor formatter picks it up.

use std::sync::Arc;

use serde_json::{Map, Value};
use structlog_core::Level;

use crate::context;
use crate::processors::EXC_INFO_KEY;

/// Target of every event emitted by a [`StructLogger`]
pub const STRUCTLOG_TARGET: &str = "structlog";

/// Keyword fields attached to a single log call
pub type Fields = Map<String, Value>;

pub trait BoundLogger: Send + Sync {
    fn log(&self, level: Level, msg: &str, args: &[Value], fields: Fields);

    fn critical(&self, msg: &str, args: &[Value], fields: Fields) {
        self.log(Level::Critical, msg, args, fields);
    }

    fn error(&self, msg: &str, args: &[Value], fields: Fields) {
        self.log(Level::Error, msg, args, fields);
    }

    fn warning(&self, msg: &str, args: &[Value], fields: Fields) {
        self.log(Level::Warning, msg, args, fields);
    }

    fn info(&self, msg: &str, args: &[Value], fields: Fields) {
        self.log(Level::Info, msg, args, fields);
    }

    fn debug(&self, msg: &str, args: &[Value], fields: Fields) {
        self.log(Level::Debug, msg, args, fields);
    }

    /// Error-level event flagged with `exc_info`. A caller-supplied
    /// `exc_info` (for instance from `exc_info_from_error`) is kept.
    fn exception(&self, msg: &str, args: &[Value], mut fields: Fields) {
        fields
            .entry(EXC_INFO_KEY.to_string())
            .or_insert(Value::Bool(true));
        self.log(Level::Error, msg, args, fields);
    }
}

/// Named logger with its own level threshold and bound values
#[derive(Debug, Clone)]
pub struct StructLogger {
    name: Arc<str>,
    level: Level,
    bound: Fields,
}

impl StructLogger {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            level: Level::Debug,
            bound: Fields::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn set_level(&mut self, level: Level) {
        self.level = level;
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// New logger carrying `key=value` on every event; `self` is unchanged.
    #[must_use]
    pub fn bind<K, V>(&self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut logger = self.clone();
        logger.bound.insert(key.into(), value.into());
        logger
    }

    pub fn bound(&self) -> &Fields {
        &self.bound
    }

    pub fn is_enabled_for(&self, level: Level) -> bool {
        level >= self.level
    }

    fn keywords(&self, fields: Fields) -> Fields {
        let mut kw = context::current_context();
        kw.extend(self.bound.iter().map(|(k, v)| (k.clone(), v.clone())));
        kw.extend(fields);
        kw
    }
}

macro_rules! emit_at {
    ($level:expr, $($fields:tt)*) => {
        match $level {
            Level::Debug => {
                tracing::event!(target: STRUCTLOG_TARGET, tracing::Level::DEBUG, $($fields)*)
            }
            Level::Info => {
                tracing::event!(target: STRUCTLOG_TARGET, tracing::Level::INFO, $($fields)*)
            }
            Level::Warning => {
                tracing::event!(target: STRUCTLOG_TARGET, tracing::Level::WARN, $($fields)*)
            }
            Level::Error | Level::Critical => {
                tracing::event!(target: STRUCTLOG_TARGET, tracing::Level::ERROR, $($fields)*)
            }
        }
    };
}

impl BoundLogger for StructLogger {
    fn log(&self, level: Level, msg: &str, args: &[Value], fields: Fields) {
        if !self.is_enabled_for(level) {
            return;
        }

        let kw = Value::Object(self.keywords(fields)).to_string();
        let args = Value::Array(args.to_vec()).to_string();

        emit_at!(
            level,
            level = level.as_str(),
            logger = &*self.name,
            event = msg,
            kw = %kw,
            args = %args
        );
    }
}

/// Build a [`Fields`] map from `key => value` pairs
///
/// ```
/// use structlog_logging::fields;
/// let fields = fields! { "pid" => 42, "worker" => "sync" };
/// assert_eq!(fields.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::Fields::new();
        $(
            fields.insert($key.to_string(), $crate::serde_json::Value::from($value));
        )+
        fields
    }};
}
