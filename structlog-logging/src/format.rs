//! Bridge between `tracing` events and the processor chain

use std::fmt;

use serde_json::Value;
use structlog_config::{FormatterConfig, RendererKind};
use structlog_core::Level;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

use crate::logger::STRUCTLOG_TARGET;
use crate::processors::{
    EventDict, ProcessorChain, RecordMeta, TimeStamper, EVENT_KEY, LEVEL_KEY, LOGGER_KEY,
    POSITIONAL_ARGS_KEY,
};
use crate::renderers::{renderer_for, Render};

const MESSAGE_FIELD: &str = "message";
const KW_FIELD: &str = "kw";
const ARGS_FIELD: &str = "args";

/// Keys owned by the emitting logger; caller fields using them are kept
/// under the same name with a leading underscore.
const RESERVED_KEYS: [&str; 4] = [EVENT_KEY, LEVEL_KEY, LOGGER_KEY, POSITIONAL_ARGS_KEY];

/// Collects an event's fields as JSON values, in recording order.
#[derive(Default)]
struct EventVisitor {
    fields: EventDict,
}

impl EventVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for EventVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::from(format!("{value:?}")));
    }
}

impl EventVisitor {
    /// Event dictionary for a structured logger event: the message first,
    /// then the keyword map, then everything else.
    fn into_structured(mut self) -> EventDict {
        let mut event = EventDict::new();
        if let Some(message) = self.fields.shift_remove(EVENT_KEY) {
            event.insert(EVENT_KEY.to_string(), message);
        }
        if let Some(Value::String(kw)) = self.fields.shift_remove(KW_FIELD) {
            if let Ok(Value::Object(kw)) = serde_json::from_str::<Value>(&kw) {
                for (key, value) in kw {
                    if RESERVED_KEYS.contains(&key.as_str()) {
                        event.insert(format!("_{key}"), value);
                    } else {
                        event.insert(key, value);
                    }
                }
            }
        }
        if let Some(Value::String(args)) = self.fields.shift_remove(ARGS_FIELD) {
            if let Ok(args @ Value::Array(_)) = serde_json::from_str::<Value>(&args) {
                event.insert(POSITIONAL_ARGS_KEY.to_string(), args);
            }
        }
        event.extend(self.fields);
        event
    }

    /// Event dictionary for any other `tracing` event
    fn into_foreign(mut self) -> EventDict {
        let mut event = EventDict::new();
        if let Some(message) = self.fields.shift_remove(MESSAGE_FIELD) {
            event.insert(EVENT_KEY.to_string(), message);
        }
        event.extend(self.fields);
        event
    }
}

/// `FormatEvent` running events through a processor chain and a renderer
///
/// `tracing` has no level above ERROR, so critical and error events share a
/// callsite level. The formatter's threshold compares the event's own
/// `level` name and drops anything below it.
pub struct ProcessorFormatter {
    chain: ProcessorChain,
    foreign_pre_chain: Option<ProcessorChain>,
    renderer: Box<dyn Render>,
    threshold: Level,
}

impl ProcessorFormatter {
    pub fn new(renderer: RendererKind) -> Self {
        Self::from_config(&FormatterConfig {
            renderer,
            foreign_pre_chain: true,
        })
    }

    pub fn from_config(config: &FormatterConfig) -> Self {
        let timestamper = TimeStamper::default();
        Self {
            chain: ProcessorChain::structured(timestamper.clone()),
            foreign_pre_chain: config
                .foreign_pre_chain
                .then(|| ProcessorChain::foreign_pre_chain(timestamper.clone())),
            renderer: renderer_for(config.renderer, timestamper.key()),
            threshold: Level::Debug,
        }
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: Level) -> Self {
        self.threshold = threshold;
        self
    }

    fn meets_threshold(&self, record: &RecordMeta<'_>, dict: &EventDict) -> bool {
        let level = dict
            .get(LEVEL_KEY)
            .and_then(Value::as_str)
            .and_then(|name| name.parse::<Level>().ok())
            .unwrap_or_else(|| Level::from_tracing(record.level));
        level >= self.threshold
    }

    /// Build and process the event dictionary; `None` when a processor
    /// dropped the event or it is below the threshold.
    pub fn process(&self, event: &Event<'_>) -> Option<EventDict> {
        let metadata = event.metadata();
        let record = RecordMeta {
            level: metadata.level(),
            target: metadata.target(),
        };

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let dict = if metadata.target() == STRUCTLOG_TARGET {
            self.chain.run(&record, visitor.into_structured())
        } else {
            let dict = visitor.into_foreign();
            match &self.foreign_pre_chain {
                Some(chain) => chain.run(&record, dict),
                None => Some(dict),
            }
        };
        dict.filter(|dict| self.meets_threshold(&record, dict))
    }
}

impl<S, N> FormatEvent<S, N> for ProcessorFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        match self.process(event) {
            Some(dict) => writeln!(writer, "{}", self.renderer.render(&dict)),
            None => Ok(()),
        }
    }
}
