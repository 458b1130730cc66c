//! Structured logging for web-application processes
//!
//! This crate turns a [`LoggingConfig`] into a live `tracing` subscriber and
//! hands out named [`StructLogger`]s.
//!
//! ## Pipeline
//!
//! 1. A [`StructLogger`] merges thread-local context, its bound values and
//!    the call's fields and emits one `tracing` event.
//! 2. Every handler layer runs the event through a [`ProcessorChain`]
//!    (level, logger name, positional arguments, timestamp, stack and
//!    exception info). Events from other crates get the shorter foreign
//!    pre-chain instead.
//! 3. The handler's renderer writes a console line, a `key=value` record or
//!    a JSON object to its sink.
//!
//! ## Usage
//!
//! ```no_run
//! use structlog_config::{LogSettings, LoggingConfig};
//! use structlog_logging::{fields, BoundLogger};
//!
//! let settings = LogSettings::from_env()?;
//! let provider = structlog_logging::init(&LoggingConfig::from_settings(&settings))?;
//! let log = provider.get_logger("app");
//! log.info("started", &[], fields! { "workers" => 4 });
//! # Ok::<(), structlog_core::StructLogError>(())
//! ```

pub mod context;
pub mod format;
pub mod handlers;
pub mod logger;
pub mod processors;
pub mod renderers;

use std::sync::{Mutex, OnceLock};

use structlog_config::LoggingConfig;
use structlog_core::{Result, StructLogError};
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::registry::Registry;
use tracing_subscriber::util::SubscriberInitExt;

pub use format::ProcessorFormatter;
pub use handlers::BoxedLayer;
pub use logger::{BoundLogger, Fields, StructLogger, STRUCTLOG_TARGET};
pub use processors::{exc_info_from_error, EventDict, ProcessorChain};
pub use serde_json;

/// Subscriber assembled from a [`LoggingConfig`]
pub type StructSubscriber = Layered<Vec<BoxedLayer>, Registry>;

static PROVIDER: OnceLock<LoggerProvider> = OnceLock::new();
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Handle returned by [`init`] for creating loggers
#[derive(Debug, Clone)]
pub struct LoggerProvider {
    handlers: Vec<String>,
}

impl LoggerProvider {
    fn new(config: &LoggingConfig) -> Self {
        Self {
            handlers: config.root.handlers.clone(),
        }
    }

    pub fn get_logger(&self, name: &str) -> StructLogger {
        StructLogger::new(name)
    }

    /// Names of the handlers the process is logging to
    pub fn handlers(&self) -> &[String] {
        &self.handlers
    }
}

/// Build the subscriber described by `config` without installing it.
pub fn build_subscriber(config: &LoggingConfig) -> Result<StructSubscriber> {
    let layers = handlers::build_layers(config)?;
    Ok(tracing_subscriber::registry().with(layers))
}

/// Install the logging configuration as the process-wide subscriber.
///
/// Must run once during startup, before any log call; later calls fail with
/// [`StructLogError::AlreadyInitialized`].
pub fn init(config: &LoggingConfig) -> Result<LoggerProvider> {
    let _lock = INIT_LOCK
        .lock()
        .map_err(|_| StructLogError::Internal("Logging init lock poisoned".to_string()))?;
    if PROVIDER.get().is_some() {
        return Err(StructLogError::AlreadyInitialized);
    }

    build_subscriber(config)?.try_init().map_err(|e| {
        StructLogError::Internal(format!("Failed to initialize tracing: {}", e))
    })?;

    let provider = LoggerProvider::new(config);
    PROVIDER
        .set(provider.clone())
        .map_err(|_| StructLogError::AlreadyInitialized)?;
    Ok(provider)
}

/// The provider installed by [`init`], if any
pub fn provider() -> Option<&'static LoggerProvider> {
    PROVIDER.get()
}
