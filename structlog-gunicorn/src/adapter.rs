//! Structured logger class for the host server
//!
//! A stripped down host logger: leveled calls are forwarded as-is to the
//! `gunicorn.error` logger and every finished request becomes one
//! `"request"` event on `gunicorn.access`. Both loggers run at INFO.
//!
//! ```no_run
//! use std::time::Duration;
//! use structlog_config::{LogSettings, LoggingConfig};
//! use structlog_gunicorn::{Environ, GunicornLogger, HostLogger, ResponseInfo};
//! use structlog_logging::fields;
//!
//! let settings = LogSettings::from_env()?;
//! let provider = structlog_logging::init(&LoggingConfig::from_settings(&settings))?;
//! let logger = GunicornLogger::new(&provider);
//!
//! logger.info("Listening at: %s", &["http://0.0.0.0:8000".into()], fields! {});
//! let environ = Environ::new()
//!     .with("REQUEST_METHOD", "GET")
//!     .with("RAW_URI", "/health");
//! logger.access(
//!     &ResponseInfo::new("200 OK", Some(2)),
//!     &environ,
//!     Duration::from_millis(4),
//! )?;
//! # Ok::<(), structlog_core::StructLogError>(())
//! ```

use std::time::Duration;

use serde_json::Value;
use structlog_core::{Level, Result};
use structlog_logging::{BoundLogger, Fields, LoggerProvider, StructLogger};

use crate::access::{AccessRecord, Environ, ResponseInfo};
use crate::host::HostLogger;

pub const ERROR_LOGGER: &str = "gunicorn.error";
pub const ACCESS_LOGGER: &str = "gunicorn.access";
const ACCESS_EVENT: &str = "request";

pub struct GunicornLogger<L: BoundLogger = StructLogger> {
    error_logger: L,
    access_logger: L,
}

impl GunicornLogger<StructLogger> {
    pub fn new(provider: &LoggerProvider) -> Self {
        Self {
            error_logger: provider.get_logger(ERROR_LOGGER).with_level(Level::Info),
            access_logger: provider.get_logger(ACCESS_LOGGER).with_level(Level::Info),
        }
    }
}

impl<L: BoundLogger> GunicornLogger<L> {
    pub fn with_loggers(error_logger: L, access_logger: L) -> Self {
        Self {
            error_logger,
            access_logger,
        }
    }

    pub fn error_logger(&self) -> &L {
        &self.error_logger
    }

    pub fn access_logger(&self) -> &L {
        &self.access_logger
    }
}

impl<L: BoundLogger> HostLogger for GunicornLogger<L> {
    fn critical(&self, msg: &str, args: &[Value], fields: Fields) {
        self.error_logger.critical(msg, args, fields);
    }

    fn error(&self, msg: &str, args: &[Value], fields: Fields) {
        self.error_logger.error(msg, args, fields);
    }

    fn warning(&self, msg: &str, args: &[Value], fields: Fields) {
        self.error_logger.warning(msg, args, fields);
    }

    fn info(&self, msg: &str, args: &[Value], fields: Fields) {
        self.error_logger.info(msg, args, fields);
    }

    fn debug(&self, msg: &str, args: &[Value], fields: Fields) {
        self.error_logger.debug(msg, args, fields);
    }

    fn exception(&self, msg: &str, args: &[Value], fields: Fields) {
        self.error_logger.exception(msg, args, fields);
    }

    fn log(&self, level: Level, msg: &str, args: &[Value], fields: Fields) {
        self.error_logger.log(level, msg, args, fields);
    }

    fn access(
        &self,
        resp: &ResponseInfo,
        environ: &Environ,
        request_time: Duration,
    ) -> Result<()> {
        let fields = AccessRecord::new(resp, environ, request_time)?.into_fields()?;
        self.access_logger.info(ACCESS_EVENT, &[], fields);
        Ok(())
    }

    // Log files are owned by the handler configuration, not the host.
    fn reopen_files(&self) {}

    fn close_on_exec(&self) {}
}
