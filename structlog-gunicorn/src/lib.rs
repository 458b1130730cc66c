//! Host integration for struct_logging
//!
//! [`HostLogger`] is the logger interface a pre-fork web server expects from
//! its pluggable logger class. [`GunicornLogger`] implements it on top of
//! two structured loggers, `gunicorn.error` and `gunicorn.access`.

pub mod access;
pub mod adapter;
pub mod host;

pub use access::{AccessRecord, Environ, ResponseInfo, Status, StatusField};
pub use adapter::{GunicornLogger, ACCESS_LOGGER, ERROR_LOGGER};
pub use host::HostLogger;
