use std::time::Duration;

use serde_json::Value;
use structlog_core::{Level, Result};
use structlog_logging::Fields;

use crate::access::{Environ, ResponseInfo};

/// Logger interface required by the host server's logger-class plugin
///
/// Every leveled method takes a free-form message, positional arguments and
/// keyword fields, and never fails. `access` is called once per finished
/// request.
pub trait HostLogger: Send + Sync {
    fn critical(&self, msg: &str, args: &[Value], fields: Fields);

    fn error(&self, msg: &str, args: &[Value], fields: Fields);

    fn warning(&self, msg: &str, args: &[Value], fields: Fields);

    fn info(&self, msg: &str, args: &[Value], fields: Fields);

    fn debug(&self, msg: &str, args: &[Value], fields: Fields);

    fn exception(&self, msg: &str, args: &[Value], fields: Fields);

    fn log(&self, level: Level, msg: &str, args: &[Value], fields: Fields);

    /// Fails only when the request environment lacks a required key or the
    /// response status is blank.
    fn access(&self, resp: &ResponseInfo, environ: &Environ, request_time: Duration)
        -> Result<()>;

    /// Called on SIGUSR1.
    fn reopen_files(&self);

    /// Called before workers exec.
    fn close_on_exec(&self);
}
