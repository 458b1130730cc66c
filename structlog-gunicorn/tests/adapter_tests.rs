//! Tests for the host logger adapter: forwarding, access records and the
//! file-handle lifecycle hooks.

use std::sync::Mutex;
use std::time::Duration;

use serde_json::{json, Value};
use structlog_core::{Level, StructLogError};
use structlog_gunicorn::{Environ, GunicornLogger, HostLogger, ResponseInfo};
use structlog_logging::{fields, BoundLogger, Fields};

#[derive(Debug, Clone, PartialEq)]
struct Call {
    method: &'static str,
    level: Option<Level>,
    msg: String,
    args: Vec<Value>,
    fields: Fields,
}

/// Records every call by method name instead of emitting anything
#[derive(Default)]
struct RecordingLogger {
    calls: Mutex<Vec<Call>>,
}

impl RecordingLogger {
    fn record(
        &self,
        method: &'static str,
        level: Option<Level>,
        msg: &str,
        args: &[Value],
        fields: Fields,
    ) {
        self.calls.lock().unwrap().push(Call {
            method,
            level,
            msg: msg.to_string(),
            args: args.to_vec(),
            fields,
        });
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl BoundLogger for RecordingLogger {
    fn log(&self, level: Level, msg: &str, args: &[Value], fields: Fields) {
        self.record("log", Some(level), msg, args, fields);
    }

    fn critical(&self, msg: &str, args: &[Value], fields: Fields) {
        self.record("critical", None, msg, args, fields);
    }

    fn error(&self, msg: &str, args: &[Value], fields: Fields) {
        self.record("error", None, msg, args, fields);
    }

    fn warning(&self, msg: &str, args: &[Value], fields: Fields) {
        self.record("warning", None, msg, args, fields);
    }

    fn info(&self, msg: &str, args: &[Value], fields: Fields) {
        self.record("info", None, msg, args, fields);
    }

    fn debug(&self, msg: &str, args: &[Value], fields: Fields) {
        self.record("debug", None, msg, args, fields);
    }

    fn exception(&self, msg: &str, args: &[Value], fields: Fields) {
        self.record("exception", None, msg, args, fields);
    }
}

fn adapter() -> GunicornLogger<RecordingLogger> {
    GunicornLogger::with_loggers(RecordingLogger::default(), RecordingLogger::default())
}

fn request_environ() -> Environ {
    Environ::new()
        .with("REQUEST_METHOD", "GET")
        .with("RAW_URI", "/missing?x=1")
        .with("SERVER_SOFTWARE", "gunicorn/21.2.0")
}

#[test]
fn test_each_method_forwards_unmodified() {
    let logger = adapter();
    let args = vec![json!("worker"), json!(7), json!(null)];
    let extra = fields! { "worker_id" => 7, "signal" => "TERM" };

    logger.critical("critical %s %d %s", &args, extra.clone());
    logger.error("error %s %d %s", &args, extra.clone());
    logger.warning("warning %s %d %s", &args, extra.clone());
    logger.info("info %s %d %s", &args, extra.clone());
    logger.debug("debug %s %d %s", &args, extra.clone());
    logger.exception("exception %s %d %s", &args, extra.clone());
    logger.log(Level::Warning, "log %s %d %s", &args, extra.clone());

    let calls = logger.error_logger().calls();
    let methods: Vec<&str> = calls.iter().map(|c| c.method).collect();
    assert_eq!(
        methods,
        vec!["critical", "error", "warning", "info", "debug", "exception", "log"]
    );

    for call in &calls {
        assert_eq!(call.msg, format!("{} %s %d %s", call.method));
        assert_eq!(call.args, args);
        assert_eq!(call.fields, extra);
    }
    assert_eq!(calls[6].level, Some(Level::Warning));
    assert!(logger.access_logger().calls().is_empty());
}

#[test]
fn test_access_with_status_line_emits_leading_token() {
    let logger = adapter();
    logger
        .access(
            &ResponseInfo::new("404 Not Found", Some(232)),
            &request_environ(),
            Duration::new(1, 20_000),
        )
        .unwrap();

    let calls = logger.access_logger().calls();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call.method, "info");
    assert_eq!(call.msg, "request");
    assert!(call.args.is_empty());
    assert_eq!(call.fields["status"], json!("404"));
    assert_eq!(call.fields["method"], "GET");
    assert_eq!(call.fields["request_uri"], "/missing?x=1");
    assert_eq!(call.fields["response_length"], 232);
    assert_eq!(call.fields["request_time_seconds"], "1.000020");
    assert_eq!(
        call.fields["pid"],
        json!(format!("<{}>", std::process::id()))
    );
    assert!(logger.error_logger().calls().is_empty());
}

#[test]
fn test_access_with_numeric_status_is_unchanged() {
    let logger = adapter();
    logger
        .access(
            &ResponseInfo::new(200u16, None),
            &request_environ(),
            Duration::from_micros(1500),
        )
        .unwrap();

    let call = &logger.access_logger().calls()[0];
    assert_eq!(call.fields["status"], json!(200));
    assert!(call.fields["status"].is_u64());
    assert_eq!(call.fields["response_length"], Value::Null);
    assert_eq!(call.fields["request_time_seconds"], "0.001500");
}

#[test]
fn test_access_propagates_missing_environ_key() {
    let logger = adapter();
    let environ = Environ::new().with("REQUEST_METHOD", "GET");
    let result = logger.access(
        &ResponseInfo::new(200u16, None),
        &environ,
        Duration::ZERO,
    );

    assert!(matches!(result, Err(StructLogError::MissingEnviron(ref key)) if key == "RAW_URI"));
    assert!(logger.access_logger().calls().is_empty());
}

#[test]
fn test_lifecycle_hooks_are_no_ops() {
    let logger = adapter();
    for _ in 0..3 {
        logger.reopen_files();
        logger.close_on_exec();
    }
    assert!(logger.error_logger().calls().is_empty());
    assert!(logger.access_logger().calls().is_empty());
}

#[test]
fn test_adapter_is_usable_as_trait_object() {
    let logger: Box<dyn HostLogger> = Box::new(adapter());
    logger.info("Booting worker", &[], fields! {});
    logger.reopen_files();
}
