//! Global initialization. Kept in its own test binary because the
//! process-wide subscriber can only be installed once.

use structlog_config::{LogSettings, LoggingConfig};
use structlog_core::StructLogError;
use structlog_logging::{fields, BoundLogger};

#[test]
fn test_init_applies_exactly_once() {
    let settings = LogSettings {
        debug: true,
        ..LogSettings::default()
    };
    let config = LoggingConfig::from_settings(&settings);

    let provider = structlog_logging::init(&config).unwrap();
    assert_eq!(provider.handlers(), ["development".to_string()]);
    assert!(structlog_logging::provider().is_some());

    let log = provider.get_logger("app");
    assert_eq!(log.name(), "app");
    log.info("initialized", &[], fields! { "handlers" => 1 });

    let second = structlog_logging::init(&config);
    assert!(matches!(second, Err(StructLogError::AlreadyInitialized)));
}
