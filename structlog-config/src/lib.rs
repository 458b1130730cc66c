//! Configuration layer for struct_logging
//!
//! Resolves [`LogSettings`] from the process environment (optionally
//! overridden by injected [`HostSettings`]) and assembles the static
//! [`LoggingConfig`]: named formatters, named handlers and the root logger.

pub mod dict_config;
pub mod settings;

pub use dict_config::{
    FormatterConfig, HandlerConfig, LoggingConfig, RendererKind, RootConfig, SinkConfig,
    StreamTarget,
};
pub use settings::{FileFormat, HostSettings, LogSettings};
