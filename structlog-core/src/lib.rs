//! Foundation types shared by every struct_logging crate.

pub mod error;
pub mod level;

pub use error::{Result, StructLogError};
pub use level::Level;
