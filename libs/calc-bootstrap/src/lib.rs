#![forbid(unsafe_code)]
//! Process bootstrap shared by the calculator binaries.

pub mod config;
pub mod humantime_serde;
pub mod logging;
pub mod signals;

pub use config::{ConfigError, load_layered, to_yaml};
pub use logging::{LogFormat, LoggingConfig, init_logging};
pub use signals::wait_for_shutdown;
