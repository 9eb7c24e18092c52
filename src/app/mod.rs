//! Application module
//!
//! Application-level functionality: configuration, logging setup and
//! fatal error reporting.

pub mod config;
pub mod error_handling;
pub mod logging;

pub use config::AppConfig;
pub use error_handling::{fatal_exit_code, handle_fatal_error};
pub use logging::init_logging;
