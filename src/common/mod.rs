//! Common module
//!
//! Shared errors, logging setup and file helpers used throughout the crate.

pub mod error;
pub mod fs;
pub mod log;

pub use error::{Result, TlsError};
pub use fs::{check_file_exists, read_file, resolve_path};
pub use log::init_logger;
