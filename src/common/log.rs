//! Logging helpers
//!
//! Thin wrapper over `env_logger` so the binary and tests configure logging the same way.

/// Initialize the global logger
///
/// `RUST_LOG` takes precedence over `level` when it is set.
///
/// # Parameters
///
/// * `level` - Default log level (error, warn, info, debug, trace)
pub fn init_logger(level: &str) {
    let env = env_logger::Env::default()
        .filter_or("RUST_LOG", level);

    // A logger may already be installed when embedded in a host application.
    let _ = env_logger::Builder::from_env(env).try_init();
}
