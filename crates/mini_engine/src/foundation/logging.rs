//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// `RUST_LOG` wins when set; otherwise `default_level` (for example `"info"` or
/// `"mini_engine=debug"`) is used. Calling this twice is harmless, the second
/// call is ignored.
pub fn init(default_level: &str) {
    let env = env_logger::Env::default().default_filter_or(default_level);
    if env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init()
        .is_err()
    {
        log::debug!("Logger already initialized, keeping existing configuration");
    }
}
