//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system (honours `RUST_LOG`)
pub fn init() {
    env_logger::init();
}

/// Initialize logging for tests; safe to call from every test
pub fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}
