//! Logging setup for binaries and tools built on the render cache

pub use log::{debug, info, warn, error, trace};

/// Initialize logging from `RUST_LOG`, showing `info` and above when it is unset
pub fn init() {
    init_with_default_filter("info");
}

/// Initialize logging with a default filter used when `RUST_LOG` is unset.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_with_default_filter(filter: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .try_init();
}
