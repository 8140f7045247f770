//! Tracing subscriber setup.
//!
//! - INFO: attach/close of links
//! - DEBUG: credit reissue, terminus configuration, cursor moves
//! - TRACE: encoded filter bytes

use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins over the CLI flags when it is set.
pub fn init(debug: bool, trace: bool) {
    let default_level = if trace {
        "trace"
    } else if debug {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
