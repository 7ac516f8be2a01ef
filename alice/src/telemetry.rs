//! Log output setup.
//!
//! All crates in the workspace log through `tracing`. These helpers install
//! a `tracing-subscriber` formatter filtered by `RUST_LOG`, falling back to
//! [`DEFAULT_FILTER`] when it is unset or invalid.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "alice=info";

/// Install a human-readable subscriber writing to stderr.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing() -> bool {
    init_tracing_with_filter(DEFAULT_FILTER)
}

/// Like [`init_tracing`], with a custom fallback filter.
pub fn init_tracing_with_filter(fallback: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(fallback))
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

/// Install a subscriber emitting one JSON object per event on stderr.
pub fn init_json_tracing() -> bool {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter(DEFAULT_FILTER))
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        let _ = init_tracing();
        assert!(!init_tracing());
        assert!(!init_json_tracing());
    }
}
