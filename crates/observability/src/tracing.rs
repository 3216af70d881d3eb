//! Subscriber setup for the `ebonite-api` server.
//!
//! `main` installs it before the stores are built, so the Postgres
//! repository spans and the client's push/build/delete events all land on
//! stdout as one JSON object per line. `RUST_LOG=ebonite_client=debug`
//! narrows output to the client; without `RUST_LOG` the server logs at
//! `info`.

use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Build the filter from `RUST_LOG`, or from `default_directive` if unset.
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Install the JSON subscriber for the server process.
///
/// Safe to call multiple times (subsequent calls are no-ops). Returns `false`
/// if a global subscriber was already installed.
pub fn init(default_directive: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_directive))
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_noop() {
        init(DEFAULT_FILTER);
        assert!(!init("debug"));
    }
}
