//! Tracing and logging setup shared by the Ebonite binaries.

/// Initialize process-wide logging with the default `info` level.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::DEFAULT_FILTER);
}

/// Tracing configuration (filters, subscriber).
pub mod tracing;
