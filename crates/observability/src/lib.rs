//! Process-wide tracing setup shared by the varistore binaries.

/// Install the tracing subscriber.
///
/// Safe to call multiple times; only the first call installs anything.
pub fn init() {
    tracing::init();
}

/// Subscriber construction (filters, formatting).
pub mod tracing;
