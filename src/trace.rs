//! Queue event logging.
//!
//! The queue reports evictions, clears, cancelled consumers and invalidated
//! iterators through `trace!` and `debug!`. They forward to `tracing` when
//! the `tracing` feature is on and expand to nothing otherwise, so the lock's
//! critical sections carry no logging cost by default.

/// Prints queue events to stdout, filtered by `RUST_LOG` (default
/// `recent=trace`).
///
/// Returns false if another global subscriber was installed first, or if the
/// crate was built without the `tracing` feature.
#[cfg(feature = "tracing")]
pub fn init_tracing() -> bool {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("recent=trace"));
    let events = fmt::layer().compact().with_thread_names(true);
    tracing_subscriber::registry().with(events).with(filter).try_init().is_ok()
}

/// Prints queue events to stdout. Always returns false, since the crate was
/// built without the `tracing` feature.
#[cfg(not(feature = "tracing"))]
pub const fn init_tracing() -> bool {
    false
}

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, trace};

#[cfg(not(feature = "tracing"))]
macro_rules! discard {
    ($($event:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use discard as debug;
#[cfg(not(feature = "tracing"))]
pub(crate) use discard as trace;
