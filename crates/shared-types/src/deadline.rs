//! # Deadline Helpers
//!
//! A deadline is an absolute point in time after which a pending or future
//! I/O call on a connection fails instead of blocking. Idle timeouts are
//! implemented by pushing the deadline forward after every successful
//! read or write.

use std::time::{Duration, Instant};

/// Compute the next deadline `idle` from now.
///
/// Saturates at a far-future instant instead of panicking when `idle` is
/// too large to represent.
#[must_use]
pub fn future_deadline(idle: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(idle)
        .unwrap_or_else(|| now + Duration::from_secs(60 * 60 * 24 * 365))
}

/// Time left until `deadline`, or zero if it already passed.
#[must_use]
pub fn remaining(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}
