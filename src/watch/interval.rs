use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Default polling floor. LogMeIn does not appreciate being polled faster.
pub const DEFAULT_MINIMUM_INTERVAL: Duration = Duration::from_secs(60);

/// Upper bound for any polling interval. Keeps timer deadlines representable.
pub const MAXIMUM_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

static MINIMUM_INTERVAL_MS: AtomicU64 = AtomicU64::new(60_000);

/// Current process-wide polling floor
pub fn minimum_interval() -> Duration {
    Duration::from_millis(MINIMUM_INTERVAL_MS.load(Ordering::SeqCst))
}

/// Change the process-wide polling floor.
///
/// Affects later clamp decisions only; already running timers keep their
/// interval until they are next reconfigured.
pub fn set_minimum_interval(floor: Duration) {
    let floor = floor.min(MAXIMUM_INTERVAL);
    let millis = u64::try_from(floor.as_millis()).unwrap_or(u64::MAX).max(1);
    MINIMUM_INTERVAL_MS.store(millis, Ordering::SeqCst);
}

/// Raise `requested` to the floor, or lower it to [`MAXIMUM_INTERVAL`]
pub fn clamp_interval(requested: Duration) -> Duration {
    requested.max(minimum_interval()).min(MAXIMUM_INTERVAL)
}
