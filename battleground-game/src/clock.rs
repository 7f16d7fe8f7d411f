//! Time sources for log and exam timestamps.
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Supplies millisecond timestamps to the engine.
pub trait Clock: fmt::Debug + Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Wall-clock time since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or_default()
    }
}

/// Constant time, for deterministic runs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.0
    }
}
