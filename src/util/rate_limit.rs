//! Rate limiting utilities

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a rate limiter with the specified events per second
pub fn create_limiter(per_second: u32) -> Limiter {
    let quota = Quota::per_second(NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN));
    RateLimiter::direct(quota)
}

/// Transport failure warnings per second
pub const TRANSPORT_WARN_RATE: u32 = 1;

/// Gate for repetitive log lines on the tick loop.
///
/// Keeps a count of suppressed lines so the next admitted one can report it.
pub struct LogGate {
    limiter: Limiter,
    suppressed: u64,
}

impl LogGate {
    pub fn new(per_second: u32) -> Self {
        Self {
            limiter: create_limiter(per_second),
            suppressed: 0,
        }
    }

    /// `Some(suppressed_since_last)` if this line may be logged
    pub fn admit(&mut self) -> Option<u64> {
        if self.limiter.check().is_ok() {
            Some(std::mem::take(&mut self.suppressed))
        } else {
            self.suppressed += 1;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bursts_are_suppressed_and_counted() {
        let mut gate = LogGate::new(1);
        assert_eq!(gate.admit(), Some(0));
        assert_eq!(gate.admit(), None);
        assert_eq!(gate.admit(), None);
        assert_eq!(gate.suppressed, 2);
    }
}
