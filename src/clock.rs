//! Timestamp utilities for voxctl
//!
//! Worker recency is stamped in milliseconds since the Unix epoch, but the
//! stamps handed out by [`StampClock`] are strictly increasing so that two
//! releases inside the same millisecond still order deterministically.

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Strictly increasing wall-clock stamps
#[derive(Debug, Default, Clone)]
pub struct StampClock {
    last: u64,
}

impl StampClock {
    /// Create a clock that has not issued any stamp yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Next stamp: the current time, or one past the previous stamp if the
    /// wall clock has not advanced (or went backwards)
    pub fn next(&mut self) -> u64 {
        let now = now_ms().max(self.last + 1);
        self.last = now;
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_ms_returns_reasonable_timestamp() {
        let ts = now_ms();
        // Should be after 2020-01-01 and before 2100-01-01
        assert!(ts > 1577836800000);
        assert!(ts < 4102444800000);
    }

    #[test]
    fn test_stamp_clock_strictly_increasing() {
        let mut clock = StampClock::new();
        let mut prev = 0;
        for _ in 0..1000 {
            let stamp = clock.next();
            assert!(stamp > prev);
            prev = stamp;
        }
    }

    #[test]
    fn test_stamp_clock_never_goes_backwards() {
        let mut clock = StampClock { last: u64::MAX - 10 };
        assert_eq!(clock.next(), u64::MAX - 9);
        assert_eq!(clock.next(), u64::MAX - 8);
    }
}
