use std::fmt;

use crate::utils::clock::MonotonicClock;

/// Sampling period used by the timer logger demo
const LOOP_DELAY_MS: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggerConfig {
    pub interval_ms: u32,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        LoggerConfig { interval_ms: LOOP_DELAY_MS }
    }
}

/// One reading of the clock: the time since boot and the time since the
/// previous reading, both in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSample {
    pub elapsed_us: i64,
    pub sample_us: i64,
}

impl fmt::Display for TimeSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Elapsed time: {:>8} us \tSample time:  {:>8} us", self.elapsed_us, self.sample_us)
    }
}

/// Reads a monotonic clock and reports how much time went by between reads
pub struct TimestampLogger<C: MonotonicClock> {
    clock: C,
    last_time: i64,
}

impl<C: MonotonicClock> TimestampLogger<C> {
    /// The previous reading starts at zero, so the first sample time is the
    /// whole time since boot
    pub fn new(clock: C) -> Self {
        TimestampLogger { clock, last_time: 0 }
    }

    pub fn sample(&mut self) -> TimeSample {
        let new_time = self.clock.now_us();
        let sample = TimeSample {
            elapsed_us: new_time,
            sample_us: new_time - self.last_time,
        };
        self.last_time = new_time;
        sample
    }
}
