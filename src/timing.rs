//! Elapsed time between readings of a free-running, wrapping tick counter.

use std::time::Instant;

/// Unsigned counter that wraps to zero after its maximum value.
pub trait TickCounter: Copy {
    /// Ticks from `earlier` to `self`, assuming at most one wrap in between.
    fn ticks_since(self, earlier: Self) -> u64;
}

macro_rules! tick_counter {
    ($($t:ty),*) => {
        $(
            impl TickCounter for $t {
                fn ticks_since(self, earlier: Self) -> u64 {
                    // modular difference: equals current + (MAX - last) + 1 after a wrap
                    self.wrapping_sub(earlier) as u64
                }
            }
        )*
    };
}

tick_counter!(u16, u32, u64);

/// Anything that can be read for the current tick count.
pub trait TimeSource {
    type Tick: TickCounter;

    fn now(&mut self) -> Self::Tick;
}

/// Remembers the last timestamp and turns each new one into seconds.
///
/// Every call consumes the interval up to `current`, whether or not the
/// caller ends up applying a correction for that sample.
#[derive(Debug, Clone)]
pub struct DeltaTracker<T> {
    last: T,
    ticks_per_second: f64,
}

impl<T: TickCounter> DeltaTracker<T> {
    pub fn new(start: T, ticks_per_second: u32) -> Self {
        DeltaTracker {
            last: start,
            ticks_per_second: f64::from(ticks_per_second),
        }
    }

    pub fn reset(&mut self, now: T) {
        self.last = now;
    }

    pub fn last(&self) -> T {
        self.last
    }

    /// Whole-step elapsed time in seconds since the previous call.
    pub fn elapsed(&mut self, current: T) -> f32 {
        let ticks = current.ticks_since(self.last);
        self.last = current;
        (ticks as f64 / self.ticks_per_second) as f32
    }

    /// Half of [`elapsed`](Self::elapsed), for integrators written against
    /// the half-angle rate.
    pub fn elapsed_half(&mut self, current: T) -> f32 {
        let ticks = current.ticks_since(self.last);
        self.last = current;
        (ticks as f64 / (2.0 * self.ticks_per_second)) as f32
    }
}

/// Host microsecond clock, wrapping at `u32::MAX` like a hardware timer.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    type Tick = u32;

    fn now(&mut self) -> u32 {
        // truncation is the wrap
        self.epoch.elapsed().as_micros() as u32
    }
}
