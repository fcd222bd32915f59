//! Engine tick clock and day-time helpers.
//!
//! The clock counts engine ticks, not host ticks: it advances once per
//! [`Scheduler::run_tick`] call, and the scanner measures its refresh
//! interval against it. Day time, by contrast, is read from the host
//! through the accessor and only interpreted here.
//!
//! [`Scheduler::run_tick`]: crate::scheduler::Scheduler::run_tick

/// Length of one host day in ticks.
pub const DAY_LENGTH: u64 = 24_000;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

/// Monotonic engine tick counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickClock {
    /// Ticks run so far. The first `run_tick` executes tick 1.
    tick: u64,
}

impl TickClock {
    /// Create a clock at tick 0 (no tick run yet).
    pub const fn new() -> Self {
        Self { tick: 0 }
    }

    /// Advance by one tick and return the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }
}

/// Normalise a host time value into `0..DAY_LENGTH`.
pub const fn time_of_day(time: u64) -> u64 {
    time % DAY_LENGTH
}

/// Whether `day_time` lies in the inclusive window `[from, to]`.
///
/// Windows wrap across midnight when `from > to`, so `[13000, 1000]`
/// covers the night. All three values are normalised into one day first.
pub const fn day_time_in_window(day_time: u64, from: u64, to: u64) -> bool {
    let now = time_of_day(day_time);
    let from = time_of_day(from);
    let to = time_of_day(to);
    if from <= to {
        now >= from && now <= to
    } else {
        now >= from || now <= to
    }
}
