//! Client-side clock synchronization.
//!
//! Countdown and round timers are never driven by a local interval counter:
//! remaining time is always `deadline - estimated server time`, so drift
//! cannot accumulate. The offset estimate only ever improves; a calibration
//! with a looser confidence bound than the current one is ignored until a
//! full reconnect resets the state.

/// Assumed worst-case one-way delivery latency for a bare server timestamp
const TIMESTAMP_BOUND_MILLIS: i64 = 500;

/// Estimate of `server_time - local_time` for one client
#[derive(Debug, Clone, Copy)]
pub struct ClockSync {
    offset_millis: i64,
    bound_millis: i64,
    calibrated: bool,
}

impl Default for ClockSync {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSync {
    pub fn new() -> Self {
        Self {
            offset_millis: 0,
            bound_millis: i64::MAX,
            calibrated: false,
        }
    }

    /// Calibrate from a server timestamp delivered with a push message.
    pub fn calibrate_from_timestamp(&mut self, server_now: i64, local_now: i64) {
        self.apply(server_now - local_now, TIMESTAMP_BOUND_MILLIS);
    }

    /// Calibrate from a round-trip request: one-way latency is assumed to be
    /// half the measured round-trip time.
    pub fn calibrate_from_round_trip(&mut self, server_now: i64, rtt_millis: i64, local_now: i64) {
        let half = (rtt_millis / 2).max(1);
        self.apply(server_now + half - local_now, half);
    }

    fn apply(&mut self, offset: i64, bound: i64) {
        if self.calibrated && bound > self.bound_millis {
            return;
        }
        self.offset_millis = offset;
        self.bound_millis = bound;
        self.calibrated = true;
    }

    /// Discard the calibration after a full reconnect.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    pub fn offset_millis(&self) -> i64 {
        self.offset_millis
    }

    pub fn error_bound_millis(&self) -> i64 {
        self.bound_millis
    }

    pub fn server_time(&self, local_now: i64) -> i64 {
        local_now + self.offset_millis
    }

    /// Time left until `deadline` in server time, clamped at zero.
    pub fn remaining_millis(&self, deadline: i64, local_now: i64) -> i64 {
        (deadline - self.server_time(local_now)).max(0)
    }

    pub fn has_expired(&self, deadline: i64, local_now: i64) -> bool {
        self.remaining_millis(deadline, local_now) == 0
    }

    pub fn is_hurry_up(&self, deadline: i64, threshold_millis: i64, local_now: i64) -> bool {
        self.remaining_millis(deadline, local_now) <= threshold_millis
    }
}
