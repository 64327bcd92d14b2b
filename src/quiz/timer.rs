use std::time::{Duration, Instant};

/// Exam countdown in whole seconds.
///
/// The countdown only moves while armed. `tick` converts the wall time since
/// the last anchor into whole-second decrements and carries the remainder, so
/// the event loop can tick it at any rate. A tick delivered while disarmed is
/// ignored.
#[derive(Clone, Debug)]
pub struct Countdown {
    total_secs: u32,
    remaining_secs: u32,
    anchor: Option<Instant>,
}

impl Countdown {
    pub fn new(total_secs: u32) -> Self {
        Self {
            total_secs,
            remaining_secs: total_secs,
            anchor: None,
        }
    }

    pub fn reset(&mut self, total_secs: u32) {
        self.total_secs = total_secs;
        self.remaining_secs = total_secs;
        self.anchor = None;
    }

    pub fn arm(&mut self, now: Instant) {
        if self.anchor.is_none() {
            self.anchor = Some(now);
        }
    }

    pub fn disarm(&mut self) {
        self.anchor = None;
    }

    pub fn is_armed(&self) -> bool {
        self.anchor.is_some()
    }

    /// Advance the countdown to `now`. Returns true when this tick brought
    /// it to zero.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(anchor) = self.anchor else {
            return false;
        };
        if self.remaining_secs == 0 {
            return false;
        }

        let elapsed = now.saturating_duration_since(anchor);
        let whole = elapsed.as_secs();
        if whole == 0 {
            return false;
        }

        let step = whole.min(u64::from(self.remaining_secs)) as u32;
        self.remaining_secs -= step;
        self.anchor = Some(anchor + Duration::from_secs(whole));

        if self.remaining_secs == 0 {
            self.anchor = None;
            return true;
        }
        false
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    pub fn remaining_ratio(&self) -> f64 {
        if self.total_secs == 0 {
            return 0.0;
        }
        self.remaining_secs as f64 / self.total_secs as f64
    }
}

/// Format seconds as `mm:ss`. Minutes are not wrapped into hours.
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
