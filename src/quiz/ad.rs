use std::time::{Duration, Instant};

/// True when advancing into `next_index` (0-based) should show an ad first.
/// A frequency of zero disables ads entirely.
pub fn should_pause_for_ad(next_index: usize, frequency: usize) -> bool {
    frequency > 0 && next_index > 0 && next_index % frequency == 0
}

/// An interstitial between two questions. Holds the index play resumes at
/// and the delay before the player may dismiss it.
#[derive(Clone, Debug)]
pub struct AdBreak {
    pub resume_index: usize,
    shown_at: Instant,
    dismiss_after: Duration,
}

impl AdBreak {
    pub fn new(resume_index: usize, dismiss_after: Duration, now: Instant) -> Self {
        Self {
            resume_index,
            shown_at: now,
            dismiss_after,
        }
    }

    pub fn can_dismiss(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= self.dismiss_after
    }

    /// Whole seconds left before dismissal, rounded up.
    pub fn secs_until_dismiss(&self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.shown_at);
        let left = self.dismiss_after.saturating_sub(elapsed);
        left.as_millis().div_ceil(1000) as u64
    }
}
