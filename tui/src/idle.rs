use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleState {
    Awake,
    /// Rendered with a muted palette.
    Dim,
    /// Nothing is rendered.
    Dark,
}

/// Screen saver timing. Time is passed in so the transitions can be checked
/// without waiting.
#[derive(Debug, Clone)]
pub struct IdleTracker {
    dim_after: Duration,
    dark_after: Duration,
    last_activity: Instant,
}

impl IdleTracker {
    pub fn new(dim_after: Duration, dark_after: Duration, now: Instant) -> Self {
        Self {
            dim_after,
            dark_after: dark_after.max(dim_after),
            last_activity: now,
        }
    }

    pub fn state(&self, now: Instant) -> IdleState {
        let idle = now.saturating_duration_since(self.last_activity);
        if idle >= self.dark_after {
            IdleState::Dark
        } else if idle >= self.dim_after {
            IdleState::Dim
        } else {
            IdleState::Awake
        }
    }

    /// Records user activity. Returns true when the panel was dark: that key
    /// press only wakes it up and must not act on anything.
    pub fn touch(&mut self, now: Instant) -> bool {
        let was_dark = self.state(now) == IdleState::Dark;
        self.last_activity = now;
        was_dark
    }
}
