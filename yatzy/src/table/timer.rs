use std::time::Duration;
use tokio::time::Instant;

/// Deadline for the rotation-mode turn holder.
///
/// The timer remembers which turn epoch it was armed for so that an expiry
/// can be checked against the session before it forfeits anyone.
#[derive(Debug)]
pub struct TurnTimer {
    timeout: Duration,
    deadline: Option<Instant>,
    epoch: u64,
}

impl TurnTimer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadline: None,
            epoch: 0,
        }
    }

    /// Arms the timer for `epoch` unless it is already armed for it.
    /// Returns whether a new deadline was set.
    pub fn arm(&mut self, epoch: u64) -> bool {
        if self.deadline.is_some() && self.epoch == epoch {
            return false;
        }
        self.epoch = epoch;
        self.deadline = Some(Instant::now() + self.timeout);
        true
    }

    pub fn clear(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Epoch of the most recent arming.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
