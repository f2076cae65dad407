use std::time::{Duration, Instant};

/// Seconds on the clock at the start of every round
pub const ROUND_SECONDS: u8 = 3;

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Identifies one scheduled countdown tick. A tick is only honoured while its
/// id is still the live one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Scheduled {
    id: TimerId,
    due: Instant,
}

/// Single-slot cancellable timer. Scheduling replaces whatever was pending,
/// so at most one tick is ever outstanding.
#[derive(Debug, Default)]
pub struct Countdown {
    next_id: u64,
    pending: Option<Scheduled>,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any pending tick and schedule a new one `TICK_INTERVAL` after `from`
    pub fn schedule(&mut self, from: Instant) -> TimerId {
        self.cancel();
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending = Some(Scheduled {
            id,
            due: from + TICK_INTERVAL,
        });
        id
    }

    pub fn cancel(&mut self) -> Option<TimerId> {
        self.pending.take().map(|s| s.id)
    }

    pub fn pending(&self) -> Option<TimerId> {
        self.pending.map(|s| s.id)
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.pending.map(|s| s.due)
    }

    /// The pending id, if its deadline has been reached at `now`
    pub fn due(&self, now: Instant) -> Option<TimerId> {
        self.pending.filter(|s| s.due <= now).map(|s| s.id)
    }

    /// Consume the pending tick if `id` is the live one, returning its
    /// deadline. Stale or cancelled ids yield None.
    pub fn fire(&mut self, id: TimerId) -> Option<Instant> {
        match self.pending {
            Some(s) if s.id == id => {
                self.pending = None;
                Some(s.due)
            }
            _ => None,
        }
    }
}
