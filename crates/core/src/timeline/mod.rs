use std::time::Duration;

/// Handle of a repeating timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Repeating timer capability provided by the host event loop.
///
/// The host reports each expiry back to the owner of the id; the core never
/// blocks or sleeps.
pub trait RepeatingTimer {
    /// Starts a timer that expires every `period`, first after one period.
    fn start(&mut self, period: Duration) -> TimerId;

    /// Stops the timer. Unknown or already cancelled ids are ignored.
    fn cancel(&mut self, id: TimerId);
}

/// One expiry of a [`ManualTimer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Firing {
    pub id: TimerId,
    pub at: Duration,
}

#[derive(Debug, Clone)]
struct Entry {
    id: TimerId,
    period: Duration,
    next_due: Duration,
}

/// Deterministic timer driven by explicit calls instead of the wall clock.
#[derive(Debug, Default)]
pub struct ManualTimer {
    now: Duration,
    next_id: u64,
    entries: Vec<Entry>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn active_timers(&self) -> usize {
        self.entries.len()
    }

    /// Pops the earliest expiry due no later than `deadline` and moves the
    /// clock to it. Expiries at the same instant come out in start order.
    pub fn fire_next(&mut self, deadline: Duration) -> Option<Firing> {
        let entry = self
            .entries
            .iter_mut()
            .filter(|entry| entry.next_due <= deadline)
            .min_by_key(|entry| (entry.next_due, entry.id))?;

        let firing = Firing {
            id: entry.id,
            at: entry.next_due,
        };
        entry.next_due += entry.period;
        self.now = firing.at;
        Some(firing)
    }

    /// Moves the clock forward without firing anything.
    pub fn settle(&mut self, deadline: Duration) {
        self.now = self.now.max(deadline);
    }

    /// Collects every expiry in the next `delta` and moves the clock past it.
    pub fn advance(&mut self, delta: Duration) -> Vec<Firing> {
        let deadline = self.now + delta;
        let mut firings = Vec::new();
        while let Some(firing) = self.fire_next(deadline) {
            firings.push(firing);
        }
        self.settle(deadline);
        firings
    }
}

impl RepeatingTimer for ManualTimer {
    fn start(&mut self, period: Duration) -> TimerId {
        assert!(!period.is_zero(), "timer period must be positive");
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            period,
            next_due: self.now + period,
        });
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.entries.retain(|entry| entry.id != id);
    }
}
