//! Debounce timer driven by a host-supplied clock.
//!
//! The engine owns no thread or timer. The host passes its own millisecond
//! clock with each event and calls `poll` from its frame loop; the debouncer
//! only remembers a deadline.

/// Collapses a burst of triggers into one firing.
///
/// Every `trigger` pushes the deadline out to `now + delay` (reset, not
/// accumulated), so the action fires once the burst has been quiet for
/// `delay_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debouncer {
    delay_ms: u64,
    deadline: Option<u64>,
}

impl Debouncer {
    /// Create an idle debouncer.
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            deadline: None,
        }
    }

    /// Quiet period required before firing.
    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    /// Record an event at `now_ms`, restarting the quiet period.
    pub fn trigger(&mut self, now_ms: u64) {
        self.deadline = Some(now_ms.saturating_add(self.delay_ms));
    }

    /// True while a firing is scheduled.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// When the pending firing is due, if any.
    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    /// Returns true exactly once per burst, when `now_ms` reaches the deadline.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Drop the pending firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_debouncer_never_fires() {
        let mut debouncer = Debouncer::new(100);
        assert!(!debouncer.is_pending());
        assert!(!debouncer.poll(1_000));
    }

    #[test]
    fn fires_once_after_quiet_period() {
        let mut debouncer = Debouncer::new(100);
        debouncer.trigger(0);
        assert!(!debouncer.poll(99));
        assert!(debouncer.poll(100));
        assert!(!debouncer.poll(200), "fires only once per burst");
    }

    #[test]
    fn each_trigger_resets_the_deadline() {
        let mut debouncer = Debouncer::new(100);
        for now in (0..=500).step_by(50) {
            debouncer.trigger(now);
            assert!(!debouncer.poll(now));
        }
        assert_eq!(debouncer.deadline(), Some(600));
        assert!(!debouncer.poll(599));
        assert!(debouncer.poll(600));
    }

    #[test]
    fn cancel_clears_pending() {
        let mut debouncer = Debouncer::new(100);
        debouncer.trigger(0);
        debouncer.cancel();
        assert!(!debouncer.poll(1_000));
    }

    #[test]
    fn zero_delay_fires_on_next_poll() {
        let mut debouncer = Debouncer::new(0);
        debouncer.trigger(42);
        assert!(debouncer.poll(42));
    }
}
