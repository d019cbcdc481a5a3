use std::time::{Duration, Instant};

/// Trailing-edge debounce: each trigger cancels the previous schedule and
/// restarts the quiet window, so a burst collapses into one firing after
/// the last trigger. Each call site owns its own instance.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// True exactly once per quiet window, when it has elapsed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_after_quiet_window() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(300));
        d.trigger(t0);
        assert!(!d.fire(t0 + Duration::from_millis(299)));
        assert!(d.fire(t0 + Duration::from_millis(300)));
        assert!(!d.fire(t0 + Duration::from_millis(301)));
    }

    #[test]
    fn burst_collapses_to_trailing_edge() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(300));
        d.trigger(t0);
        d.trigger(t0 + Duration::from_millis(200));
        d.trigger(t0 + Duration::from_millis(400));
        // The first two schedules were superseded.
        assert!(!d.fire(t0 + Duration::from_millis(600)));
        assert!(d.fire(t0 + Duration::from_millis(700)));
    }

    #[test]
    fn instances_are_independent() {
        let t0 = Instant::now();
        let mut search = Debouncer::new(Duration::from_millis(300));
        let mut sort = Debouncer::new(Duration::from_millis(200));
        search.trigger(t0);
        sort.trigger(t0);
        assert!(sort.fire(t0 + Duration::from_millis(200)));
        assert!(!search.fire(t0 + Duration::from_millis(200)));
        assert!(search.fire(t0 + Duration::from_millis(300)));
    }

    #[test]
    fn cancel_discards_pending_schedule() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(100));
        d.trigger(t0);
        d.cancel();
        assert!(!d.fire(t0 + Duration::from_millis(200)));
    }
}
