/// Frame rate policy of a render loop.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum FrameRate {
    /// Draw on every host refresh.
    #[default]
    Uncapped,
    /// Draw at most this many frames per second.
    Capped(u32),
}

impl FrameRate {
    /// Minimum interval between frames in milliseconds, if capped.
    pub fn interval_ms(&self) -> Option<f64> {
        match *self {
            FrameRate::Capped(fps) if fps > 0 => Some(1000.0 / fps as f64),
            _ => None,
        }
    }
}

/// Decides which host refreshes draw a frame.
///
/// Capped rates use an accumulator: a refresh draws once more than one
/// interval has passed since the last drawn frame, and the new baseline keeps
/// the remainder (`last = now - delta % interval`) so the average rate does
/// not drift below the cap.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    rate: FrameRate,
    last: Option<f64>,
}

impl FrameScheduler {
    pub fn new(rate: FrameRate) -> Self {
        Self { rate, last: None }
    }

    pub fn rate(&self) -> FrameRate {
        self.rate
    }

    /// Forgets the baseline; the next refresh only re-establishes it.
    pub fn restart(&mut self) {
        self.last = None;
    }

    /// Earliest time a refresh can draw, for hosts that sleep between
    /// refreshes. `None` when every refresh draws.
    pub fn next_due_ms(&self) -> Option<f64> {
        let interval = self.rate.interval_ms()?;
        Some(self.last.map_or(0.0, |last| last + interval))
    }

    /// Whether the refresh at `now_ms` should draw.
    pub fn due(&mut self, now_ms: f64) -> bool {
        let Some(interval) = self.rate.interval_ms() else {
            return true;
        };
        let Some(last) = self.last else {
            self.last = Some(now_ms);
            return false;
        };

        let delta = now_ms - last;
        if delta > interval {
            self.last = Some(now_ms - delta % interval);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncapped_draws_every_refresh() {
        let mut s = FrameScheduler::new(FrameRate::Uncapped);
        assert!(s.due(0.0));
        assert!(s.due(0.0));
        assert!(s.due(16.7));
    }

    #[test]
    fn zero_fps_counts_as_uncapped() {
        assert_eq!(FrameRate::Capped(0).interval_ms(), None);
        assert!(FrameScheduler::new(FrameRate::Capped(0)).due(1.0));
    }

    #[test]
    fn first_refresh_only_sets_baseline() {
        let mut s = FrameScheduler::new(FrameRate::Capped(10));
        assert!(!s.due(500.0));
        assert!(!s.due(600.0));
        assert!(s.due(601.0));
    }

    #[test]
    fn capped_keeps_the_residual() {
        // 20 fps: 50ms interval.
        let mut s = FrameScheduler::new(FrameRate::Capped(20));
        assert!(!s.due(0.0));
        assert!(s.due(70.0));
        // baseline is 70 - 70 % 50 = 50, so 101 is already due.
        assert!(s.due(101.0));
        assert!(!s.due(140.0));
    }

    #[test]
    fn next_due_follows_the_baseline() {
        assert_eq!(FrameScheduler::new(FrameRate::Uncapped).next_due_ms(), None);

        let mut s = FrameScheduler::new(FrameRate::Capped(20));
        assert_eq!(s.next_due_ms(), Some(0.0));
        s.due(10.0);
        assert_eq!(s.next_due_ms(), Some(60.0));
        assert!(s.due(75.0));
        assert_eq!(s.next_due_ms(), Some(110.0));
    }

    #[test]
    fn restart_drops_the_baseline() {
        let mut s = FrameScheduler::new(FrameRate::Capped(20));
        s.due(0.0);
        s.restart();
        assert!(!s.due(1000.0));
        assert!(s.due(1051.0));
    }
}
