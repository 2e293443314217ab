// ============================================================================
// STRIKE-THROUGH ANIMATION
// ============================================================================

use std::time::{Duration, Instant};

/// Linear interpolation of the strike-through progress toward 0 or 1.
#[derive(Debug, Clone)]
pub struct StrikeAnimator {
    duration: Duration,
    target: bool,
    value: f32,
    transition: Option<Transition>,
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    from: f32,
    to: f32,
    started: Instant,
}

impl StrikeAnimator {
    /// Starts at rest with progress 0.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            target: false,
            value: 0.0,
            transition: None,
        }
    }

    pub fn target(&self) -> bool {
        self.target
    }

    pub fn is_running(&self) -> bool {
        self.transition.is_some()
    }

    /// Last sampled progress, without advancing time.
    pub fn progress(&self) -> f32 {
        self.value
    }

    /// Retargets the animation, continuing from wherever it currently is.
    pub fn set_target(&mut self, on: bool, now: Instant) {
        let current = self.sample(now);
        let to = if on { 1.0 } else { 0.0 };
        self.target = on;

        if current == to {
            self.transition = None;
            return;
        }
        self.transition = Some(Transition {
            from: current,
            to,
            started: now,
        });
    }

    /// Advances to `now` and returns the progress. A finished transition
    /// holds its end value.
    pub fn sample(&mut self, now: Instant) -> f32 {
        let Some(t) = self.transition else {
            return self.value;
        };

        let elapsed = now.saturating_duration_since(t.started);
        if self.duration.is_zero() || elapsed >= self.duration {
            self.value = t.to;
            self.transition = None;
        } else {
            let k = elapsed.as_secs_f32() / self.duration.as_secs_f32();
            self.value = t.from + (t.to - t.from) * k;
        }
        self.value
    }

    /// Skips the running transition, if any.
    pub fn jump_to_end(&mut self) {
        self.value = if self.target { 1.0 } else { 0.0 };
        self.transition = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DURATION: Duration = Duration::from_millis(200);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn starts_at_rest() {
        let mut a = StrikeAnimator::new(DURATION);
        assert_eq!(a.sample(Instant::now()), 0.0);
        assert!(!a.is_running());
        assert!(!a.target());
    }

    #[test]
    fn interpolates_linearly_then_stops() {
        let t0 = Instant::now();
        let mut a = StrikeAnimator::new(DURATION);
        a.set_target(true, t0);

        assert!(a.is_running());
        assert!((a.sample(t0 + ms(50)) - 0.25).abs() < 1e-3);
        assert!((a.sample(t0 + ms(100)) - 0.5).abs() < 1e-3);
        assert_eq!(a.sample(t0 + ms(500)), 1.0);
        assert!(!a.is_running());
        assert_eq!(a.sample(t0 + ms(900)), 1.0);
    }

    #[test]
    fn retarget_continues_from_current_progress() {
        let t0 = Instant::now();
        let mut a = StrikeAnimator::new(DURATION);
        a.set_target(true, t0);
        a.set_target(false, t0 + ms(100));

        assert!((a.progress() - 0.5).abs() < 1e-3);
        let later = a.sample(t0 + ms(150));
        assert!(later < 0.5 && later > 0.0, "went to {later}");
        assert_eq!(a.sample(t0 + ms(300)), 0.0);
    }

    #[test]
    fn same_target_mid_flight_keeps_position() {
        let t0 = Instant::now();
        let mut a = StrikeAnimator::new(DURATION);
        a.set_target(true, t0);
        a.set_target(true, t0 + ms(100));

        let p = a.sample(t0 + ms(100));
        assert!((p - 0.5).abs() < 1e-3, "restarted at {p}");
        assert!(a.sample(t0 + ms(150)) > 0.5);
    }

    #[test]
    fn setting_current_endpoint_is_idle() {
        let mut a = StrikeAnimator::new(DURATION);
        a.set_target(false, Instant::now());
        assert!(!a.is_running());
        assert_eq!(a.progress(), 0.0);
    }

    #[test]
    fn jump_to_end_snaps() {
        let t0 = Instant::now();
        let mut a = StrikeAnimator::new(DURATION);
        a.set_target(true, t0);
        a.jump_to_end();
        assert!(!a.is_running());
        assert_eq!(a.sample(t0), 1.0);
    }

    #[test]
    fn zero_duration_is_immediate() {
        let t0 = Instant::now();
        let mut a = StrikeAnimator::new(Duration::ZERO);
        a.set_target(true, t0);
        assert_eq!(a.sample(t0), 1.0);
    }

    proptest! {
        #[test]
        fn progress_stays_in_range_and_never_overshoots(steps in proptest::collection::vec((any::<bool>(), 0u64..400), 1..20)) {
            let t0 = Instant::now();
            let mut a = StrikeAnimator::new(DURATION);
            let mut elapsed = 0;
            for (on, dt) in steps {
                elapsed += dt;
                a.set_target(on, t0 + ms(elapsed));
                let p = a.sample(t0 + ms(elapsed + dt / 2));
                prop_assert!((0.0..=1.0).contains(&p));
            }
            elapsed += 1000;
            let end = if a.target() { 1.0 } else { 0.0 };
            prop_assert_eq!(a.sample(t0 + ms(elapsed)), end);
        }
    }
}
