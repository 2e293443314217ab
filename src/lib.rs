// ============================================================================
// CRATE CONFIGURATION & IMPORTS
// ============================================================================

//! A wifi signal-strength glyph: a pie wedge filled in proportion to the
//! signal level, with an animated strike-through when the connection drops.
//!
//! [`WifiSignalView`] is the embeddable component. It renders into any RGBA8
//! frame buffer and talks to its surroundings through the [`Host`] trait;
//! [`WifiSignalView::show`] runs it in a window of its own.

pub mod animator;
pub mod config;
pub mod error;
pub mod geometry;
pub mod host;
pub mod poller;
pub mod raster;
pub mod renderer;
pub mod signal;
pub mod window;

pub use animator::StrikeAnimator;
pub use config::{Color, GlyphConfig, WindowConfig, LEVELS};
pub use error::{GlyphError, Result, ScheduleError};
pub use host::{Host, TimerHandle};
pub use poller::{GlyphTarget, PollContext, SignalPoller};
pub use renderer::{Bounds, Canvas, GlyphRenderer, GlyphStyle};
pub use signal::{
    FixedSignal, PipeSignal, RandomWalkSignal, ScriptedSignal, SignalError, SignalSample,
    SignalSource,
};

use std::time::Instant;

// ============================================================================
// PUBLIC API - MAIN INTERFACE
// ============================================================================

/// Layout constraint for one axis, as handed down by the host layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureSpec {
    Exactly(u32),
    AtMost(u32),
    Unspecified,
}

/// One wifi glyph together with its animation and polling state.
pub struct WifiSignalView<S> {
    renderer: GlyphRenderer,
    animator: StrikeAnimator,
    poller: SignalPoller,
    source: S,
}

impl<S: SignalSource> WifiSignalView<S> {
    pub fn new(config: &GlyphConfig, source: S) -> Self {
        let mut animator = StrikeAnimator::new(config.strike_duration);
        animator.set_target(
            config.initial_strike_through && !config.preview,
            Instant::now(),
        );
        animator.jump_to_end();

        Self {
            renderer: GlyphRenderer::new(config),
            animator,
            poller: SignalPoller::new(config),
            source,
        }
    }

    pub fn fill(&self) -> f32 {
        self.renderer.fill()
    }

    pub fn strike_target(&self) -> bool {
        self.animator.target()
    }

    pub fn strike_progress(&self) -> f32 {
        self.animator.progress()
    }

    /// Whether the signal is being sampled periodically right now.
    pub fn is_polling(&self) -> bool {
        self.poller.is_running()
    }

    pub fn renderer(&self) -> &GlyphRenderer {
        &self.renderer
    }

    pub fn poller(&self) -> &SignalPoller {
        &self.poller
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    pub fn on_visibility_changed(&mut self, visible: bool, now: Instant, host: &mut dyn Host) {
        self.with_poller(now, host, |p, cx| p.on_visibility_changed(visible, cx));
    }

    pub fn on_shown_changed(&mut self, shown: bool, now: Instant, host: &mut dyn Host) {
        self.with_poller(now, host, |p, cx| p.on_shown_changed(shown, cx));
    }

    pub fn on_detached(&mut self, now: Instant, host: &mut dyn Host) {
        self.with_poller(now, host, |p, cx| p.on_detached(cx));
    }

    pub fn on_timer(&mut self, handle: TimerHandle, now: Instant, host: &mut dyn Host) -> bool {
        self.with_poller(now, host, |p, cx| p.on_timer(handle, cx))
    }

    pub fn on_bounds_changed(&mut self, bounds: Bounds, host: &mut dyn Host) {
        if self.renderer.set_bounds(bounds) {
            host.request_redraw();
        }
    }

    /// Once per event-loop iteration: retries a failed timer and steps the
    /// strike animation. Returns whether an animation is still in flight.
    pub fn pump(&mut self, now: Instant, host: &mut dyn Host) -> bool {
        self.poller.rearm(host);

        if self.animator.is_running() {
            let before = self.animator.progress();
            if self.animator.sample(now) != before {
                host.request_redraw();
            }
        }
        self.animator.is_running()
    }

    /// When the last timer could not be armed, the moment `pump` should run
    /// again to retry it.
    pub fn retry_deadline(&self, now: Instant) -> Option<Instant> {
        self.poller
            .needs_rearm()
            .then(|| now + self.poller.interval())
    }

    /// Skips any running strike animation.
    pub fn jump_to_current_state(&mut self, host: &mut dyn Host) {
        if self.animator.is_running() {
            self.animator.jump_to_end();
            host.request_redraw();
        }
    }

    // ------------------------------------------------------------------------
    // Manual control
    // ------------------------------------------------------------------------

    pub fn start(&mut self, now: Instant, host: &mut dyn Host) {
        self.with_poller(now, host, |p, cx| p.start(cx));
    }

    pub fn stop(&mut self, now: Instant, host: &mut dyn Host) {
        self.with_poller(now, host, |p, cx| p.stop(cx));
    }

    /// Shows `fraction` (clamped to `[0, 1]`) and stops polling.
    pub fn set_level(&mut self, fraction: f32, now: Instant, host: &mut dyn Host) {
        self.with_poller(now, host, |p, cx| p.set_level(fraction, cx));
    }

    /// Shows the struck-through empty glyph and stops polling.
    pub fn set_disconnected(&mut self, now: Instant, host: &mut dyn Host) {
        self.with_poller(now, host, |p, cx| p.set_disconnected(cx));
    }

    pub fn set_fill_color(&mut self, color: Color, host: &mut dyn Host) {
        self.renderer.set_fill_color(color);
        host.request_redraw();
    }

    pub fn set_background_color(&mut self, color: Color, host: &mut dyn Host) {
        self.renderer.set_background_color(color);
        host.request_redraw();
    }

    // ------------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------------

    pub fn render(&mut self, canvas: &mut Canvas, now: Instant) {
        let progress = self.animator.sample(now);
        self.renderer.render(canvas, progress);
    }

    /// Desired size for the given constraints, at least 24 logical pixels
    /// per side unless the layout says otherwise.
    pub fn measure(&self, width: MeasureSpec, height: MeasureSpec, scale_factor: f64) -> (u32, u32) {
        let suggested = (config::MIN_LOGICAL_SIZE as f64 * scale_factor).max(0.0) as u32;
        let resolve = |spec: MeasureSpec| match spec {
            MeasureSpec::Exactly(size) => size,
            MeasureSpec::AtMost(size) => suggested.min(size),
            MeasureSpec::Unspecified => suggested,
        };
        (resolve(width), resolve(height))
    }

    fn with_poller<R>(
        &mut self,
        now: Instant,
        host: &mut dyn Host,
        f: impl FnOnce(&mut SignalPoller, &mut PollContext) -> R,
    ) -> R {
        let mut glyph = Glyph {
            renderer: &mut self.renderer,
            animator: &mut self.animator,
            now,
            changed: false,
        };
        let result = {
            let mut cx = PollContext {
                source: &mut self.source,
                target: &mut glyph,
                host: &mut *host,
            };
            f(&mut self.poller, &mut cx)
        };
        if glyph.changed {
            host.request_redraw();
        }
        result
    }
}

// ============================================================================
// INTERNAL IMPLEMENTATION
// ============================================================================

/// Applies poller decisions to the renderer and animator.
struct Glyph<'a> {
    renderer: &'a mut GlyphRenderer,
    animator: &'a mut StrikeAnimator,
    now: Instant,
    changed: bool,
}

impl GlyphTarget for Glyph<'_> {
    fn show_fill(&mut self, fraction: f32) {
        self.renderer.set_fill(fraction);
        self.changed = true;
    }

    fn show_strike(&mut self, on: bool) {
        self.animator.set_target(on, self.now);
        self.changed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poller::tests::RecordingHost;
    use std::time::Duration;

    fn view(samples: impl IntoIterator<Item = SignalSample>) -> WifiSignalView<ScriptedSignal> {
        WifiSignalView::new(&GlyphConfig::default(), ScriptedSignal::from_samples(samples))
    }

    #[test]
    fn starts_with_configured_state() {
        let v = view([]);
        assert_eq!(v.fill(), 0.8);
        assert!(!v.strike_target());
        assert!(!v.is_polling());
        assert!(v.poller().is_start_requested());
    }

    #[test]
    fn initial_strike_does_not_animate_in() {
        let config = GlyphConfig::builder().initial_strike_through(true).build();
        let v = WifiSignalView::new(&config, FixedSignal(SignalSample::Disconnected));
        assert!(v.strike_target());
        assert_eq!(v.strike_progress(), 1.0);
    }

    #[test]
    fn level_two_fills_half() {
        let mut host = RecordingHost::default();
        let mut v = view([SignalSample::Level(2)]);
        v.on_visibility_changed(true, Instant::now(), &mut host);

        assert!(v.is_polling());
        assert_eq!(v.fill(), 0.5);
        assert!(host.redraws > 0);
    }

    #[test]
    fn disconnect_animates_strike_through() {
        let t0 = Instant::now();
        let mut host = RecordingHost::default();
        let mut v = view([SignalSample::Level(3), SignalSample::Disconnected]);
        v.on_visibility_changed(true, t0, &mut host);

        let handle = v.poller().armed().unwrap();
        assert!(v.on_timer(handle, t0 + Duration::from_secs(1), &mut host));
        assert_eq!(v.fill(), 0.0);
        assert!(v.strike_target());

        let redraws = host.redraws;
        assert!(v.pump(t0 + Duration::from_millis(1100), &mut host));
        assert!(host.redraws > redraws);
        assert!(!v.pump(t0 + Duration::from_secs(3), &mut host));
        assert_eq!(v.strike_progress(), 1.0);
    }

    #[test]
    fn manual_level_while_polling() {
        let mut host = RecordingHost::default();
        let mut v = view([SignalSample::Level(1)]);
        v.on_visibility_changed(true, Instant::now(), &mut host);
        v.set_level(0.8, Instant::now(), &mut host);

        assert!(!v.is_polling());
        assert!(!v.poller().is_start_requested());
        assert_eq!(v.fill(), 0.8);
        assert!(!v.strike_target());
        assert!(host.pending.is_empty());
    }

    #[test]
    fn bounds_change_requests_one_redraw() {
        let mut host = RecordingHost::default();
        let mut v = view([]);
        v.on_bounds_changed(Bounds::new(48, 48), &mut host);
        v.on_bounds_changed(Bounds::new(48, 48), &mut host);
        assert_eq!(host.redraws, 1);
    }

    #[test]
    fn measure_honours_constraints() {
        let v = view([]);
        assert_eq!(v.measure(MeasureSpec::Exactly(100), MeasureSpec::Unspecified, 2.0), (100, 48));
        assert_eq!(v.measure(MeasureSpec::AtMost(10), MeasureSpec::AtMost(500), 1.0), (10, 24));
    }

    #[test]
    fn failed_schedule_asks_for_a_retry_wake() {
        let t0 = Instant::now();
        let mut host = RecordingHost {
            fail_scheduling: true,
            ..RecordingHost::default()
        };
        let mut v = view([SignalSample::Level(2)]);
        assert_eq!(v.retry_deadline(t0), None);

        v.on_visibility_changed(true, t0, &mut host);
        assert!(v.is_polling());
        assert_eq!(v.retry_deadline(t0), Some(t0 + Duration::from_secs(1)));

        host.fail_scheduling = false;
        v.pump(t0, &mut host);
        assert_eq!(v.retry_deadline(t0), None);
        assert_eq!(host.pending.len(), 1);
    }

    #[test]
    fn jump_to_current_state_finishes_animation() {
        let mut host = RecordingHost::default();
        let mut v = view([]);
        v.set_disconnected(Instant::now(), &mut host);
        v.jump_to_current_state(&mut host);
        assert_eq!(v.strike_progress(), 1.0);
    }
}
