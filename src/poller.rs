// ============================================================================
// SIGNAL POLLER
// ============================================================================
//
// Idle/Active state machine. The poller is Active exactly when the view is
// visible, shown, and polling was requested; `update_running` is the only
// place that decision is made.

use crate::config::GlyphConfig;
use crate::host::{Host, TimerHandle};
use crate::signal::{SignalSample, SignalSource};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Level reported in preview mode.
pub const PREVIEW_LEVEL: u8 = 3;

/// Receives what the poller decided to show.
pub trait GlyphTarget {
    fn show_fill(&mut self, fraction: f32);
    fn show_strike(&mut self, on: bool);
}

/// Collaborators borrowed for the duration of one poller input.
pub struct PollContext<'a> {
    pub source: &'a mut dyn SignalSource,
    pub target: &'a mut dyn GlyphTarget,
    pub host: &'a mut dyn Host,
}

#[derive(Debug, Clone)]
pub struct SignalPoller {
    interval: Duration,
    preview: bool,
    visible: bool,
    shown: bool,
    start_requested: bool,
    running: bool,
    armed: Option<TimerHandle>,
    needs_rearm: bool,
    disconnected: bool,
}

impl SignalPoller {
    pub fn new(config: &GlyphConfig) -> Self {
        Self {
            interval: config.poll_interval,
            preview: config.preview,
            visible: false,
            shown: true,
            start_requested: config.auto_start && !config.preview,
            running: false,
            armed: None,
            needs_rearm: false,
            disconnected: config.initial_strike_through && !config.preview,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_start_requested(&self) -> bool {
        self.start_requested
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// The currently armed timer, if any.
    pub fn armed(&self) -> Option<TimerHandle> {
        self.armed
    }

    /// Active but without an armed timer after a scheduling failure.
    pub fn needs_rearm(&self) -> bool {
        self.needs_rearm
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    // ------------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------------

    pub fn on_visibility_changed(&mut self, visible: bool, cx: &mut PollContext) {
        self.visible = visible;
        self.update_running(cx);
    }

    /// Whether every ancestor of the view is shown.
    pub fn on_shown_changed(&mut self, shown: bool, cx: &mut PollContext) {
        self.shown = shown;
        self.update_running(cx);
    }

    pub fn on_detached(&mut self, cx: &mut PollContext) {
        self.visible = false;
        self.update_running(cx);
    }

    pub fn start(&mut self, cx: &mut PollContext) {
        self.start_requested = true;
        self.update_running(cx);
    }

    pub fn stop(&mut self, cx: &mut PollContext) {
        self.start_requested = false;
        self.update_running(cx);
    }

    /// Stops polling and shows `fraction` with the strike-through cleared.
    pub fn set_level(&mut self, fraction: f32, cx: &mut PollContext) {
        debug!(fraction, "manual level");
        self.stop(cx);
        self.disconnected = false;
        cx.target.show_fill(fraction);
        cx.target.show_strike(false);
    }

    /// Stops polling and shows the struck-through empty glyph.
    pub fn set_disconnected(&mut self, cx: &mut PollContext) {
        debug!("manual disconnect");
        self.stop(cx);
        self.disconnected = true;
        cx.target.show_fill(0.0);
        cx.target.show_strike(true);
    }

    /// Handles a fired timer. Returns whether a sample was taken.
    pub fn on_timer(&mut self, handle: TimerHandle, cx: &mut PollContext) -> bool {
        if self.armed != Some(handle) {
            debug!(?handle, "ignoring stale timer");
            return false;
        }
        self.armed = None;
        if !self.running {
            return false;
        }

        self.sample_and_apply(cx);
        self.arm(cx.host);
        true
    }

    /// Retries arming after an earlier scheduling failure.
    pub fn rearm(&mut self, host: &mut dyn Host) {
        if self.running && self.armed.is_none() {
            self.arm(host);
        }
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    fn update_running(&mut self, cx: &mut PollContext) {
        let running = self.visible && self.shown && self.start_requested;
        if running == self.running {
            return;
        }
        self.running = running;

        if running {
            info!(interval_ms = self.interval.as_millis() as u64, "signal polling started");
            self.sample_and_apply(cx);
            self.arm(cx.host);
        } else {
            info!("signal polling stopped");
            if let Some(handle) = self.armed.take() {
                cx.host.cancel(handle);
            }
            self.needs_rearm = false;
        }
    }

    fn arm(&mut self, host: &mut dyn Host) {
        match host.schedule_after(self.interval) {
            Ok(handle) => {
                self.armed = Some(handle);
                self.needs_rearm = false;
            }
            Err(e) => {
                warn!("could not schedule next signal sample: {}", e);
                self.armed = None;
                self.needs_rearm = true;
            }
        }
    }

    fn sample_and_apply(&mut self, cx: &mut PollContext) {
        let sample = if self.preview {
            SignalSample::Level(PREVIEW_LEVEL)
        } else {
            cx.source.sample().unwrap_or_else(|e| {
                warn!("signal sample failed, treating as disconnected: {}", e);
                SignalSample::Disconnected
            })
        };
        debug!(?sample, "signal sampled");

        cx.target.show_fill(sample.fraction());

        let disconnected = sample.is_disconnected();
        if disconnected != self.disconnected && !self.preview {
            self.disconnected = disconnected;
            cx.target.show_strike(disconnected);
        }
    }
}
