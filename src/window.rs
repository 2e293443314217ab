// ============================================================================
// WINDOW HOST
// ============================================================================
//
// Runs a `WifiSignalView` in a winit window backed by a `pixels` surface.
// Timers live in a small queue that the event loop drains on every wake-up.

use crate::config::WindowConfig;
use crate::error::{GlyphError, Result, ScheduleError};
use crate::host::{Host, TimerHandle};
use crate::renderer::{Bounds, Canvas};
use crate::signal::SignalSource;
use crate::WifiSignalView;

use pixels::{Pixels, SurfaceTexture};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

const MAX_PENDING_TIMERS: usize = 64;

/// Pending one-shot timers ordered by deadline.
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    pending: Vec<(Instant, TimerHandle)>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn schedule_at(&mut self, deadline: Instant) -> std::result::Result<TimerHandle, ScheduleError> {
        if self.pending.len() >= MAX_PENDING_TIMERS {
            return Err(ScheduleError::QueueFull {
                capacity: MAX_PENDING_TIMERS,
            });
        }
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        let at = self.pending.partition_point(|(d, _)| *d <= deadline);
        self.pending.insert(at, (deadline, handle));
        Ok(handle)
    }

    pub fn cancel(&mut self, handle: TimerHandle) {
        self.pending.retain(|(_, h)| *h != handle);
    }

    /// Removes and returns every timer due at `now`, earliest first.
    pub fn pop_due(&mut self, now: Instant) -> Vec<TimerHandle> {
        let due = self.pending.partition_point(|(d, _)| *d <= now);
        self.pending.drain(..due).map(|(_, h)| h).collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.first().map(|(d, _)| *d)
    }
}

/// The window's side of the `Host` contract.
#[derive(Debug, Default)]
pub struct WindowHost {
    timers: TimerQueue,
    redraw_requested: bool,
}

impl WindowHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    /// Returns and resets the pending redraw request.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }
}

impl Host for WindowHost {
    fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }

    fn schedule_after(&mut self, delay: Duration) -> std::result::Result<TimerHandle, ScheduleError> {
        self.timers.schedule_at(Instant::now() + delay)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.timers.cancel(handle);
    }
}

// ============================================================================
// EVENT LOOP
// ============================================================================

impl<S: SignalSource> WifiSignalView<S> {
    /// Opens a window and runs the glyph until the window is closed.
    pub fn show(&mut self, config: &WindowConfig) -> Result<()> {
        let event_loop = EventLoop::new()?;
        let window = WindowBuilder::new()
            .with_title(&config.title)
            .with_inner_size(LogicalSize::new(config.width as f64, config.height as f64))
            .with_min_inner_size(LogicalSize::new(
                crate::config::MIN_LOGICAL_SIZE as f64,
                crate::config::MIN_LOGICAL_SIZE as f64,
            ))
            .build(&event_loop)?;

        let window = std::sync::Arc::new(window);
        let window_clone = window.clone();

        let size = window.inner_size();
        let mut fb_width = size.width as usize;
        let mut fb_height = size.height as usize;
        let surface_texture = SurfaceTexture::new(size.width, size.height, &window);
        let mut pixels = Pixels::new(size.width, size.height, surface_texture)?;

        let mut host = WindowHost::new();
        let mut failure: Option<GlyphError> = None;
        let failure_slot = &mut failure;
        let frame_duration = Duration::from_secs_f64(1.0 / config.max_framerate.max(1.0));
        let mut last_frame = Instant::now();

        info!(width = size.width, height = size.height, "window opened");
        self.on_bounds_changed(Bounds::new(size.width, size.height), &mut host);
        self.on_visibility_changed(true, Instant::now(), &mut host);

        event_loop.run(move |event, window_target| {
            match event {
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => {
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        fb_width = new_size.width as usize;
                        fb_height = new_size.height as usize;
                        if new_size.width > 0 && new_size.height > 0 {
                            let resized = pixels
                                .resize_buffer(new_size.width, new_size.height)
                                .and_then(|()| pixels.resize_surface(new_size.width, new_size.height));
                            if let Err(e) = resized {
                                error!("could not resize pixel buffer: {}", e);
                                *failure_slot = Some(e.into());
                                window_target.exit();
                                return;
                            }
                        }
                        self.on_bounds_changed(
                            Bounds::new(new_size.width, new_size.height),
                            &mut host,
                        );
                    }
                    WindowEvent::Occluded(occluded) => {
                        debug!(occluded, "window occlusion changed");
                        self.on_visibility_changed(!occluded, Instant::now(), &mut host);
                    }
                    WindowEvent::RedrawRequested => {
                        let frame = pixels.frame_mut();
                        let mut canvas = Canvas::new(frame, fb_width, fb_height);
                        self.render(&mut canvas, Instant::now());
                        if let Err(e) = pixels.render() {
                            error!("frame presentation failed: {}", e);
                            *failure_slot = Some(e.into());
                            window_target.exit();
                        }
                    }
                    _ => {}
                },
                Event::Suspended => self.on_shown_changed(false, Instant::now(), &mut host),
                Event::Resumed => self.on_shown_changed(true, Instant::now(), &mut host),
                Event::AboutToWait => {
                    let now = Instant::now();
                    for handle in host.timers.pop_due(now) {
                        self.on_timer(handle, now, &mut host);
                    }
                    let animating = self.pump(now, &mut host);

                    // Redraws are capped at the configured framerate; an early
                    // request stays pending until the next frame slot.
                    let mut deferred = false;
                    if host.take_redraw() {
                        if last_frame.elapsed() >= frame_duration {
                            window_clone.request_redraw();
                            last_frame = Instant::now();
                        } else {
                            host.request_redraw();
                            deferred = true;
                        }
                    }

                    let frame_at = (deferred || animating).then(|| last_frame + frame_duration);
                    let wake = next_wake([
                        host.timers.next_deadline(),
                        self.retry_deadline(now),
                        frame_at,
                    ]);
                    match wake {
                        Some(deadline) => window_target.set_control_flow(ControlFlow::WaitUntil(deadline)),
                        None => window_target.set_control_flow(ControlFlow::Wait),
                    }
                }
                Event::LoopExiting => {
                    self.on_detached(Instant::now(), &mut host);
                    info!("window closed");
                }
                _ => {}
            }
        })?;

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Earliest of the candidate wake-up times, if any.
fn next_wake(candidates: impl IntoIterator<Item = Option<Instant>>) -> Option<Instant> {
    candidates.into_iter().flatten().min()
}
