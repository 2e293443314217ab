// ============================================================================
// HOST SURFACE
// ============================================================================

use crate::error::ScheduleError;
use std::time::Duration;

/// Identifies one scheduled timer callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

/// What the glyph needs from whoever displays it.
///
/// Everything runs on the host's single UI thread. When a scheduled timer
/// fires, the host hands its handle back through
/// [`WifiSignalView::on_timer`](crate::WifiSignalView::on_timer).
pub trait Host {
    /// Asks for a repaint. Multiple requests before the next frame coalesce.
    fn request_redraw(&mut self);

    fn schedule_after(&mut self, delay: Duration) -> Result<TimerHandle, ScheduleError>;

    /// Cancels a pending timer. Unknown or already-fired handles are ignored.
    fn cancel(&mut self, handle: TimerHandle);
}
