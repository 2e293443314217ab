//! Error types for the glyph, its collaborators and the demo window.

use thiserror::Error;

/// The host could not arm a timer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("timer queue is full ({capacity} pending)")]
    QueueFull { capacity: usize },
}

/// Failures surfaced to whoever runs the glyph in a window.
#[derive(Error, Debug)]
pub enum GlyphError {
    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("could not create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("pixel surface failed: {0}")]
    Surface(#[from] pixels::Error),

    #[error("could not resize pixel buffer: {0}")]
    Resize(#[from] pixels::TextureError),
}

pub type Result<T> = std::result::Result<T, GlyphError>;
