use bon::Builder;
use std::time::Duration;

/// RGBA color, non-premultiplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn as_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

/// Number of discrete levels a signal source reports.
pub const LEVELS: u8 = 5;

/// Interval between two signal samples while polling.
pub const UPDATE_INTERVAL: Duration = Duration::from_millis(1000);

/// Length of one strike-through transition.
pub const STRIKE_DURATION: Duration = Duration::from_millis(250);

/// Angular width of the glyph in degrees.
pub const SWEEP_DEGREES: f64 = 75.0;

/// Smallest size the glyph asks for, in logical pixels.
pub const MIN_LOGICAL_SIZE: u32 = 24;

/// Style and behaviour of one wifi glyph.
///
/// ```
/// use wifiglyph::{Color, GlyphConfig};
///
/// let config = GlyphConfig::builder()
///     .fill_color(Color::rgb(0x21, 0x96, 0xf3))
///     .initial_fill(0.5)
///     .auto_start(false)
///     .build();
/// assert_eq!(config.initial_fill, 0.5);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct GlyphConfig {
    // Colors
    #[builder(default = Color::BLACK)]
    pub fill_color: Color,
    #[builder(default = Color::BLACK.with_alpha(50))]
    pub background_color: Color,
    #[builder(default = Color::TRANSPARENT)]
    pub clear_color: Color,

    // Initial state
    #[builder(default = 0.8)]
    pub initial_fill: f32,
    #[builder(default = false)]
    pub initial_strike_through: bool,
    #[builder(default = true)]
    pub auto_start: bool,
    /// Static rendering for layout previews: fixed level, no polling, no
    /// strike animation.
    #[builder(default = false)]
    pub preview: bool,

    // Geometry
    #[builder(default = SWEEP_DEGREES)]
    pub sweep_degrees: f64,
    /// Largest distance, in pixels, between a curve and its flattened edges.
    #[builder(default = 0.1)]
    pub flatten_tolerance: f64,
    /// Sample lines per pixel row; coverage along each line is exact.
    #[builder(default = 4)]
    pub samples_per_row: u32,

    // Timing
    #[builder(default = STRIKE_DURATION)]
    pub strike_duration: Duration,
    #[builder(default = UPDATE_INTERVAL)]
    pub poll_interval: Duration,
}

impl Default for GlyphConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Configuration for the demo window
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub max_framerate: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Wifi signal".to_string(),
            width: 240,
            height: 240,
            max_framerate: 60.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_style() {
        let config = GlyphConfig::default();
        assert_eq!(config.fill_color, Color::rgb(0, 0, 0));
        assert_eq!(config.background_color, Color::rgba(0, 0, 0, 50));
        assert_eq!(config.initial_fill, 0.8);
        assert!(!config.initial_strike_through);
        assert!(config.auto_start);
        assert!(!config.preview);
        assert_eq!(config.poll_interval, Duration::from_millis(1000));
        assert_eq!(config.sweep_degrees, 75.0);
    }

    #[test]
    fn builder_overrides_single_fields() {
        let config = GlyphConfig::builder()
            .background_color(Color::WHITE)
            .initial_strike_through(true)
            .build();
        assert_eq!(config.background_color, Color::WHITE);
        assert!(config.initial_strike_through);
        assert_eq!(config.fill_color, Color::BLACK);
    }
}
