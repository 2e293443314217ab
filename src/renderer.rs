// ============================================================================
// GLYPH RENDERER
// ============================================================================
//
// Turns (fill fraction, strike progress, bounds, style) into RGBA pixels.
// All geometry is built in a normalized space of radius 1 and mapped onto the
// pixel bounds with a single fit-center transform.

use crate::config::{Color, GlyphConfig};
use crate::geometry::{fit_center, wedge, Region};
use crate::raster::RegionRaster;
use kurbo::{Affine, BezPath, Rect, Shape, Vec2};

const RADIUS: f64 = 1.0;

// Strike-through bar, in multiples of RADIUS.
const STRIKE_THICKNESS: f64 = RADIUS / 10.0;
const STRIKE_CUT_FACTOR: f64 = 1.1;
const STRIKE_EXTENSION: f64 = RADIUS / 10.0;
const STRIKE_MAX_LENGTH: f64 = RADIUS * 1.2;
const STRIKE_ORIGIN: Vec2 = Vec2::new(-RADIUS * 1.05, -RADIUS * 0.2);

/// Size of the drawing surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn to_rect(self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f64, self.height as f64)
    }
}

/// The two colors of the glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphStyle {
    /// "Signal present" color.
    pub fill_color: Color,
    /// Track color for the unfilled part of the wedge.
    pub background_color: Color,
}

// ============================================================================
// CANVAS
// ============================================================================

/// Borrowed RGBA8 frame buffer, row-major, 4 bytes per pixel.
pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: usize,
    height: usize,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut [u8], width: usize, height: usize) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// True when the buffer really holds `width * height` pixels.
    pub fn is_complete(&self) -> bool {
        self.width
            .checked_mul(self.height)
            .and_then(|n| n.checked_mul(4))
            .is_some_and(|len| self.frame.len() >= len)
    }

    pub fn clear(&mut self, color: Color) {
        let rgba = color.as_array();
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&rgba);
        }
    }

    /// Source-over blend of `color` at `coverage` onto one pixel.
    fn blend_pixel(&mut self, x: usize, y: usize, color: Color, coverage: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y * self.width + x) * 4;
        let Some(dst) = self.frame.get_mut(idx..idx + 4) else {
            return;
        };

        let sa = color.a as f32 / 255.0 * coverage.clamp(0.0, 1.0);
        let da = dst[3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            dst.copy_from_slice(&[0, 0, 0, 0]);
            return;
        }

        let src = [color.r, color.g, color.b];
        for (channel, s) in dst.iter_mut().zip(src) {
            let blended = (s as f32 * sa + *channel as f32 * da * (1.0 - sa)) / out_a;
            *channel = blended.round().clamp(0.0, 255.0) as u8;
        }
        dst[3] = (out_a * 255.0).round() as u8;
    }
}

// ============================================================================
// RENDERER
// ============================================================================

/// Pixel-space regions for one (fill, strike progress) pair.
struct Layers {
    fill: f32,
    progress: f32,
    track: Option<RegionRaster>,
    filled: Option<RegionRaster>,
}

pub struct GlyphRenderer {
    fill: f32,
    style: GlyphStyle,
    clear_color: Color,
    sweep_degrees: f64,
    tolerance: f64,
    samples_per_row: u32,
    bounds: Bounds,
    wedge: BezPath,
    fit: Option<Affine>,
    layers: Option<Layers>,
    dirty: bool,
}

impl GlyphRenderer {
    pub fn new(config: &GlyphConfig) -> Self {
        Self {
            fill: clamp_fraction(config.initial_fill),
            style: GlyphStyle {
                fill_color: config.fill_color,
                background_color: config.background_color,
            },
            clear_color: config.clear_color,
            sweep_degrees: config.sweep_degrees,
            tolerance: config.flatten_tolerance,
            samples_per_row: config.samples_per_row.max(1),
            bounds: Bounds::default(),
            wedge: wedge(RADIUS, config.sweep_degrees),
            fit: None,
            layers: None,
            dirty: true,
        }
    }

    pub fn fill(&self) -> f32 {
        self.fill
    }

    /// Stores `fraction` clamped into `[0, 1]`; NaN counts as empty.
    pub fn set_fill(&mut self, fraction: f32) {
        self.fill = clamp_fraction(fraction);
        self.dirty = true;
    }

    pub fn style(&self) -> GlyphStyle {
        self.style
    }

    pub fn set_fill_color(&mut self, color: Color) {
        self.style.fill_color = color;
        self.dirty = true;
    }

    pub fn set_background_color(&mut self, color: Color) {
        self.style.background_color = color;
        self.dirty = true;
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Records new surface bounds. Returns whether anything changed.
    pub fn set_bounds(&mut self, bounds: Bounds) -> bool {
        if bounds == self.bounds && (self.fit.is_some() || bounds.is_empty()) {
            return false;
        }
        self.bounds = bounds;
        self.fit = fit_center(self.glyph_rect(), bounds.to_rect());
        self.layers = None;
        self.dirty = true;
        true
    }

    /// Transform from normalized glyph space to pixels, if the bounds have area.
    pub fn fit_transform(&self) -> Option<Affine> {
        self.fit
    }

    /// Whether state changed since the last `render`.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Draws one complete frame. Rendering twice with the same inputs
    /// produces identical bytes.
    pub fn render(&mut self, canvas: &mut Canvas, strike_progress: f32) {
        self.dirty = false;
        if !canvas.is_complete() {
            return;
        }
        canvas.clear(self.clear_color);

        let Some(fit) = self.fit else {
            return;
        };
        let progress = clamp_fraction(strike_progress);
        self.prepare_layers(fit, progress);
        let Some(layers) = &self.layers else {
            return;
        };

        let clip = self
            .bounds
            .to_rect()
            .intersect(Rect::new(0.0, 0.0, canvas.width() as f64, canvas.height() as f64));
        let lines = self.samples_per_row;

        if let Some(track) = &layers.track {
            let color = self.style.background_color;
            track.rasterize(clip, lines, |x, y, c| canvas.blend_pixel(x, y, color, c));
        }
        if let Some(filled) = &layers.filled {
            let color = self.style.fill_color;
            filled.rasterize(clip, lines, |x, y, c| canvas.blend_pixel(x, y, color, c));
        }
    }

    /// Bounding rect of the wedge in normalized space.
    fn glyph_rect(&self) -> Rect {
        let half_width = RADIUS * (self.sweep_degrees / 2.0).to_radians().sin();
        Rect::new(-half_width, -RADIUS, half_width, 0.0)
    }

    /// Rebuilds the pixel-space regions when fill or strike progress moved
    /// since the last frame. Bounds changes drop the cache.
    fn prepare_layers(&mut self, fit: Affine, progress: f32) {
        if let Some(layers) = &self.layers {
            if layers.fill == self.fill && layers.progress == progress {
                return;
            }
        }

        let mut silhouette = Region::from(self.wedge.clone());
        if progress > 0.0 {
            let (bar, cut) = strike_bar(progress as f64, self.sweep_degrees);
            silhouette = silhouette.difference(cut).union(bar);
        }
        silhouette.apply_affine(fit);

        // A full glyph is painted in the fill color alone so that no track
        // shows through the antialiased rim.
        let (track, filled) = if self.fill >= 1.0 {
            (None, Some(silhouette))
        } else if self.fill > 0.0 {
            let scaled = (fit * Affine::scale(self.fill as f64)) * self.wedge.clone();
            (Some(silhouette.clone()), Some(silhouette.intersect(scaled)))
        } else {
            (Some(silhouette), None)
        };

        let tolerance = self.tolerance;
        self.layers = Some(Layers {
            fill: self.fill,
            progress,
            track: track.map(|r| RegionRaster::new(&r, tolerance)),
            filled: filled.map(|r| RegionRaster::new(&r, tolerance)),
        });
    }
}

/// Frame in which the strike bar runs along +x, centred on y = 0.
pub(crate) fn strike_frame(sweep_degrees: f64) -> Affine {
    Affine::rotate((90.0 - sweep_degrees / 2.0).to_radians()) * Affine::translate(STRIKE_ORIGIN)
}

/// Bar and the slightly larger cut around it, in normalized space.
fn strike_bar(progress: f64, sweep_degrees: f64) -> (BezPath, BezPath) {
    let length = STRIKE_EXTENSION + progress * STRIKE_MAX_LENGTH;
    let half = STRIKE_THICKNESS / 2.0;
    let margin = (STRIKE_CUT_FACTOR - 1.0) * half;

    let bar = Rect::new(0.0, -half, length, half);
    let cut = bar.inflate(margin, margin);

    let frame = strike_frame(sweep_degrees);
    (frame * bar.to_path(0.0), frame * cut.to_path(0.0))
}

pub(crate) fn clamp_fraction(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use proptest::prelude::*;

    const RED: Color = Color::rgb(0xff, 0, 0);
    const BLUE: Color = Color::rgb(0, 0, 0xff);
    const SWEEP_FOR_TESTS: f64 = crate::config::SWEEP_DEGREES;

    fn sized_renderer(fill: f32, size: u32) -> GlyphRenderer {
        let config = GlyphConfig::builder()
            .fill_color(RED)
            .background_color(BLUE)
            .initial_fill(fill)
            .build();
        let mut renderer = GlyphRenderer::new(&config);
        renderer.set_bounds(Bounds::new(size, size));
        renderer
    }

    fn renderer(fill: f32) -> GlyphRenderer {
        sized_renderer(fill, 100)
    }

    fn draw(renderer: &mut GlyphRenderer, progress: f32) -> Vec<u8> {
        let size = renderer.bounds();
        let mut frame = vec![0u8; size.width as usize * size.height as usize * 4];
        renderer.render(
            &mut Canvas::new(&mut frame, size.width as usize, size.height as usize),
            progress,
        );
        frame
    }

    /// Pixel under a point given in normalized glyph space.
    fn pixel_at(renderer: &GlyphRenderer, frame: &[u8], local: Point) -> [u8; 4] {
        let p = renderer.fit_transform().unwrap() * local;
        let idx = (p.y as usize * renderer.bounds().width as usize + p.x as usize) * 4;
        [frame[idx], frame[idx + 1], frame[idx + 2], frame[idx + 3]]
    }

    #[test]
    fn full_fill_hides_track_entirely() {
        let mut r = renderer(1.0);
        let frame = draw(&mut r, 0.0);

        assert!(frame.chunks_exact(4).all(|px| px[2] == 0));
        assert!(frame.chunks_exact(4).any(|px| px == [0xff, 0, 0, 0xff]));
        assert_eq!(pixel_at(&r, &frame, Point::new(0.0, -0.6)), RED.as_array());
    }

    #[test]
    fn empty_fill_shows_only_track() {
        let mut r = renderer(0.0);
        let frame = draw(&mut r, 0.0);

        assert!(frame.chunks_exact(4).all(|px| px[0] == 0));
        assert_eq!(pixel_at(&r, &frame, Point::new(0.0, -0.6)), BLUE.as_array());
    }

    #[test]
    fn partial_fill_grows_from_apex() {
        let mut r = renderer(0.5);
        let frame = draw(&mut r, 0.0);

        assert_eq!(pixel_at(&r, &frame, Point::new(0.0, -0.25)), RED.as_array());
        assert_eq!(pixel_at(&r, &frame, Point::new(0.0, -0.9)), BLUE.as_array());
        // Outside the wedge stays clear.
        assert_eq!(pixel_at(&r, &frame, Point::new(0.55, -0.1)), [0, 0, 0, 0]);
    }

    #[test]
    fn render_is_idempotent() {
        let mut r = renderer(0.3);
        let first = draw(&mut r, 0.6);
        let second = draw(&mut r, 0.6);
        assert_eq!(first, second);

        let mut frame = first.clone();
        r.render(&mut Canvas::new(&mut frame, 100, 100), 0.6);
        assert_eq!(frame, first);
    }

    #[test]
    fn strike_bar_extends_past_the_wedge() {
        let mut r = renderer(0.5);
        let on_bar = strike_frame(SWEEP_FOR_TESTS) * Point::new(0.04, 0.0);

        let struck = draw(&mut r, 1.0);
        assert_eq!(pixel_at(&r, &struck, on_bar), BLUE.as_array());

        let clean = draw(&mut r, 0.0);
        assert_eq!(pixel_at(&r, &clean, on_bar), [0, 0, 0, 0]);
    }

    #[test]
    fn strike_bar_grows_with_progress() {
        let mut r = renderer(0.0);
        let far_end = strike_frame(SWEEP_FOR_TESTS) * Point::new(1.1, 0.0);

        let short = draw(&mut r, 0.1);
        let long = draw(&mut r, 1.0);
        assert_ne!(short, long);
        assert_eq!(pixel_at(&r, &short, far_end), [0, 0, 0, 0]);
        assert_eq!(pixel_at(&r, &long, far_end), BLUE.as_array());
    }

    #[test]
    fn strike_cut_leaves_a_gap_beside_the_bar() {
        // Large enough that the cut margin spans several pixels.
        let mut r = sized_renderer(0.0, 1000);
        let frame = strike_frame(SWEEP_FOR_TESTS);
        let half = STRIKE_THICKNESS / 2.0;
        let margin = (STRIKE_CUT_FACTOR - 1.0) * half;
        let in_gap = frame * Point::new(0.79, half + margin / 2.0);
        let on_bar = frame * Point::new(0.79, 0.0);
        assert!(Region::from(r.wedge.clone()).contains(in_gap));

        let clean = draw(&mut r, 0.0);
        assert_eq!(pixel_at(&r, &clean, in_gap), BLUE.as_array());

        let struck = draw(&mut r, 1.0);
        assert_eq!(pixel_at(&r, &struck, in_gap), [0, 0, 0, 0]);
        assert_eq!(pixel_at(&r, &struck, on_bar), BLUE.as_array());
    }

    #[test]
    fn layers_are_reused_until_inputs_change() {
        let mut r = renderer(0.5);
        draw(&mut r, 0.3);
        assert!(r.layers.as_ref().is_some_and(|l| l.progress == 0.3 && l.fill == 0.5));

        r.set_fill(0.25);
        draw(&mut r, 0.3);
        assert!(r.layers.as_ref().is_some_and(|l| l.fill == 0.25));

        r.set_bounds(Bounds::new(60, 60));
        assert!(r.layers.is_none());
    }

    #[test]
    fn large_frames_render_quickly() {
        let mut r = sized_renderer(0.5, 1080);
        let started = std::time::Instant::now();
        draw(&mut r, 0.5);
        // Loose bound so unoptimized test builds pass too.
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
    }

    #[test]
    fn zero_bounds_draw_nothing() {
        let mut r = renderer(1.0);
        assert!(r.set_bounds(Bounds::new(0, 40)));
        assert!(r.fit_transform().is_none());

        let mut frame = vec![7u8; 10 * 10 * 4];
        r.render(&mut Canvas::new(&mut frame, 10, 10), 1.0);
        assert!(frame.iter().all(|b| *b == 0));

        let mut empty: Vec<u8> = Vec::new();
        r.render(&mut Canvas::new(&mut empty, 0, 0), 1.0);
    }

    #[test]
    fn short_buffer_is_left_untouched() {
        let mut r = renderer(1.0);
        let mut frame = vec![7u8; 16];
        r.render(&mut Canvas::new(&mut frame, 100, 100), 0.0);
        assert!(frame.iter().all(|b| *b == 7));
    }

    #[test]
    fn setters_mark_dirty_until_rendered() {
        let mut r = renderer(0.5);
        draw(&mut r, 0.0);
        assert!(!r.is_dirty());

        r.set_fill_color(Color::WHITE);
        assert!(r.is_dirty());
        draw(&mut r, 0.0);
        assert!(!r.is_dirty());

        assert!(!r.set_bounds(Bounds::new(100, 100)));
        assert!(!r.is_dirty());
        assert!(r.set_bounds(Bounds::new(50, 80)));
        assert!(r.is_dirty());
    }

    #[test]
    fn nan_fill_is_empty() {
        let mut r = renderer(0.5);
        r.set_fill(f32::NAN);
        assert_eq!(r.fill(), 0.0);
    }

    proptest! {
        #[test]
        fn fill_is_always_clamped(value in -1.0e6f32..1.0e6) {
            let mut r = renderer(0.5);
            r.set_fill(value);
            prop_assert_eq!(r.fill(), value.clamp(0.0, 1.0));
        }
    }
}
