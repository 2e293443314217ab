// ============================================================================
// PATH GEOMETRY
// ============================================================================
//
// Glyph shapes built on `kurbo`. Screen convention throughout: the y axis
// points down and positive rotation turns clockwise.

use kurbo::{Affine, BezPath, CircleSegment, Point, Rect, Shape};
use std::f64::consts::FRAC_PI_2;

/// Accuracy of the cubic arc approximation, in normalized units.
const ARC_TOLERANCE: f64 = 1e-4;

/// Pie wedge with its apex at the origin, opening upwards and symmetric
/// about the vertical axis.
pub fn wedge(radius: f64, sweep_degrees: f64) -> BezPath {
    let sweep = sweep_degrees.to_radians();
    CircleSegment::new(Point::ORIGIN, radius, 0.0, -FRAC_PI_2 - sweep / 2.0, sweep)
        .to_path(ARC_TOLERANCE)
}

/// Maps `src` into `dst` with a uniform scale, centred on both axes.
///
/// Returns `None` when either rectangle has no area, since no finite
/// transform exists in that case.
pub fn fit_center(src: Rect, dst: Rect) -> Option<Affine> {
    let has_area = |r: Rect| r.width() > 0.0 && r.height() > 0.0 && r.is_finite();
    if !has_area(src) || !has_area(dst) {
        return None;
    }

    let scale = (dst.width() / src.width()).min(dst.height() / src.height());
    Some(
        Affine::translate(dst.center().to_vec2())
            * Affine::scale(scale)
            * Affine::translate(-src.center().to_vec2()),
    )
}

// ============================================================================
// BOOLEAN REGIONS
// ============================================================================

/// A fill region built from closed paths with boolean operations.
///
/// Leaves are filled with the non-zero winding rule. Nothing is clipped
/// eagerly; the rasterizer evaluates the tree span by span.
#[derive(Debug, Clone)]
pub enum Region {
    Path(BezPath),
    Union(Box<Region>, Box<Region>),
    Intersection(Box<Region>, Box<Region>),
    Difference(Box<Region>, Box<Region>),
}

impl From<BezPath> for Region {
    fn from(path: BezPath) -> Self {
        Region::Path(path)
    }
}

impl From<Rect> for Region {
    fn from(rect: Rect) -> Self {
        Region::Path(rect.to_path(0.0))
    }
}

impl Region {
    pub fn union(self, other: impl Into<Region>) -> Self {
        Region::Union(Box::new(self), Box::new(other.into()))
    }

    pub fn intersect(self, other: impl Into<Region>) -> Self {
        Region::Intersection(Box::new(self), Box::new(other.into()))
    }

    pub fn difference(self, other: impl Into<Region>) -> Self {
        Region::Difference(Box::new(self), Box::new(other.into()))
    }

    pub fn contains(&self, p: Point) -> bool {
        match self {
            Region::Path(path) => path.winding(p) != 0,
            Region::Union(a, b) => a.contains(p) || b.contains(p),
            Region::Intersection(a, b) => a.contains(p) && b.contains(p),
            Region::Difference(a, b) => a.contains(p) && !b.contains(p),
        }
    }

    /// Conservative bounding box of the covered area.
    pub fn bounding_box(&self) -> Rect {
        match self {
            Region::Path(path) => path.bounding_box(),
            Region::Union(a, b) => a.bounding_box().union(b.bounding_box()),
            Region::Intersection(a, b) => a.bounding_box().intersect(b.bounding_box()),
            Region::Difference(a, _) => a.bounding_box(),
        }
    }

    pub fn apply_affine(&mut self, affine: Affine) {
        match self {
            Region::Path(path) => path.apply_affine(affine),
            Region::Union(a, b) | Region::Intersection(a, b) | Region::Difference(a, b) => {
                a.apply_affine(affine);
                b.apply_affine(affine);
            }
        }
    }
}
