// ============================================================================
// SCANLINE COVERAGE
// ============================================================================
//
// A region is flattened into line edges once. Each pixel row is then probed
// by a few horizontal sample lines; every line yields the x spans where the
// region's winding is non-zero, and boolean nodes combine those spans. The
// horizontal overlap of each span with a pixel is exact, so only the vertical
// direction is sampled.

use crate::geometry::Region;
use kurbo::{flatten, BezPath, PathEl, Point, Rect};

/// Half-open horizontal interval `[start, end)` on one sample line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub start: f64,
    pub end: f64,
}

/// Line edge stored top to bottom; `dir` keeps the original orientation.
#[derive(Debug, Clone, Copy)]
struct Edge {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    dir: i32,
}

impl Edge {
    fn new(a: Point, b: Point) -> Option<Self> {
        if a.y == b.y || !(a.is_finite() && b.is_finite()) {
            return None;
        }
        let (top, bottom, dir) = if a.y < b.y { (a, b, 1) } else { (b, a, -1) };
        Some(Self {
            x0: top.x,
            y0: top.y,
            x1: bottom.x,
            y1: bottom.y,
            dir,
        })
    }

    fn crossing(&self, y: f64) -> Option<f64> {
        if y < self.y0 || y >= self.y1 {
            return None;
        }
        Some(self.x0 + (y - self.y0) * (self.x1 - self.x0) / (self.y1 - self.y0))
    }
}

#[derive(Debug, Clone)]
enum Node {
    Edges(Vec<Edge>),
    Union(Box<Node>, Box<Node>),
    Intersection(Box<Node>, Box<Node>),
    Difference(Box<Node>, Box<Node>),
}

/// A region prepared for repeated scanline rasterization.
#[derive(Debug, Clone)]
pub struct RegionRaster {
    root: Node,
    bounds: Rect,
}

impl RegionRaster {
    /// Flattens every path of `region` to within `tolerance` pixels.
    pub fn new(region: &Region, tolerance: f64) -> Self {
        Self {
            root: Node::compile(region, tolerance.max(1e-3)),
            bounds: region.bounding_box(),
        }
    }

    /// Spans covered on the horizontal line at `y`, sorted and disjoint.
    pub fn spans(&self, y: f64) -> Vec<Span> {
        self.root.spans(y, &mut Vec::new())
    }

    /// Calls `emit(x, y, coverage)` for every pixel inside `clip` with
    /// non-zero coverage, row by row. `lines` sample lines are taken per row.
    pub fn rasterize(&self, clip: Rect, lines: u32, mut emit: impl FnMut(usize, usize, f32)) {
        let area = self.bounds.intersect(clip);
        if !(area.width() > 0.0 && area.height() > 0.0) {
            return;
        }

        let x0 = area.x0.floor().max(0.0) as usize;
        let x1 = area.x1.ceil().max(0.0) as usize;
        let y0 = area.y0.floor().max(0.0) as usize;
        let y1 = area.y1.ceil().max(0.0) as usize;
        let (left, right) = (clip.x0.max(x0 as f64), clip.x1.min(x1 as f64));

        let lines = lines.max(1);
        let weight = 1.0 / lines as f64;
        let mut row = vec![0f32; x1 - x0];
        let mut crossings = Vec::new();

        for y in y0..y1 {
            row.fill(0.0);
            for line in 0..lines {
                let sample_y = y as f64 + (line as f64 + 0.5) * weight;
                for span in self.root.spans(sample_y, &mut crossings) {
                    accumulate(&mut row, x0, span.start.max(left), span.end.min(right), weight);
                }
            }
            for (i, coverage) in row.iter().enumerate() {
                if *coverage > 0.0 {
                    emit(x0 + i, y, coverage.min(1.0));
                }
            }
        }
    }
}

impl Node {
    fn compile(region: &Region, tolerance: f64) -> Self {
        let pair = |a: &Region, b: &Region| {
            (
                Box::new(Node::compile(a, tolerance)),
                Box::new(Node::compile(b, tolerance)),
            )
        };
        match region {
            Region::Path(path) => Node::Edges(flatten_edges(path, tolerance)),
            Region::Union(a, b) => {
                let (a, b) = pair(a, b);
                Node::Union(a, b)
            }
            Region::Intersection(a, b) => {
                let (a, b) = pair(a, b);
                Node::Intersection(a, b)
            }
            Region::Difference(a, b) => {
                let (a, b) = pair(a, b);
                Node::Difference(a, b)
            }
        }
    }

    fn spans(&self, y: f64, crossings: &mut Vec<(f64, i32)>) -> Vec<Span> {
        match self {
            Node::Edges(edges) => winding_spans(edges, y, crossings),
            Node::Union(a, b) => combine(&a.spans(y, crossings), &b.spans(y, crossings), |a, b| a || b),
            Node::Intersection(a, b) => {
                let left = a.spans(y, crossings);
                if left.is_empty() {
                    return left;
                }
                combine(&left, &b.spans(y, crossings), |a, b| a && b)
            }
            Node::Difference(a, b) => {
                let left = a.spans(y, crossings);
                if left.is_empty() {
                    return left;
                }
                combine(&left, &b.spans(y, crossings), |a, b| a && !b)
            }
        }
    }
}

/// Flattens a path into edges, closing every subpath.
fn flatten_edges(path: &BezPath, tolerance: f64) -> Vec<Edge> {
    let mut edges = Vec::new();
    let mut start = Point::ORIGIN;
    let mut last = Point::ORIGIN;

    flatten(path.iter(), tolerance, |el| match el {
        PathEl::MoveTo(p) => {
            edges.extend(Edge::new(last, start));
            start = p;
            last = p;
        }
        PathEl::LineTo(p) => {
            edges.extend(Edge::new(last, p));
            last = p;
        }
        PathEl::ClosePath => {
            edges.extend(Edge::new(last, start));
            last = start;
        }
        _ => {}
    });
    edges.extend(Edge::new(last, start));
    edges
}

fn winding_spans(edges: &[Edge], y: f64, crossings: &mut Vec<(f64, i32)>) -> Vec<Span> {
    crossings.clear();
    crossings.extend(
        edges
            .iter()
            .filter_map(|e| e.crossing(y).map(|x| (x, e.dir))),
    );
    crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut spans = Vec::new();
    let mut winding = 0;
    let mut start = 0.0;
    for &(x, dir) in crossings.iter() {
        let was_inside = winding != 0;
        winding += dir;
        match (was_inside, winding != 0) {
            (false, true) => start = x,
            (true, false) if x > start => push_span(&mut spans, start, x),
            _ => {}
        }
    }
    spans
}

/// Boolean combination of two sorted, disjoint span lists.
fn combine(a: &[Span], b: &[Span], keep: impl Fn(bool, bool) -> bool) -> Vec<Span> {
    let mut cuts: Vec<f64> = a.iter().chain(b).flat_map(|s| [s.start, s.end]).collect();
    cuts.sort_by(f64::total_cmp);
    cuts.dedup();

    let mut spans = Vec::new();
    let (mut ia, mut ib) = (0, 0);
    for w in cuts.windows(2) {
        let mid = (w[0] + w[1]) * 0.5;
        while ia < a.len() && a[ia].end <= mid {
            ia += 1;
        }
        while ib < b.len() && b[ib].end <= mid {
            ib += 1;
        }
        let in_a = a.get(ia).is_some_and(|s| s.start <= mid);
        let in_b = b.get(ib).is_some_and(|s| s.start <= mid);
        if keep(in_a, in_b) {
            push_span(&mut spans, w[0], w[1]);
        }
    }
    spans
}

/// Appends a span, merging it into the previous one when they touch.
fn push_span(spans: &mut Vec<Span>, start: f64, end: f64) {
    match spans.last_mut() {
        Some(last) if last.end >= start => last.end = last.end.max(end),
        _ => spans.push(Span { start, end }),
    }
}

/// Adds the horizontal overlap of `[start, end)` with each pixel of `row`.
fn accumulate(row: &mut [f32], x0: usize, start: f64, end: f64, weight: f64) {
    if !(end > start) {
        return;
    }
    let first = start.floor().max(x0 as f64) as usize;
    let last = (end.ceil() as usize).min(x0 + row.len());
    for px in first..last {
        let overlap = end.min(px as f64 + 1.0) - start.max(px as f64);
        if overlap > 0.0 {
            row[px - x0] += (overlap * weight) as f32;
        }
    }
}
