//! Bézier curve flattening
//!
//! Turns a quadratic or cubic Bézier, given in the emitter's local frame,
//! into a short polyline. The curve is sampled uniformly in its parameter
//! with a sample count driven by its arclength, then reduced with a
//! Douglas-Peucker pass that always keeps both endpoints.

use lyon::geom::{point as lpoint, CubicBezierSegment, QuadraticBezierSegment};

use crate::error::FlattenError;
use crate::geometry::Point;

/// Arclength covered by one sample, in device units
pub const SAMPLE_SPACING: f64 = 16.0;

/// Lower bound on the number of parameter steps
pub const MIN_SAMPLES: usize = 5;

/// Maximum perpendicular deviation removed by simplification, in device units
pub const SIMPLIFY_TOLERANCE: f64 = 1.0;

/// Tolerance handed to lyon's length approximation
const LENGTH_TOLERANCE: f64 = 1e-3;

/// A flattened curve
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedCurve {
    /// Arclength of the source curve
    pub length: f64,
    /// Number of parameter steps used for sampling (N; N + 1 points were sampled)
    pub samples: usize,
    /// Simplified polyline, first and last sample preserved
    pub points: Vec<Point>,
}

enum Curve {
    Quadratic(QuadraticBezierSegment<f64>),
    Cubic(CubicBezierSegment<f64>),
}

impl Curve {
    fn length(&self) -> f64 {
        match self {
            Curve::Quadratic(q) => q.to_cubic().approximate_length(LENGTH_TOLERANCE),
            Curve::Cubic(c) => c.approximate_length(LENGTH_TOLERANCE),
        }
    }

    fn sample(&self, t: f64) -> Point {
        let p = match self {
            Curve::Quadratic(q) => q.sample(t),
            Curve::Cubic(c) => c.sample(t),
        };
        Point::new(p.x, p.y)
    }

    fn endpoints(&self) -> (Point, Point) {
        let (from, to) = match self {
            Curve::Quadratic(q) => (q.from, q.to),
            Curve::Cubic(c) => (c.from, c.to),
        };
        (Point::new(from.x, from.y), Point::new(to.x, to.y))
    }
}

/// Curve flattener with fixed sampling parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct CurveFlattener;

impl CurveFlattener {
    pub fn new() -> Self {
        Self
    }

    /// Flatten a curve from its control polygon (3 points: quadratic, 4: cubic)
    pub fn flatten(&self, control: &[Point]) -> Result<FlattenedCurve, FlattenError> {
        let lp = |p: &Point| lpoint(p.x, p.y);
        let curve = match control {
            [from, ctrl, to] => Curve::Quadratic(QuadraticBezierSegment {
                from: lp(from),
                ctrl: lp(ctrl),
                to: lp(to),
            }),
            [from, ctrl1, ctrl2, to] => Curve::Cubic(CubicBezierSegment {
                from: lp(from),
                ctrl1: lp(ctrl1),
                ctrl2: lp(ctrl2),
                to: lp(to),
            }),
            _ if control.len() < 3 => {
                return Err(FlattenError::TooFewControlPoints {
                    count: control.len(),
                })
            }
            _ => {
                return Err(FlattenError::TooManyControlPoints {
                    count: control.len(),
                })
            }
        };
        Ok(Self::flatten_curve(&curve))
    }

    pub fn flatten_quadratic(&self, from: Point, ctrl: Point, to: Point) -> FlattenedCurve {
        Self::flatten_curve(&Curve::Quadratic(QuadraticBezierSegment {
            from: lpoint(from.x, from.y),
            ctrl: lpoint(ctrl.x, ctrl.y),
            to: lpoint(to.x, to.y),
        }))
    }

    pub fn flatten_cubic(
        &self,
        from: Point,
        ctrl1: Point,
        ctrl2: Point,
        to: Point,
    ) -> FlattenedCurve {
        Self::flatten_curve(&Curve::Cubic(CubicBezierSegment {
            from: lpoint(from.x, from.y),
            ctrl1: lpoint(ctrl1.x, ctrl1.y),
            ctrl2: lpoint(ctrl2.x, ctrl2.y),
            to: lpoint(to.x, to.y),
        }))
    }

    fn flatten_curve(curve: &Curve) -> FlattenedCurve {
        let length = curve.length();
        let samples = sample_count(length);
        let (from, to) = curve.endpoints();
        let raw: Vec<Point> = (0..=samples)
            .map(|i| match i {
                0 => from,
                i if i == samples => to,
                i => curve.sample(i as f64 / samples as f64),
            })
            .collect();
        FlattenedCurve {
            length,
            samples,
            points: simplify(&raw, SIMPLIFY_TOLERANCE),
        }
    }
}

/// Number of parameter steps for a curve of the given arclength
pub fn sample_count(length: f64) -> usize {
    let steps = (length / SAMPLE_SPACING).ceil();
    if steps.is_finite() && steps > MIN_SAMPLES as f64 {
        steps as usize
    } else {
        MIN_SAMPLES
    }
}

/// Douglas-Peucker polyline simplification
///
/// Interior points closer than `tolerance` to the kept chord are dropped.
/// The first and last points are always kept.
pub fn simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let tolerance_sq = tolerance * tolerance;
    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;

    let mut stack = vec![(0, last)];
    while let Some((anchor, floater)) = stack.pop() {
        if anchor + 1 >= floater {
            continue;
        }

        let mut max_dist_sq = 0.0;
        let mut furthest = anchor;
        for i in (anchor + 1)..floater {
            let dist_sq = segment_distance_sq(points[i], points[anchor], points[floater]);
            if dist_sq > max_dist_sq {
                max_dist_sq = dist_sq;
                furthest = i;
            }
        }

        if max_dist_sq > tolerance_sq {
            keep[furthest] = true;
            stack.push((anchor, furthest));
            stack.push((furthest, floater));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Squared distance from `p` to the segment `a`-`b`
fn segment_distance_sq(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    let closest = if len_sq == 0.0 {
        a
    } else {
        let t = (((p.x - a.x) * ab.x + (p.y - a.y) * ab.y) / len_sq).clamp(0.0, 1.0);
        a.translate(ab.x * t, ab.y * t)
    };
    let d = p - closest;
    d.x * d.x + d.y * d.y
}
