//! 2D geometry primitives
//!
//! `Point` is a plain value type with vector arithmetic; `AffineMatrix`
//! is a 2D affine transform stored with the SVG coefficient naming
//! (`a b c d e f`), mapping `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`.
//!
//! NaN is never filtered here. Callers that accept external numbers must
//! check `is_finite` themselves.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// A 2D point or vector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Offset by `(dx, dy)`
    pub fn translate(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Component-wise absolute value
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs())
    }

    /// Round both components to the nearest integer
    pub fn round(self) -> Self {
        Self::new(self.x.round(), self.y.round())
    }

    /// Reflect `self` through `center`
    pub fn reflect(self, center: Point) -> Self {
        Self::new(2.0 * center.x - self.x, 2.0 * center.y - self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

/// 2D affine transform
///
/// The linear part is `[[a, c], [b, d]]`, the translation `(e, f)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineMatrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for AffineMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl AffineMatrix {
    pub const IDENTITY: AffineMatrix = AffineMatrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    pub fn rotation(radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// Compose `other` inside `self`: the result maps `p` to `self(other(p))`.
    ///
    /// Entering a nested transform is `context = context.then(&nested)`.
    pub fn then(&self, other: &AffineMatrix) -> AffineMatrix {
        AffineMatrix {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn transform_point(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Same linear part, translation multiplied by `factor`
    pub fn with_scaled_translation(&self, factor: f64) -> AffineMatrix {
        AffineMatrix {
            e: self.e * factor,
            f: self.f * factor,
            ..*self
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Mul for AffineMatrix {
    type Output = AffineMatrix;

    fn mul(self, rhs: AffineMatrix) -> AffineMatrix {
        self.then(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn test_point_arithmetic() {
        let p = Point::new(3.0, -4.0);
        assert_eq!(p + Point::new(1.0, 1.0), Point::new(4.0, -3.0));
        assert_eq!(p - Point::new(1.0, 1.0), Point::new(2.0, -5.0));
        assert_eq!(p.abs(), Point::new(3.0, 4.0));
        assert_eq!(p.translate(-3.0, 4.0), Point::ORIGIN);
        assert_eq!(Point::new(1.4, -2.6).round(), Point::new(1.0, -3.0));
    }

    #[test]
    fn test_reflect_through_center() {
        let ctrl = Point::new(10.0, 0.0);
        assert_eq!(ctrl.reflect(Point::new(20.0, 5.0)), Point::new(30.0, 10.0));
    }

    #[test]
    fn test_nan_propagates() {
        let p = Point::new(f64::NAN, 1.0) + Point::new(1.0, 1.0);
        assert!(!p.is_finite());
    }

    #[test]
    fn test_identity_is_default() {
        let m = AffineMatrix::default();
        assert!(m.is_identity());
        assert_eq!(m.transform_point(Point::new(7.0, 9.0)), Point::new(7.0, 9.0));
    }

    #[test]
    fn test_then_applies_inner_first() {
        let outer = AffineMatrix::translation(10.0, 0.0);
        let inner = AffineMatrix::scale(2.0, 2.0);
        let m = outer.then(&inner);
        // scale first, then translate
        assert!(approx(m.transform_point(Point::new(1.0, 1.0)), Point::new(12.0, 2.0)));

        let m = inner.then(&outer);
        assert!(approx(m.transform_point(Point::new(1.0, 1.0)), Point::new(22.0, 2.0)));
    }

    #[test]
    fn test_composition_is_associative() {
        let a = AffineMatrix::rotation(0.3);
        let b = AffineMatrix::new(1.0, 0.5, -0.2, 2.0, 3.0, -7.0);
        let c = AffineMatrix::translation(-4.0, 11.0);
        let p = Point::new(2.5, -1.25);

        let left = (a * b) * c;
        let right = a * (b * c);
        assert!(approx(left.transform_point(p), right.transform_point(p)));
        assert!(approx(
            left.transform_point(p),
            a.transform_point(b.transform_point(c.transform_point(p)))
        ));
    }

    #[test]
    fn test_scaled_translation_keeps_linear_part() {
        let m = AffineMatrix::new(0.0, 1.0, -1.0, 0.0, 2.0, 3.0).with_scaled_translation(100.0);
        assert_eq!(m, AffineMatrix::new(0.0, 1.0, -1.0, 0.0, 200.0, 300.0));
    }
}
