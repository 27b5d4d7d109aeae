//! # Height Classification
//!
//! Turns normalized heights into colors through an externally
//! configured gradient, and normalized heights into world heights
//! through an externally configured monotone curve.
//!
//! Both lookups are plain sorted-stop interpolation: deterministic,
//! allocation-free per sample.

use bytemuck::{Pod, Zeroable};

use crate::heightfield::Heightfield;

/// An 8-bit RGBA color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Creates an opaque color.
    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Linearly interpolates toward `other` by `t` in [0, 1].
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| -> u8 {
            (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8
        };
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

/// One stop of a color ramp.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RampStop {
    /// Height position of this stop in [0, 1].
    pub position: f32,
    /// Color at the stop.
    pub color: Rgba8,
}

/// Externally configured monotone color gradient.
///
/// Samples interpolate between the two stops bracketing the query;
/// queries outside the stop range clamp to the end stops.
#[derive(Clone, Debug)]
pub struct ColorRamp {
    /// Stops sorted ascending by position.
    stops: Vec<RampStop>,
}

impl ColorRamp {
    /// Builds a ramp from stops, sorting them by position.
    ///
    /// Returns `None` when no stops are given: an unbound ramp is a
    /// precondition failure the caller must handle (by skipping
    /// generation), not a malformed ramp.
    #[must_use]
    pub fn new(mut stops: Vec<RampStop>) -> Option<Self> {
        if stops.is_empty() {
            return None;
        }
        stops.sort_by(|a, b| a.position.total_cmp(&b.position));
        Some(Self { stops })
    }

    /// A black-to-white ramp, the default for height visualization.
    #[must_use]
    pub fn grayscale() -> Self {
        Self {
            stops: vec![
                RampStop {
                    position: 0.0,
                    color: Rgba8::BLACK,
                },
                RampStop {
                    position: 1.0,
                    color: Rgba8::WHITE,
                },
            ],
        }
    }

    /// Samples the gradient at a height in [0, 1].
    #[must_use]
    pub fn sample(&self, height: f32) -> Rgba8 {
        let first = self.stops[0];
        if height <= first.position {
            return first.color;
        }
        for pair in self.stops.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if height <= hi.position {
                let span = hi.position - lo.position;
                let t = if span <= f32::EPSILON {
                    1.0
                } else {
                    (height - lo.position) / span
                };
                return lo.color.lerp(hi.color, t);
            }
        }
        self.stops[self.stops.len() - 1].color
    }
}

/// One control point of a remap curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurvePoint {
    /// Input position in [0, 1].
    pub x: f32,
    /// Output value at the point.
    pub y: f32,
}

/// Externally configured monotone remap curve, applied to normalized
/// heights before scaling (e.g. to flatten lowlands).
///
/// Piecewise-linear between sorted control points; clamped outside.
#[derive(Clone, Debug)]
pub struct Curve {
    /// Points sorted ascending by x.
    points: Vec<CurvePoint>,
}

impl Curve {
    /// Builds a curve from control points, sorting them by x.
    ///
    /// Returns `None` when no points are given (unbound curve).
    #[must_use]
    pub fn new(mut points: Vec<CurvePoint>) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        points.sort_by(|a, b| a.x.total_cmp(&b.x));
        Some(Self { points })
    }

    /// The identity curve, `y = x`.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            points: vec![
                CurvePoint { x: 0.0, y: 0.0 },
                CurvePoint { x: 1.0, y: 1.0 },
            ],
        }
    }

    /// Samples the curve at `x`.
    #[must_use]
    pub fn sample(&self, x: f32) -> f32 {
        let first = self.points[0];
        if x <= first.x {
            return first.y;
        }
        for pair in self.points.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if x <= hi.x {
                let span = hi.x - lo.x;
                if span <= f32::EPSILON {
                    return hi.y;
                }
                let t = (x - lo.x) / span;
                return lo.y + (hi.y - lo.y) * t;
            }
        }
        self.points[self.points.len() - 1].y
    }
}

/// Per-cell color classification of a heightfield.
#[derive(Clone, Debug)]
pub struct ColorField {
    /// Grid width in cells.
    width: usize,
    /// Grid height in cells.
    height: usize,
    /// Row-major colors.
    pixels: Vec<Rgba8>,
}

impl ColorField {
    /// Classifies every cell of a heightfield through the ramp.
    #[must_use]
    pub fn classify(field: &Heightfield, ramp: &ColorRamp) -> Self {
        let pixels = field.values().iter().map(|&h| ramp.sample(h)).collect();
        Self {
            width: field.width(),
            height: field.height(),
            pixels,
        }
    }

    /// Grid width in cells.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Returns the row-major colors.
    #[inline]
    #[must_use]
    pub fn pixels(&self) -> &[Rgba8] {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_ramp() -> ColorRamp {
        ColorRamp::new(vec![
            RampStop {
                position: 0.3,
                color: Rgba8::new(0, 0, 200),
            },
            RampStop {
                position: 0.4,
                color: Rgba8::new(210, 180, 90),
            },
            RampStop {
                position: 1.0,
                color: Rgba8::WHITE,
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_ramp_clamps_below_first_stop() {
        let ramp = test_ramp();
        assert_eq!(ramp.sample(0.0), Rgba8::new(0, 0, 200));
        assert_eq!(ramp.sample(0.3), Rgba8::new(0, 0, 200));
    }

    #[test]
    fn test_ramp_interpolates_between_stops() {
        let ramp = test_ramp();
        let mid = ramp.sample(0.35);
        assert_eq!(mid, Rgba8::new(105, 90, 145));
    }

    #[test]
    fn test_empty_ramp_is_unbound() {
        assert!(ColorRamp::new(Vec::new()).is_none());
    }

    #[test]
    fn test_curve_identity_and_clamping() {
        let curve = Curve::identity();
        assert_eq!(curve.sample(0.25), 0.25);
        assert_eq!(curve.sample(-1.0), 0.0);
        assert_eq!(curve.sample(2.0), 1.0);
    }

    #[test]
    fn test_curve_piecewise_interpolation() {
        let curve = Curve::new(vec![
            CurvePoint { x: 0.0, y: 0.0 },
            CurvePoint { x: 0.5, y: 0.1 },
            CurvePoint { x: 1.0, y: 1.0 },
        ])
        .unwrap();
        assert_eq!(curve.sample(0.25), 0.05);
        assert!((curve.sample(0.75) - 0.55).abs() < 1e-6);
    }

    #[test]
    fn test_classify_dimensions_and_lookup() {
        let mut field = Heightfield::new(2, 2);
        field.set(0, 0, 0.0);
        field.set(1, 1, 1.0);
        let colors = ColorField::classify(&field, &ColorRamp::grayscale());
        assert_eq!(colors.width(), 2);
        assert_eq!(colors.height(), 2);
        assert_eq!(colors.pixels()[0], Rgba8::BLACK);
        assert_eq!(colors.pixels()[3], Rgba8::WHITE);
    }
}
