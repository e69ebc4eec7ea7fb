//! Closest-point queries on segments.

use glam::DVec3;

/// Squared lengths at or below this count as zero.
pub const ZERO_LENGTH_SQUARED: f64 = 1e-8;

/// Per-axis distance at or below which two points count as coincident.
pub const COINCIDENT_DISTANCE: f64 = 1e-4;

/// True if `a` and `b` are within [`COINCIDENT_DISTANCE`] on every axis.
#[inline]
pub fn is_nearly_coincident(a: DVec3, b: DVec3) -> bool {
    (a - b).abs().cmple(DVec3::splat(COINCIDENT_DISTANCE)).all()
}

/// Parameter in `[0, 1]` of the point on `a..b` closest to `p`.
#[inline]
pub fn segment_param(p: DVec3, a: DVec3, b: DVec3) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= 0.0 {
        return 0.0;
    }
    ((p - a).dot(ab) / len2).clamp(0.0, 1.0)
}

#[inline]
pub fn closest_point_on_segment(p: DVec3, a: DVec3, b: DVec3) -> DVec3 {
    let t = segment_param(p, a, b);
    // Exact endpoints at the clamped ends so callers can compare against them.
    if t <= 0.0 {
        a
    } else if t >= 1.0 {
        b
    } else {
        a + (b - a) * t
    }
}

/// Closest points between segments `p1..q1` and `p2..q2`, with their
/// parameters along each segment.
///
/// Returns `(c1, s, c2, t)` with `c1 = p1 + s * (q1 - p1)` and
/// `c2 = p2 + t * (q2 - p2)`. Parameters at 0 or 1 return the exact endpoint.
pub fn segment_closest_points(
    p1: DVec3,
    q1: DVec3,
    p2: DVec3,
    q2: DVec3,
) -> (DVec3, f64, DVec3, f64) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(r);

    let (s, t) = if a <= f64::EPSILON && e <= f64::EPSILON {
        (0.0, 0.0)
    } else if a <= f64::EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if e <= f64::EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            let mut s = if denom > 0.0 {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };

    (lerp_exact(p1, q1, s), s, lerp_exact(p2, q2, t), t)
}

#[inline]
fn lerp_exact(a: DVec3, b: DVec3, t: f64) -> DVec3 {
    if t <= 0.0 {
        a
    } else if t >= 1.0 {
        b
    } else {
        a + (b - a) * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closest_point_on_segment() {
        let a = DVec3::ZERO;
        let b = DVec3::new(2.0, 0.0, 0.0);
        assert_eq!(closest_point_on_segment(DVec3::new(1.0, 1.0, 0.0), a, b), DVec3::X);
        assert_eq!(closest_point_on_segment(DVec3::new(-1.0, 1.0, 0.0), a, b), a);
        assert_eq!(closest_point_on_segment(DVec3::new(5.0, 0.0, 0.0), a, b), b);
        assert_eq!(segment_param(DVec3::new(0.5, 3.0, 0.0), a, b), 0.25);
    }

    #[test]
    fn test_nearly_coincident_is_per_axis() {
        let a = DVec3::new(1.0, 2.0, 3.0);
        assert!(is_nearly_coincident(a, a));
        assert!(is_nearly_coincident(a, a + DVec3::splat(5e-5)));
        assert!(is_nearly_coincident(a, a + DVec3::new(1e-10, 1e-6, 0.0)));
        assert!(!is_nearly_coincident(a, a + DVec3::new(0.0, 2e-4, 0.0)));
    }

    #[test]
    fn test_crossing_segments() {
        let (c1, s, c2, t) = segment_closest_points(
            DVec3::ZERO,
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::X,
            DVec3::Y,
        );
        assert!((c1 - DVec3::new(0.5, 0.5, 0.0)).length() < 1e-12);
        assert!((c2 - c1).length() < 1e-12);
        assert!((s - 0.5).abs() < 1e-12);
        assert!((t - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_skew_and_parallel_segments() {
        let (c1, _, c2, _) = segment_closest_points(
            DVec3::new(-1.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, -1.0, 1.0),
            DVec3::new(0.0, 1.0, 1.0),
        );
        assert!((c1 - DVec3::ZERO).length() < 1e-12);
        assert!((c2 - DVec3::Z).length() < 1e-12);

        let (c1, _, c2, _) = segment_closest_points(
            DVec3::ZERO,
            DVec3::X,
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
        );
        assert!((c1.distance(c2) - 1.0).abs() < 1e-12);
    }
}
