//! Pure key functions: grid cells, query boxes, tolerance tests and index-pair hashes.

use glam::DVec3;

use crate::aabb::Aabb;
use crate::config::Tolerance;

/// Integer grid cell of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey(pub i64, pub i64, pub i64);

#[inline(always)]
fn floor_sat_i64(x: f64) -> i64 {
    if x.is_nan() {
        return 0;
    }
    // `as` saturates at the i64 range.
    x.floor() as i64
}

/// Cell containing `position` on a grid of cell size `tolerance`, shifted by `offset`.
#[inline]
pub fn grid_key(position: DVec3, tolerance: &Tolerance, offset: DVec3) -> CellKey {
    let p = (position + offset) / tolerance.extents();
    CellKey(floor_sat_i64(p.x), floor_sat_i64(p.y), floor_sat_i64(p.z))
}

/// Box of candidates an octree query must visit for `position`.
#[inline]
pub fn octree_box(position: DVec3, tolerance: &Tolerance) -> Aabb {
    let e = tolerance.extents();
    Aabb::new(position - e, position + e)
}

/// Strict fuse test: `distance < tolerance` (radius) or `|delta_i| < tolerance_i` on every axis.
#[inline]
pub fn is_within_tolerance(a: DVec3, b: DVec3, tolerance: &Tolerance) -> bool {
    match *tolerance {
        Tolerance::Uniform(t) => a.distance_squared(b) < t * t,
        Tolerance::ComponentWise(t) => (a - b).abs().cmplt(t).all(),
    }
}

/// Order-dependent hash of an index pair.
#[inline(always)]
pub fn h64(a: u32, b: u32) -> u64 {
    ((a as u64) << 32) | b as u64
}

/// Order-independent hash of an index pair: `h64u(a, b) == h64u(b, a)`.
#[inline(always)]
pub fn h64u(a: u32, b: u32) -> u64 {
    if a < b {
        h64(a, b)
    } else {
        h64(b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_key_boundary() {
        let tol = Tolerance::Uniform(0.5);
        assert_eq!(grid_key(DVec3::ZERO, &tol, DVec3::ZERO), CellKey(0, 0, 0));
        assert_eq!(
            grid_key(DVec3::new(0.49, 0.0, 0.0), &tol, DVec3::ZERO),
            CellKey(0, 0, 0)
        );
        assert_eq!(
            grid_key(DVec3::new(0.5, 0.0, 0.0), &tol, DVec3::ZERO),
            CellKey(1, 0, 0)
        );
        assert_eq!(
            grid_key(DVec3::new(-0.01, 0.0, 0.0), &tol, DVec3::ZERO),
            CellKey(-1, 0, 0)
        );
        // Offset shifts the cell boundary.
        assert_eq!(
            grid_key(DVec3::new(0.49, 0.0, 0.0), &tol, DVec3::new(0.02, 0.0, 0.0)),
            CellKey(1, 0, 0)
        );
    }

    #[test]
    fn test_grid_key_component_wise() {
        let tol = Tolerance::ComponentWise(DVec3::new(1.0, 0.1, 10.0));
        assert_eq!(
            grid_key(DVec3::new(1.5, 0.25, 15.0), &tol, DVec3::ZERO),
            CellKey(1, 2, 1)
        );
    }

    #[test]
    fn test_tolerance_is_strict() {
        let tol = Tolerance::Uniform(1.0);
        assert!(!is_within_tolerance(DVec3::ZERO, DVec3::X, &tol));
        assert!(is_within_tolerance(DVec3::ZERO, DVec3::X * (1.0 - 1e-9), &tol));

        let cw = Tolerance::ComponentWise(DVec3::new(1.0, 0.5, 0.5));
        assert!(is_within_tolerance(DVec3::ZERO, DVec3::new(0.9, 0.4, 0.0), &cw));
        assert!(!is_within_tolerance(DVec3::ZERO, DVec3::new(0.9, 0.5, 0.0), &cw));
    }

    #[test]
    fn test_pair_hashes() {
        assert_eq!(h64u(3, 9), h64u(9, 3));
        assert_ne!(h64(3, 9), h64(9, 3));
        assert_eq!(h64u(9, 3), (3u64 << 32) | 9);
        assert_ne!(h64u(1, 2), h64u(1, 3));
    }

    #[test]
    fn test_octree_box() {
        let b = octree_box(DVec3::ONE, &Tolerance::Uniform(0.25));
        assert_eq!(b.min, DVec3::splat(0.75));
        assert_eq!(b.max, DVec3::splat(1.25));
    }
}
