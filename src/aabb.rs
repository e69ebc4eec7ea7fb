//! Axis-aligned bounding boxes.

use glam::DVec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    /// An inverted box that any `grow` turns into a valid one.
    pub const EMPTY: Aabb = Aabb {
        min: DVec3::splat(f64::INFINITY),
        max: DVec3::splat(f64::NEG_INFINITY),
    };

    #[inline]
    pub const fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn from_points(a: DVec3, b: DVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Box around a segment, expanded by `tolerance` on every side.
    #[inline]
    pub fn from_segment(a: DVec3, b: DVec3, tolerance: f64) -> Self {
        Self::from_points(a, b).expand(DVec3::splat(tolerance))
    }

    pub fn from_positions<I: IntoIterator<Item = DVec3>>(points: I) -> Self {
        points.into_iter().fold(Self::EMPTY, |b, p| b.grow(p))
    }

    #[inline]
    pub fn grow(self, p: DVec3) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    #[inline]
    pub fn expand(self, by: DVec3) -> Self {
        Self {
            min: self.min - by,
            max: self.max + by,
        }
    }

    #[inline]
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    #[inline]
    pub fn contains(&self, other: &Aabb) -> bool {
        self.min.cmple(other.min).all() && other.max.cmple(self.max).all()
    }

    #[inline]
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Finite corners with `min <= max` on every axis. Flat boxes are allowed.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min.cmple(self.max).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_and_union() {
        let a = Aabb::from_points(DVec3::new(0.0, 1.0, 0.0), DVec3::new(2.0, -1.0, 0.0));
        assert_eq!(a.min, DVec3::new(0.0, -1.0, 0.0));
        assert_eq!(a.max, DVec3::new(2.0, 1.0, 0.0));

        let b = Aabb::from_points(DVec3::new(0.5, -0.5, -1.0), DVec3::new(3.0, 0.5, 1.0));
        let u = a.union(&b);
        assert_eq!(u.min, DVec3::new(0.0, -1.0, -1.0));
        assert_eq!(u.max, DVec3::new(3.0, 1.0, 1.0));
        assert!(a.intersects(&b));
    }

    #[test]
    fn test_touching_boxes_intersect() {
        let a = Aabb::new(DVec3::ZERO, DVec3::ONE);
        let b = Aabb::new(DVec3::new(1.0, 0.0, 0.0), DVec3::new(2.0, 1.0, 1.0));
        let c = Aabb::new(DVec3::new(1.1, 0.0, 0.0), DVec3::new(2.0, 1.0, 1.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_validity() {
        assert!(Aabb::new(DVec3::ZERO, DVec3::new(1.0, 1.0, 0.0)).is_valid());
        assert!(!Aabb::new(DVec3::ONE, DVec3::ZERO).is_valid());
        assert!(!Aabb::EMPTY.is_valid());
        assert!(!Aabb::new(DVec3::ZERO, DVec3::splat(f64::NAN)).is_valid());
        assert!(Aabb::from_positions([DVec3::ZERO, DVec3::ONE]).is_valid());
    }
}
