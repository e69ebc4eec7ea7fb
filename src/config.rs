//! Fuse and intersection policies.

use glam::DVec3;

use crate::aabb::Aabb;
use crate::error::FuseError;

/// How near-coincident points are found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FuseMethod {
    /// Snap to a uniform grid whose cell size is the tolerance.
    #[default]
    Grid,
    /// Proximity search in an octree; fuse into the closest node within tolerance.
    Octree,
}

/// Fuse distance, either a radius or per-axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tolerance {
    Uniform(f64),
    /// Each axis compared independently against its own tolerance.
    ComponentWise(DVec3),
}

impl Tolerance {
    /// Per-axis extent used for grid cells and query boxes.
    #[inline]
    pub fn extents(&self) -> DVec3 {
        match *self {
            Tolerance::Uniform(t) => DVec3::splat(t),
            Tolerance::ComponentWise(v) => v,
        }
    }

    fn validate(&self) -> Result<(), FuseError> {
        match *self {
            Tolerance::Uniform(t) => {
                if !(t.is_finite() && t > 0.0) {
                    return Err(FuseError::InvalidTolerance(t));
                }
            }
            Tolerance::ComponentWise(v) => {
                for (axis, value) in v.to_array().into_iter().enumerate() {
                    if !(value.is_finite() && value > 0.0) {
                        return Err(FuseError::InvalidComponentTolerance { axis, value });
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance::Uniform(0.001)
    }
}

/// Point fusion policy for a [`UnionGraph`](crate::UnionGraph).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuseConfig {
    pub method: FuseMethod,
    pub tolerance: Tolerance,
    /// Volume enclosing every inserted position. Sizes the octree and
    /// quantizes canonical ordering keys.
    pub bounds: Aabb,
    /// Shifts grid cell boundaries (grid mode only).
    pub voxel_offset: DVec3,
}

impl FuseConfig {
    pub fn grid(tolerance: f64, bounds: Aabb) -> Self {
        Self {
            method: FuseMethod::Grid,
            tolerance: Tolerance::Uniform(tolerance),
            bounds,
            voxel_offset: DVec3::ZERO,
        }
    }

    pub fn octree(tolerance: f64, bounds: Aabb) -> Self {
        Self {
            method: FuseMethod::Octree,
            tolerance: Tolerance::Uniform(tolerance),
            bounds,
            voxel_offset: DVec3::ZERO,
        }
    }

    pub fn with_component_wise(mut self, tolerances: DVec3) -> Self {
        self.tolerance = Tolerance::ComponentWise(tolerances);
        self
    }

    pub fn with_voxel_offset(mut self, offset: DVec3) -> Self {
        self.voxel_offset = offset;
        self
    }

    /// Reject configurations under which the fuse relation is ill-defined.
    pub fn validate(&self) -> Result<(), FuseError> {
        self.tolerance.validate()?;
        if !self.bounds.is_valid() {
            return Err(FuseError::DegenerateBounds {
                min: self.bounds.min.to_array(),
                max: self.bounds.max.to_array(),
            });
        }
        if !self.voxel_offset.is_finite() {
            return Err(FuseError::DegenerateBounds {
                min: self.bounds.min.to_array(),
                max: self.bounds.max.to_array(),
            });
        }
        Ok(())
    }
}

/// Point/edge intersection policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointEdgeConfig {
    /// Maximum distance between a point and an edge for the point to split it.
    pub tolerance: f64,
    /// If false, a point never splits an edge sharing one of its datasets.
    pub enable_self_intersection: bool,
    /// Move split points onto the edge.
    pub snap_on_edge: bool,
    /// Fixed blend factor; `None` blends at the split's position along the edge.
    pub blend_weight: Option<f64>,
}

impl Default for PointEdgeConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.001,
            enable_self_intersection: true,
            snap_on_edge: false,
            blend_weight: None,
        }
    }
}

impl PointEdgeConfig {
    pub fn validate(&self) -> Result<(), FuseError> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(FuseError::InvalidTolerance(self.tolerance));
        }
        Ok(())
    }
}

/// Edge/edge intersection policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeEdgeConfig {
    /// Maximum distance between two segments for them to be considered crossing.
    pub tolerance: f64,
    /// If false, edges sharing a root dataset never split each other.
    pub enable_self_intersection: bool,
    /// Smallest accepted angle between the two edges, in degrees.
    pub min_angle: Option<f64>,
    /// Largest accepted angle between the two edges, in degrees.
    pub max_angle: Option<f64>,
}

impl Default for EdgeEdgeConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.001,
            enable_self_intersection: true,
            min_angle: None,
            max_angle: None,
        }
    }
}

impl EdgeEdgeConfig {
    pub fn validate(&self) -> Result<(), FuseError> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(FuseError::InvalidTolerance(self.tolerance));
        }
        for (which, angle) in [("min", self.min_angle), ("max", self.max_angle)] {
            if let Some(value) = angle {
                if !(0.0..=90.0).contains(&value) {
                    return Err(FuseError::InvalidAngle { which, value });
                }
            }
        }
        if let (Some(min), Some(max)) = (self.min_angle, self.max_angle) {
            if min > max {
                return Err(FuseError::InvertedAngleRange { min, max });
            }
        }
        Ok(())
    }

    #[inline]
    pub fn uses_angle_filter(&self) -> bool {
        self.min_angle.is_some() || self.max_angle.is_some()
    }

    pub fn dot_range(&self) -> DotRange {
        DotRange {
            min_dot: self.max_angle.map_or(0.0, degrees_to_dot),
            max_dot: self.min_angle.map_or(1.0, degrees_to_dot),
        }
    }
}

/// Accepted range of `|dot(dir_a, dir_b)|` between two edge directions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DotRange {
    pub min_dot: f64,
    pub max_dot: f64,
}

impl DotRange {
    #[inline]
    pub fn contains(&self, abs_dot: f64) -> bool {
        abs_dot >= self.min_dot && abs_dot <= self.max_dot
    }
}

#[inline]
pub fn degrees_to_dot(angle: f64) -> f64 {
    angle.to_radians().cos()
}
