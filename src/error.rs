//! Error types for graph fusion.

use thiserror::Error;

/// Configuration errors, rejected before any insertion happens.
///
/// Geometry problems met during a job (zero-length edges, edges whose
/// endpoints fuse together) are absorbed silently and never surface here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FuseError {
    /// Tolerance must be finite and strictly positive.
    #[error("invalid tolerance: expected a finite value > 0, got {0}")]
    InvalidTolerance(f64),

    /// One axis of a component-wise tolerance is not finite and strictly positive.
    #[error("invalid component-wise tolerance on axis {axis}: expected a finite value > 0, got {value}")]
    InvalidComponentTolerance { axis: usize, value: f64 },

    /// Bounding volume has non-finite corners or `min > max` on some axis.
    #[error("degenerate bounding volume: min {min:?}, max {max:?}")]
    DegenerateBounds { min: [f64; 3], max: [f64; 3] },

    /// Angle filter bound outside `[0, 90]` degrees.
    #[error("invalid {which} angle: expected degrees in [0, 90], got {value}")]
    InvalidAngle { which: &'static str, value: f64 },

    /// Angle filter with `min_angle > max_angle`.
    #[error("angle range is inverted: min {min} > max {max}")]
    InvertedAngleRange { min: f64, max: f64 },
}
