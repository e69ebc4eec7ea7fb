//! Attribute blending boundary.
//!
//! Intersection passes decide which nodes contribute to a split point and
//! with what weight. Computing attribute values is up to the implementor.
//! Blenders receive the node array so they may treat position as one more
//! attribute. The pass restores every target's position afterwards, so
//! blending never moves geometry.

use crate::types::{Node, NodeIndex};

pub trait Blender {
    /// Blend `a` and `b` into `target`; `weight` is the share of `b`.
    fn blend(
        &mut self,
        a: NodeIndex,
        b: NodeIndex,
        target: NodeIndex,
        weight: f64,
        nodes: &mut [Node],
    );

    /// Start accumulating several weighted sources into `target`.
    fn begin_multi_blend(&mut self, _target: NodeIndex, _nodes: &mut [Node]) {}

    /// Accumulate `source` into `target`. Weights are not normalized.
    fn multi_blend(&mut self, source: NodeIndex, target: NodeIndex, weight: f64, nodes: &mut [Node]);

    /// Finish the accumulation started by `begin_multi_blend`.
    fn end_multi_blend(&mut self, _target: NodeIndex, _nodes: &mut [Node]) {}
}
