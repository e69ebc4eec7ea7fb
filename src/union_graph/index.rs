//! Fuse strategies: which existing node, if any, a new point joins.

use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};

use glam::DVec3;

use super::arena::Arena;
use super::sharded::ShardedMap;
use super::UnionNode;
use crate::aabb::Aabb;
use crate::config::{FuseConfig, FuseMethod, Tolerance};
use crate::octree::Octree;
use crate::spatial_key::{grid_key, is_within_tolerance, octree_box, CellKey};
use crate::types::{InputPoint, NodeIndex};

/// Resolves a point to a node index, fusing or creating as needed.
///
/// `insert` may be called from many threads at once. `insert_exclusive`
/// requires unique access and takes no locks.
pub(crate) trait FuseIndex: Send + Sync + Debug {
    fn insert(&self, nodes: &Arena<UnionNode>, point: &InputPoint) -> NodeIndex;

    fn insert_exclusive(&mut self, nodes: &mut Arena<UnionNode>, point: &InputPoint)
        -> NodeIndex;
}

pub(crate) fn build(config: &FuseConfig) -> Box<dyn FuseIndex> {
    match config.method {
        FuseMethod::Grid => Box::new(GridIndex::new(config.tolerance, config.voxel_offset)),
        FuseMethod::Octree => Box::new(OctreeIndex::new(
            config.tolerance,
            config.bounds.expand(config.tolerance.extents()),
        )),
    }
}

/// Points sharing a grid cell share a node.
#[derive(Debug)]
pub(crate) struct GridIndex {
    tolerance: Tolerance,
    offset: DVec3,
    cells: ShardedMap<CellKey>,
}

impl GridIndex {
    pub fn new(tolerance: Tolerance, offset: DVec3) -> Self {
        Self {
            tolerance,
            offset,
            cells: ShardedMap::new(),
        }
    }
}

impl FuseIndex for GridIndex {
    fn insert(&self, nodes: &Arena<UnionNode>, point: &InputPoint) -> NodeIndex {
        let key = grid_key(point.position, &self.tolerance, self.offset);
        let (index, created) = self
            .cells
            .get_or_insert_with(key, || nodes.push(UnionNode::new(point)));
        if !created {
            nodes.with(index, |n| n.fuse(point));
        }
        index
    }

    fn insert_exclusive(
        &mut self,
        nodes: &mut Arena<UnionNode>,
        point: &InputPoint,
    ) -> NodeIndex {
        let key = grid_key(point.position, &self.tolerance, self.offset);
        let (index, created) = self
            .cells
            .get_or_insert_with_mut(key, || nodes.push_mut(UnionNode::new(point)));
        if !created {
            nodes.get_mut(index).fuse(point);
        }
        index
    }
}

/// A point joins the closest node whose representative lies within tolerance.
#[derive(Debug)]
pub(crate) struct OctreeIndex {
    tolerance: Tolerance,
    tree: Mutex<Octree<NodeIndex>>,
}

impl OctreeIndex {
    pub fn new(tolerance: Tolerance, bounds: Aabb) -> Self {
        Self {
            tolerance,
            tree: Mutex::new(Octree::new(bounds)),
        }
    }
}

/// Closest candidate by distance to its running center. Ties go to the lower index.
fn closest_candidate(
    tree: &Octree<NodeIndex>,
    tolerance: &Tolerance,
    p: DVec3,
    mut probe: impl FnMut(NodeIndex) -> (DVec3, DVec3),
) -> Option<NodeIndex> {
    let query = octree_box(p, tolerance);
    let mut best: Option<(f64, NodeIndex)> = None;
    tree.for_each_in(&query, |_, index| {
        let (representative, center) = probe(index);
        if !is_within_tolerance(representative, p, tolerance) {
            return;
        }
        let d = center.distance_squared(p);
        let better = match best {
            None => true,
            Some((bd, bi)) => d < bd || (d == bd && index < bi),
        };
        if better {
            best = Some((d, index));
        }
    });
    best.map(|(_, index)| index)
}

impl FuseIndex for OctreeIndex {
    fn insert(&self, nodes: &Arena<UnionNode>, point: &InputPoint) -> NodeIndex {
        // Query and insert form one critical section.
        let mut tree = self.tree.lock().unwrap_or_else(PoisonError::into_inner);
        let found = closest_candidate(&tree, &self.tolerance, point.position, |i| {
            nodes.with(i, |n| (n.representative, n.center))
        });
        match found {
            Some(index) => {
                nodes.with(index, |n| n.fuse(point));
                index
            }
            None => {
                let index = nodes.push(UnionNode::new(point));
                tree.insert_point(point.position, index);
                index
            }
        }
    }

    fn insert_exclusive(
        &mut self,
        nodes: &mut Arena<UnionNode>,
        point: &InputPoint,
    ) -> NodeIndex {
        let tree = self.tree.get_mut().unwrap_or_else(PoisonError::into_inner);
        let found = closest_candidate(tree, &self.tolerance, point.position, |i| {
            let n = nodes.get_mut(i);
            (n.representative, n.center)
        });
        match found {
            Some(index) => {
                nodes.get_mut(index).fuse(point);
                index
            }
            None => {
                let index = nodes.push_mut(UnionNode::new(point));
                tree.insert_point(point.position, index);
                index
            }
        }
    }
}
