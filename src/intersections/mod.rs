//! Point/edge and edge/edge intersection passes over a collapsed [`Graph`].
//!
//! Each pass snapshots the graph into an [`IntersectionCache`], finds splits
//! in parallel across edges, then commits them sequentially: new nodes
//! first, then sub-edges in edge-index order. Passes can be chained; each
//! one rebuilds its cache from the graph as it is at that point.

macro_rules! maybe_par_range {
    ($range:expr) => {{
        #[cfg(feature = "parallel")]
        {
            ($range).into_par_iter()
        }
        #[cfg(not(feature = "parallel"))]
        {
            $range
        }
    }};
}

mod edge_edge;
pub mod geometry;
mod point_edge;

pub use edge_edge::{Crossing, EdgeEdgeIntersections, EdgeEdgeProxy, UNASSIGNED};
pub use point_edge::{CollinearPoint, PointEdgeIntersections, PointEdgeProxy};

use glam::DVec3;

use self::geometry::ZERO_LENGTH_SQUARED;
use crate::aabb::Aabb;
use crate::graph::Graph;
use crate::octree::Octree;
use crate::types::{EdgeIndex, NodeIndex, UnionEntry};

/// Read-only per-edge data shared by the workers of one pass.
#[derive(Debug, Clone)]
pub struct IntersectionCache {
    tolerance: f64,
    tolerance_sq: f64,
    bounds: Aabb,
    positions: Vec<DVec3>,
    starts: Vec<NodeIndex>,
    ends: Vec<NodeIndex>,
    directions: Vec<DVec3>,
    length_squared: Vec<f64>,
    valid_edges: Vec<bool>,
    edge_index: Option<Octree<EdgeIndex>>,
}

impl IntersectionCache {
    /// Snapshot `graph`. With `index_edges`, valid edges are also inserted
    /// into an octree by their tolerance-expanded box.
    pub fn build(graph: &Graph, tolerance: f64, index_edges: bool) -> Self {
        let positions: Vec<DVec3> = graph.nodes().iter().map(|n| n.center).collect();
        // Snapped or appended nodes may lie outside the fuse bounds.
        let bounds = graph
            .bounds()
            .union(&Aabb::from_positions(positions.iter().copied()))
            .expand(DVec3::splat(tolerance));
        let n = graph.num_edges();
        let mut starts = Vec::with_capacity(n);
        let mut ends = Vec::with_capacity(n);
        let mut directions = Vec::with_capacity(n);
        let mut length_squared = Vec::with_capacity(n);
        let mut valid_edges = Vec::with_capacity(n);

        for e in graph.edges() {
            let a = positions[e.start as usize];
            let b = positions[e.end as usize];
            let d = b - a;
            let len2 = d.length_squared();
            starts.push(e.start);
            ends.push(e.end);
            length_squared.push(len2);
            directions.push(if len2 > 0.0 { d / len2.sqrt() } else { DVec3::ZERO });
            valid_edges.push(e.valid && len2 > ZERO_LENGTH_SQUARED);
        }

        let mut cache = Self {
            tolerance,
            tolerance_sq: tolerance * tolerance,
            bounds,
            positions,
            starts,
            ends,
            directions,
            length_squared,
            valid_edges,
            edge_index: None,
        };

        if index_edges {
            let mut tree = Octree::new(cache.bounds);
            for i in 0..n as EdgeIndex {
                if cache.is_valid(i) {
                    tree.insert(cache.edge_box(i), i);
                }
            }
            cache.edge_index = Some(tree);
        }
        cache
    }

    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    #[inline]
    pub fn tolerance_sq(&self) -> f64 {
        self.tolerance_sq
    }

    /// Box around every node, expanded by the tolerance.
    #[inline]
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.valid_edges.len()
    }

    #[inline]
    pub fn position(&self, node: NodeIndex) -> DVec3 {
        self.positions[node as usize]
    }

    #[inline]
    pub fn positions(&self) -> &[DVec3] {
        &self.positions
    }

    #[inline]
    pub fn endpoints(&self, edge: EdgeIndex) -> (NodeIndex, NodeIndex) {
        (self.starts[edge as usize], self.ends[edge as usize])
    }

    /// Start and end positions of `edge`.
    #[inline]
    pub fn segment(&self, edge: EdgeIndex) -> (DVec3, DVec3) {
        let (a, b) = self.endpoints(edge);
        (self.position(a), self.position(b))
    }

    #[inline]
    pub fn direction(&self, edge: EdgeIndex) -> DVec3 {
        self.directions[edge as usize]
    }

    #[inline]
    pub fn length_squared(&self, edge: EdgeIndex) -> f64 {
        self.length_squared[edge as usize]
    }

    /// False for edges of near-zero length and edges already split.
    #[inline]
    pub fn is_valid(&self, edge: EdgeIndex) -> bool {
        self.valid_edges[edge as usize]
    }

    #[inline]
    pub fn edge_box(&self, edge: EdgeIndex) -> Aabb {
        let (a, b) = self.segment(edge);
        Aabb::from_segment(a, b, self.tolerance)
    }

    /// Valid edges whose box intersects `query`. Empty without an edge index.
    pub fn query_edges(&self, query: &Aabb, out: &mut Vec<EdgeIndex>) {
        if let Some(tree) = &self.edge_index {
            tree.query(query, out);
        }
    }
}

/// Union entry of the edge `edge` descends from, used by the self-intersection filter.
#[inline]
pub(crate) fn root_union(graph: &Graph, edge: EdgeIndex) -> &UnionEntry {
    graph.edge_union(graph.metadata().root_edge_index(edge))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FuseConfig;
    use crate::types::{EdgeSource, InputPoint, SourceRef};
    use crate::UnionGraph;

    #[test]
    fn test_cache_snapshot() {
        let bounds = Aabb::new(DVec3::ZERO, DVec3::splat(4.0));
        let ug = UnionGraph::new(FuseConfig::grid(0.01, bounds)).unwrap();
        let src = EdgeSource::Abstract { dataset: 0 };
        ug.insert_edge(
            InputPoint::new([0.0, 0.0, 0.0], SourceRef::new(0, 0)),
            InputPoint::new([3.0, 0.0, 0.0], SourceRef::new(0, 1)),
            src,
        );
        ug.insert_edge(
            InputPoint::new([0.0, 2.0, 0.0], SourceRef::new(0, 2)),
            InputPoint::new([0.0, 2.0, 4.0], SourceRef::new(0, 3)),
            src,
        );
        let mut graph = ug.collapse();
        graph.invalidate_edge(1);

        let cache = IntersectionCache::build(&graph, 0.1, true);
        assert_eq!(cache.num_edges(), 2);
        assert!(cache.is_valid(0));
        assert!(!cache.is_valid(1));

        let long = (0..2).find(|&i| cache.length_squared(i) == 9.0).unwrap();
        assert_eq!(long, 0);
        assert!((cache.direction(0).length() - 1.0).abs() < 1e-12);

        let mut hits = Vec::new();
        cache.query_edges(&Aabb::new(DVec3::splat(-1.0), DVec3::splat(5.0)), &mut hits);
        assert_eq!(hits, vec![0]);
    }

    #[test]
    fn test_collapsed_edges_are_invalid() {
        let bounds = Aabb::new(DVec3::ZERO, DVec3::splat(4.0));
        let ug = UnionGraph::new(FuseConfig::grid(0.01, bounds)).unwrap();
        let src = EdgeSource::Abstract { dataset: 0 };
        for (i, y) in [0.0, 1.0].into_iter().enumerate() {
            let i = i as u32;
            ug.insert_edge(
                InputPoint::new([0.0, y, 0.0], SourceRef::new(0, 2 * i)),
                InputPoint::new([3.0, y, 0.0], SourceRef::new(0, 2 * i + 1)),
                src,
            );
        }
        let mut graph = ug.collapse();
        let (a, b) = (graph.edge(0).start, graph.edge(0).end);
        let (c, d) = (graph.edge(1).start, graph.edge(1).end);

        let (pa, pc) = (graph.node(a).center, graph.node(c).center);
        graph.set_node_center(b, pa);
        graph.set_node_center(d, pc + DVec3::new(5e-5, 0.0, 0.0));
        let cache = IntersectionCache::build(&graph, 0.1, true);
        assert!(!cache.is_valid(0));
        assert!(!cache.is_valid(1));
        let mut hits = Vec::new();
        cache.query_edges(&Aabb::new(DVec3::splat(-1.0), DVec3::splat(5.0)), &mut hits);
        assert!(hits.is_empty());

        graph.set_node_center(d, pc + DVec3::new(2e-4, 0.0, 0.0));
        let cache = IntersectionCache::build(&graph, 0.1, true);
        assert!(cache.is_valid(1));
    }

    #[test]
    fn test_cache_bounds_cover_moved_nodes() {
        let bounds = Aabb::new(DVec3::ZERO, DVec3::splat(4.0));
        let ug = UnionGraph::new(FuseConfig::grid(0.01, bounds)).unwrap();
        ug.insert_edge(
            InputPoint::new([1.0, 1.0, 1.0], SourceRef::new(0, 0)),
            InputPoint::new([2.0, 1.0, 1.0], SourceRef::new(0, 1)),
            EdgeSource::Abstract { dataset: 0 },
        );
        let mut graph = ug.collapse();
        let end = graph.edge(0).end;
        let outside = DVec3::new(9.0, -3.0, 1.0);
        graph.set_node_center(end, outside);

        let cache = IntersectionCache::build(&graph, 0.1, true);
        assert!(cache.bounds().contains(&Aabb::from_points(outside, outside)));
        let mut hits = Vec::new();
        cache.query_edges(&Aabb::from_points(outside, outside), &mut hits);
        assert_eq!(hits, vec![0]);
    }
}
