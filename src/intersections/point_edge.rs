//! Points lying on edges.

use glam::DVec3;
use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::geometry::{closest_point_on_segment, is_nearly_coincident};
use super::{root_union, IntersectionCache};
use crate::aabb::Aabb;
use crate::blend::Blender;
use crate::config::PointEdgeConfig;
use crate::error::FuseError;
use crate::graph::Graph;
use crate::metadata::IntersectionKind;
use crate::octree::Octree;
use crate::timing::Timer;
use crate::types::{EdgeIndex, NodeIndex};

/// A node found within tolerance of an edge's interior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollinearPoint {
    /// Position of `closest` along the edge, in `(0, 1)`.
    pub time: f64,
    /// Projection of the node onto the edge.
    pub closest: DVec3,
    pub node: NodeIndex,
}

/// Splits found on one edge, ordered by `time`.
#[derive(Debug, Clone)]
pub struct PointEdgeProxy {
    pub index: EdgeIndex,
    pub start: NodeIndex,
    pub end: NodeIndex,
    pub bounds: Aabb,
    pub points: Vec<CollinearPoint>,
}

#[derive(Debug)]
pub struct PointEdgeIntersections {
    config: PointEdgeConfig,
    cache: IntersectionCache,
    proxies: Vec<PointEdgeProxy>,
}

impl PointEdgeIntersections {
    pub fn new(graph: &Graph, config: PointEdgeConfig) -> Result<Self, FuseError> {
        config.validate()?;
        Ok(Self {
            config,
            cache: IntersectionCache::build(graph, config.tolerance, false),
            proxies: Vec::new(),
        })
    }

    #[inline]
    pub fn cache(&self) -> &IntersectionCache {
        &self.cache
    }

    /// Edges with at least one split, ascending by edge index.
    #[inline]
    pub fn proxies(&self) -> &[PointEdgeProxy] {
        &self.proxies
    }

    pub fn num_splits(&self) -> usize {
        self.proxies.iter().map(|p| p.points.len()).sum()
    }

    /// Find every node lying on an edge. `graph` must be the graph the pass was built from.
    pub fn find(&mut self, graph: &Graph) {
        let timer = Timer::start();
        let mut points = Octree::new(*self.cache.bounds());
        for (i, &p) in self.cache.positions().iter().enumerate() {
            points.insert_point(p, i as NodeIndex);
        }

        let this = &*self;
        let found: Vec<Option<PointEdgeProxy>> = maybe_par_range!(0..this.cache.num_edges())
            .map(|i| this.find_on_edge(graph, &points, i as EdgeIndex))
            .collect();
        self.proxies = found.into_iter().flatten().collect();

        debug!(
            "point/edge: {} splits on {} edges",
            self.num_splits(),
            self.proxies.len()
        );
        timer.report("point/edge find");
    }

    fn find_on_edge(
        &self,
        graph: &Graph,
        points: &Octree<NodeIndex>,
        edge: EdgeIndex,
    ) -> Option<PointEdgeProxy> {
        if !self.cache.is_valid(edge) {
            return None;
        }
        let (start, end) = self.cache.endpoints(edge);
        let bounds = self.cache.edge_box(edge);

        let mut candidates = Vec::new();
        points.query(&bounds, &mut candidates);
        candidates.sort_unstable();

        let root = (!self.config.enable_self_intersection).then(|| root_union(graph, edge));
        let mut found = Vec::new();
        for node in candidates {
            if node == start || node == end {
                continue;
            }
            let Some(split) = self.find_split(node, edge) else {
                continue;
            };
            if let Some(root) = root {
                if graph.node_union(node).overlaps(root) {
                    continue;
                }
            }
            found.push(split);
        }
        if found.is_empty() {
            return None;
        }
        found.sort_by(|a, b| a.time.total_cmp(&b.time).then(a.node.cmp(&b.node)));

        Some(PointEdgeProxy {
            index: edge,
            start,
            end,
            bounds,
            points: found,
        })
    }

    /// Project `node` onto `edge`. `None` if it projects onto or next to an
    /// endpoint, or lies at or beyond tolerance.
    pub fn find_split(&self, node: NodeIndex, edge: EdgeIndex) -> Option<CollinearPoint> {
        let (a, b) = self.cache.segment(edge);
        let p = self.cache.position(node);
        let closest = closest_point_on_segment(p, a, b);
        if is_nearly_coincident(closest, a) || is_nearly_coincident(closest, b) {
            return None;
        }
        if p.distance_squared(closest) >= self.cache.tolerance_sq() {
            return None;
        }
        let time = (closest - a).dot(b - a) / self.cache.length_squared(edge);
        Some(CollinearPoint {
            time,
            closest,
            node,
        })
    }

    /// Replace every split edge by the chain `start -> p0 -> ... -> end`.
    pub fn insert_edges(&self, graph: &mut Graph) {
        let kind = IntersectionKind::PointEdge;
        let before = graph.num_edges();

        for proxy in &self.proxies {
            let root = graph.metadata().root_edge_index(proxy.index);
            let mut prev = proxy.start;
            for p in &proxy.points {
                if let Some(e) = graph.insert_sub_edge(prev, p.node, root, kind) {
                    graph
                        .metadata_mut()
                        .add_node_and_edge_metadata(p.node, e, root, kind);
                }
                prev = p.node;
            }
            graph.insert_sub_edge(prev, proxy.end, root, kind);
            graph.invalidate_edge(proxy.index);
        }

        if self.config.snap_on_edge {
            for proxy in &self.proxies {
                for p in &proxy.points {
                    graph.set_node_center(p.node, p.closest);
                }
            }
        }

        debug!(
            "point/edge: split {} edges into {} new edges",
            self.proxies.len(),
            graph.num_edges() - before
        );
    }

    /// Blend the endpoints of proxy `index` onto each of its split points.
    pub fn blend_intersection<B: Blender + ?Sized>(
        &self,
        index: usize,
        graph: &mut Graph,
        blender: &mut B,
    ) {
        let proxy = &self.proxies[index];
        for p in &proxy.points {
            let location = graph.node(p.node).center;
            let weight = self.config.blend_weight.unwrap_or(p.time);
            blender.blend(proxy.start, proxy.end, p.node, weight, graph.nodes_mut());
            graph.set_node_center(p.node, location);
        }
    }

    pub fn blend_all<B: Blender + ?Sized>(&self, graph: &mut Graph, blender: &mut B) {
        for i in 0..self.proxies.len() {
            self.blend_intersection(i, graph, blender);
        }
    }
}
