//! Edges crossing each other.

use glam::DVec3;
use log::{debug, warn};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use super::geometry::segment_closest_points;
use super::{root_union, IntersectionCache};
use crate::aabb::Aabb;
use crate::blend::Blender;
use crate::config::{DotRange, EdgeEdgeConfig};
use crate::error::FuseError;
use crate::graph::Graph;
use crate::metadata::IntersectionKind;
use crate::spatial_key::h64u;
use crate::timing::Timer;
use crate::types::{EdgeIndex, NodeIndex};

/// Node index of a crossing not yet assigned by [`EdgeEdgeIntersections::collapse`].
pub const UNASSIGNED: NodeIndex = NodeIndex::MAX;

/// Two edges passing within tolerance of each other at interior points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    pub edge_a: EdgeIndex,
    pub edge_b: EdgeIndex,
    /// Midpoint of the closest points on both edges.
    pub center: DVec3,
    pub time_a: f64,
    pub time_b: f64,
    pub node: NodeIndex,
}

impl Crossing {
    /// Position of the crossing along `edge`, which must be one of the pair.
    #[inline]
    pub fn time_on(&self, edge: EdgeIndex) -> f64 {
        if edge == self.edge_a {
            self.time_a
        } else {
            self.time_b
        }
    }
}

/// Crossings on one edge. Ordered by time along the edge once collapsed.
#[derive(Debug, Clone)]
pub struct EdgeEdgeProxy {
    pub index: EdgeIndex,
    pub start: NodeIndex,
    pub end: NodeIndex,
    pub bounds: Aabb,
    pub crossings: Vec<Crossing>,
}

/// Progress of a pass. Each commit step requires the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Found,
    Collapsed,
    NodesInserted,
}

#[derive(Debug)]
pub struct EdgeEdgeIntersections {
    config: EdgeEdgeConfig,
    dot_range: DotRange,
    cache: IntersectionCache,
    proxies: Vec<EdgeEdgeProxy>,
    crossings: Vec<Crossing>,
    start_index: NodeIndex,
    stage: Stage,
}

impl EdgeEdgeIntersections {
    pub fn new(graph: &Graph, config: EdgeEdgeConfig) -> Result<Self, FuseError> {
        config.validate()?;
        Ok(Self {
            config,
            dot_range: config.dot_range(),
            cache: IntersectionCache::build(graph, config.tolerance, true),
            proxies: Vec::new(),
            crossings: Vec::new(),
            start_index: graph.num_nodes() as NodeIndex,
            stage: Stage::Found,
        })
    }

    #[inline]
    pub fn cache(&self) -> &IntersectionCache {
        &self.cache
    }

    #[inline]
    pub fn proxies(&self) -> &[EdgeEdgeProxy] {
        &self.proxies
    }

    /// Unique crossings, in the order their nodes are numbered.
    #[inline]
    pub fn crossings(&self) -> &[Crossing] {
        &self.crossings
    }

    /// Find every crossing, as seen from each edge.
    pub fn find(&mut self, graph: &Graph) {
        let timer = Timer::start();
        let this = &*self;
        let found: Vec<Option<EdgeEdgeProxy>> = maybe_par_range!(0..this.cache.num_edges())
            .map(|i| this.find_on_edge(graph, i as EdgeIndex))
            .collect();
        self.proxies = found.into_iter().flatten().collect();
        self.crossings.clear();
        self.stage = Stage::Found;
        timer.report("edge/edge find");
    }

    fn find_on_edge(&self, graph: &Graph, edge: EdgeIndex) -> Option<EdgeEdgeProxy> {
        if !self.cache.is_valid(edge) {
            return None;
        }
        let (start, end) = self.cache.endpoints(edge);
        let bounds = self.cache.edge_box(edge);
        let direction = self.cache.direction(edge);

        let mut candidates = Vec::new();
        self.cache.query_edges(&bounds, &mut candidates);
        candidates.sort_unstable();

        let root = (!self.config.enable_self_intersection).then(|| root_union(graph, edge));
        let mut crossings = Vec::new();
        for other in candidates {
            if other == edge || !self.cache.is_valid(other) {
                continue;
            }
            let (s, e) = self.cache.endpoints(other);
            if s == start || s == end || e == start || e == end {
                continue;
            }
            if self.config.uses_angle_filter()
                && !self
                    .dot_range
                    .contains(direction.dot(self.cache.direction(other)).abs())
            {
                continue;
            }
            if let Some(root) = root {
                if root_union(graph, other).overlaps(root) {
                    continue;
                }
            }
            if let Some(crossing) = self.find_split(edge, other) {
                crossings.push(crossing);
            }
        }
        if crossings.is_empty() {
            return None;
        }
        Some(EdgeEdgeProxy {
            index: edge,
            start,
            end,
            bounds,
            crossings,
        })
    }

    /// Closest approach of `edge` and `other`. `None` if the segments stay
    /// at or beyond tolerance, or meet at an endpoint.
    pub fn find_split(&self, edge: EdgeIndex, other: EdgeIndex) -> Option<Crossing> {
        let (a1, b1) = self.cache.segment(edge);
        let (a2, b2) = self.cache.segment(other);
        let (c1, time_a, c2, time_b) = segment_closest_points(a1, b1, a2, b2);
        if c1.distance_squared(c2) >= self.cache.tolerance_sq() {
            return None;
        }
        let ends = [a1, b1, a2, b2];
        if ends.contains(&c1) || ends.contains(&c2) {
            return None;
        }
        Some(Crossing {
            edge_a: edge,
            edge_b: other,
            center: (c1 + c2) * 0.5,
            time_a,
            time_b,
            node: UNASSIGNED,
        })
    }

    /// Merge the two sightings of each crossing into one, number the
    /// resulting nodes after the graph's existing ones, and order every
    /// edge's crossings along it.
    ///
    /// Proxies are visited in edge-index order and the first sighting of a
    /// pair wins, so the outcome does not depend on worker scheduling.
    /// Does nothing if the crossings are already collapsed.
    pub fn collapse(&mut self) {
        if self.stage != Stage::Found {
            return;
        }
        let mut seen: FxHashMap<u64, usize> = FxHashMap::default();
        let mut unique: Vec<Crossing> = Vec::new();
        for proxy in &self.proxies {
            for c in &proxy.crossings {
                seen.entry(h64u(c.edge_a, c.edge_b)).or_insert_with(|| {
                    unique.push(Crossing {
                        node: self.start_index + unique.len() as NodeIndex,
                        ..*c
                    });
                    unique.len() - 1
                });
            }
        }

        // A crossing seen from only one side still splits both edges.
        let mut per_edge: FxHashMap<EdgeIndex, Vec<Crossing>> = FxHashMap::default();
        for c in &unique {
            per_edge.entry(c.edge_a).or_default().push(*c);
            per_edge.entry(c.edge_b).or_default().push(*c);
        }
        let mut edges: Vec<EdgeIndex> = per_edge.keys().copied().collect();
        edges.sort_unstable();

        self.proxies = edges
            .into_iter()
            .map(|edge| {
                let mut crossings = per_edge.remove(&edge).unwrap_or_default();
                crossings.sort_by(|a, b| {
                    a.time_on(edge)
                        .total_cmp(&b.time_on(edge))
                        .then(a.node.cmp(&b.node))
                });
                let (start, end) = self.cache.endpoints(edge);
                EdgeEdgeProxy {
                    index: edge,
                    start,
                    end,
                    bounds: self.cache.edge_box(edge),
                    crossings,
                }
            })
            .collect();
        self.crossings = unique;
        self.stage = Stage::Collapsed;

        debug!(
            "edge/edge: {} crossings on {} edges",
            self.crossings.len(),
            self.proxies.len()
        );
    }

    /// Append one node per crossing, placed at the crossing center.
    ///
    /// Collapses the crossings first if that has not happened yet. If the
    /// graph gained nodes since the pass was created, crossings are
    /// renumbered onto the nodes actually appended.
    pub fn insert_nodes(&mut self, graph: &mut Graph) {
        match self.stage {
            Stage::Found => self.collapse(),
            Stage::Collapsed => {}
            Stage::NodesInserted => return,
        }
        let first = graph.add_nodes(self.crossings.len());
        if first != self.start_index {
            self.renumber(first);
        }
        for c in &self.crossings {
            graph.set_node_center(c.node, c.center);
            graph.metadata_mut().node_or_create(c.node).kind = IntersectionKind::EdgeEdge;
        }
        self.stage = Stage::NodesInserted;
    }

    fn renumber(&mut self, first: NodeIndex) {
        let old = self.start_index;
        let shift = |c: &mut Crossing| c.node = c.node - old + first;
        self.crossings.iter_mut().for_each(shift);
        self.proxies
            .iter_mut()
            .flat_map(|p| p.crossings.iter_mut())
            .for_each(shift);
        self.start_index = first;
    }

    /// Replace every crossed edge by the chain through its crossing nodes.
    ///
    /// Does nothing until [`insert_nodes`](Self::insert_nodes) has run.
    pub fn insert_edges(&self, graph: &mut Graph) {
        if self.stage != Stage::NodesInserted {
            warn!("edge/edge: insert_edges called before insert_nodes, skipped");
            return;
        }
        let kind = IntersectionKind::EdgeEdge;
        let before = graph.num_edges();

        for proxy in &self.proxies {
            let root = graph.metadata().root_edge_index(proxy.index);
            let mut prev = proxy.start;
            for c in &proxy.crossings {
                if let Some(e) = graph.insert_sub_edge(prev, c.node, root, kind) {
                    graph
                        .metadata_mut()
                        .add_node_and_edge_metadata(c.node, e, root, kind);
                }
                prev = c.node;
            }
            graph.insert_sub_edge(prev, proxy.end, root, kind);
            graph.invalidate_edge(proxy.index);
        }

        debug!(
            "edge/edge: split {} edges into {} new edges",
            self.proxies.len(),
            graph.num_edges() - before
        );
    }

    /// Blend the four endpoints of crossing `index` onto its node.
    ///
    /// Each edge contributes its start with weight `1 - t` and its end with
    /// weight `t`, where `t` is the crossing's time along that edge.
    pub fn blend_intersection<B: Blender + ?Sized>(
        &self,
        index: usize,
        graph: &mut Graph,
        blender: &mut B,
    ) {
        if self.stage != Stage::NodesInserted {
            return;
        }
        let c = &self.crossings[index];
        let target = c.node;
        blender.begin_multi_blend(target, graph.nodes_mut());
        for (edge, t) in [(c.edge_a, c.time_a), (c.edge_b, c.time_b)] {
            let (start, end) = self.cache.endpoints(edge);
            blender.multi_blend(start, target, 1.0 - t, graph.nodes_mut());
            blender.multi_blend(end, target, t, graph.nodes_mut());
        }
        blender.end_multi_blend(target, graph.nodes_mut());
        graph.set_node_center(target, c.center);
    }

    pub fn blend_all<B: Blender + ?Sized>(&self, graph: &mut Graph, blender: &mut B) {
        for i in 0..self.crossings.len() {
            self.blend_intersection(i, graph, blender);
        }
    }
}
