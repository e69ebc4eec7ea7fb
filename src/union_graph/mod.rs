//! Concurrent point and edge fusion.
//!
//! Workers share a [`UnionGraph`] by reference and insert points and edges
//! from any number of threads. Points within tolerance fuse into one node
//! and edges between the same node pair fuse into one edge. Once every
//! insert is done, [`UnionGraph::collapse`] consumes the graph and produces
//! a [`Graph`](crate::Graph) whose ordering does not depend on how the
//! inserts were scheduled.
//!
//! ```
//! use glam::DVec3;
//! use union_graph::{Aabb, EdgeSource, FuseConfig, InputPoint, SourceRef, UnionGraph};
//!
//! let bounds = Aabb::new(DVec3::ZERO, DVec3::ONE);
//! let graph = UnionGraph::new(FuseConfig::grid(0.01, bounds)).unwrap();
//!
//! let a = InputPoint::new([0.0, 0.0, 0.0], SourceRef::new(0, 0));
//! let b = InputPoint::new([1.0, 0.0, 0.0], SourceRef::new(0, 1));
//! graph.insert_edge(a, b, EdgeSource::Element(SourceRef::new(0, 0)));
//! graph.insert_edge(b, a, EdgeSource::Element(SourceRef::new(1, 0)));
//!
//! let graph = graph.collapse();
//! assert_eq!(graph.num_nodes(), 2);
//! assert_eq!(graph.num_edges(), 1);
//! assert_eq!(graph.edge_union(0).size(), 2);
//! ```

macro_rules! maybe_par_iter_mut {
    ($v:expr) => {{
        #[cfg(feature = "parallel")]
        {
            $v.par_iter_mut()
        }
        #[cfg(not(feature = "parallel"))]
        {
            $v.iter_mut()
        }
    }};
}

macro_rules! maybe_par_iter {
    ($v:expr) => {{
        #[cfg(feature = "parallel")]
        {
            $v.par_iter()
        }
        #[cfg(not(feature = "parallel"))]
        {
            $v.iter()
        }
    }};
}

mod arena;
mod collapse;
mod index;
mod sharded;

use glam::DVec3;
use log::trace;

use crate::config::FuseConfig;
use crate::error::FuseError;
use crate::spatial_key::h64u;
use crate::types::{EdgeIndex, EdgeSource, InputPoint, NodeIndex, SourceRef, UnionEntry};
use arena::Arena;
use index::FuseIndex;
use sharded::ShardedMap;

/// A node under construction.
#[derive(Debug, Clone)]
pub(crate) struct UnionNode {
    /// Running mean of `samples`.
    center: DVec3,
    /// Position of the first sample. Octree candidates are tested against it.
    representative: DVec3,
    samples: Vec<(SourceRef, DVec3)>,
}

impl UnionNode {
    fn new(point: &InputPoint) -> Self {
        Self {
            center: point.position,
            representative: point.position,
            samples: vec![(point.source, point.position)],
        }
    }

    #[inline]
    fn fuse(&mut self, point: &InputPoint) {
        self.samples.push((point.source, point.position));
        let n = self.samples.len() as f64;
        self.center += (point.position - self.center) / n;
    }
}

/// An edge under construction. Endpoints are pre-collapse node indices.
#[derive(Debug, Clone)]
pub(crate) struct UnionEdge {
    start: NodeIndex,
    end: NodeIndex,
    union: UnionEntry,
}

impl UnionEdge {
    fn new(start: NodeIndex, end: NodeIndex, source: EdgeSource) -> Self {
        Self {
            start,
            end,
            union: UnionEntry::new(source.source_ref()),
        }
    }
}

/// Thread-safe fusion of points into nodes and edges into unique node pairs.
///
/// Node and edge indices returned before [`collapse`](Self::collapse) are
/// provisional: collapse renumbers everything.
#[derive(Debug)]
pub struct UnionGraph {
    config: FuseConfig,
    nodes: Arena<UnionNode>,
    edges: Arena<UnionEdge>,
    edge_map: ShardedMap<u64>,
    index: Box<dyn FuseIndex>,
}

impl UnionGraph {
    /// Create an empty graph. Fails if `config` does not describe a valid fuse relation.
    pub fn new(config: FuseConfig) -> Result<Self, FuseError> {
        config.validate()?;
        Ok(Self {
            config,
            nodes: Arena::new(),
            edges: Arena::new(),
            edge_map: ShardedMap::new(),
            index: index::build(&config),
        })
    }

    #[inline]
    pub fn config(&self) -> &FuseConfig {
        &self.config
    }

    pub fn reserve(&mut self, nodes: usize, edges: usize) {
        self.nodes.reserve(nodes);
        self.edges.reserve(edges);
    }

    /// Nodes created so far.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Distinct edges created so far.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Fuse `point` into an existing node within tolerance, or create a new node.
    pub fn insert_point(&self, point: InputPoint) -> NodeIndex {
        self.index.insert(&self.nodes, &point)
    }

    /// Insert both endpoints, then fuse the edge into any existing edge
    /// between the same node pair.
    ///
    /// Returns `None` when both endpoints fuse into the same node; the edge
    /// is dropped.
    pub fn insert_edge(
        &self,
        from: InputPoint,
        to: InputPoint,
        source: EdgeSource,
    ) -> Option<EdgeIndex> {
        let start = self.insert_point(from);
        let end = self.insert_point(to);
        if start == end {
            trace!("edge {source:?} fused entirely into node {start}");
            return None;
        }
        let (index, created) = self.edge_map.get_or_insert_with(h64u(start, end), || {
            self.edges.push(UnionEdge::new(start, end, source))
        });
        if !created {
            self.edges.with(index, |e| e.union.push(source.source_ref()));
        }
        Some(index)
    }

    /// Lock-free inserter for callers that hold the graph exclusively.
    pub fn batch_inserter(&mut self) -> BatchInserter<'_> {
        BatchInserter { graph: self }
    }
}

/// Same semantics as [`UnionGraph::insert_point`] / [`UnionGraph::insert_edge`]
/// without taking any lock.
///
/// The inserter borrows the graph mutably, so no other thread can insert
/// while it is alive.
pub struct BatchInserter<'a> {
    graph: &'a mut UnionGraph,
}

impl BatchInserter<'_> {
    pub fn insert_point(&mut self, point: InputPoint) -> NodeIndex {
        let g = &mut *self.graph;
        g.index.insert_exclusive(&mut g.nodes, &point)
    }

    pub fn insert_edge(
        &mut self,
        from: InputPoint,
        to: InputPoint,
        source: EdgeSource,
    ) -> Option<EdgeIndex> {
        let start = self.insert_point(from);
        let end = self.insert_point(to);
        if start == end {
            trace!("edge {source:?} fused entirely into node {start}");
            return None;
        }
        let g = &mut *self.graph;
        let (index, created) = g.edge_map.get_or_insert_with_mut(h64u(start, end), || {
            g.edges.push_mut(UnionEdge::new(start, end, source))
        });
        if !created {
            g.edges.get_mut(index).union.push(source.source_ref());
        }
        Some(index)
    }

    pub fn num_nodes(&mut self) -> usize {
        self.graph.nodes.len_mut()
    }

    pub fn num_edges(&mut self) -> usize {
        self.graph.edges.len_mut()
    }
}
