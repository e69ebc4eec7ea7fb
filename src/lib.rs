//! Spatial fusion and intersection discovery for 3D point/edge graphs.
//!
//! Points from any number of datasets are fused into nodes under a
//! tolerance, duplicate edges between the same node pair are merged, and the
//! result is collapsed into a [`Graph`] whose ordering is independent of how
//! many threads inserted and in what order. Optional passes then split edges
//! at points lying on them ([`PointEdgeIntersections`]) and at crossings with
//! other edges ([`EdgeEdgeIntersections`]).
//!
//! # Example
//!
//! ```
//! use glam::DVec3;
//! use union_graph::{
//!     Aabb, EdgeEdgeConfig, EdgeEdgeIntersections, EdgeSource, FuseConfig, InputPoint,
//!     SourceRef, UnionGraph,
//! };
//!
//! let bounds = Aabb::new(DVec3::ZERO, DVec3::new(1.0, 1.0, 0.0));
//! let fuse = UnionGraph::new(FuseConfig::grid(0.01, bounds)).expect("valid config");
//!
//! let p = |x: f64, y: f64, i: u32| InputPoint::new([x, y, 0.0], SourceRef::new(0, i));
//! fuse.insert_edge(p(0.0, 0.0, 0), p(1.0, 1.0, 1), EdgeSource::Abstract { dataset: 0 });
//! fuse.insert_edge(p(1.0, 0.0, 2), p(0.0, 1.0, 3), EdgeSource::Abstract { dataset: 0 });
//!
//! let mut graph = fuse.collapse();
//! let mut pass = EdgeEdgeIntersections::new(&graph, EdgeEdgeConfig::default()).unwrap();
//! pass.find(&graph);
//! pass.collapse();
//! pass.insert_nodes(&mut graph);
//! pass.insert_edges(&mut graph);
//!
//! assert_eq!(graph.num_nodes(), 5);
//! assert_eq!(graph.num_valid_edges(), 4);
//! ```

mod aabb;
mod blend;
mod config;
mod error;
mod graph;
mod metadata;
mod types;
mod union_graph;

pub mod intersections;
pub mod octree;
pub mod sort;
pub mod spatial_key;

pub(crate) mod timing;

pub use aabb::Aabb;
pub use blend::Blender;
pub use config::{
    degrees_to_dot, DotRange, EdgeEdgeConfig, FuseConfig, FuseMethod, PointEdgeConfig, Tolerance,
};
pub use error::FuseError;
pub use graph::Graph;
pub use intersections::{
    Crossing, EdgeEdgeIntersections, IntersectionCache, PointEdgeIntersections,
};
pub use metadata::{EdgeMetadata, GraphMetadata, IntersectionKind, NodeMetadata};
pub use types::{
    Edge, EdgeIndex, EdgeSource, InputPoint, Node, NodeIndex, SourceRef, UnionEntry, Vec3Like,
};
pub use union_graph::{BatchInserter, UnionGraph};
