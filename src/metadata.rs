//! Per-node and per-edge classification consumed by attribute writers.
//!
//! Entries are created lazily the first time a pass touches an index;
//! a missing entry means the element has nothing special about it.

use rustc_hash::FxHashMap;

use crate::types::{EdgeIndex, NodeIndex};

/// How a node or edge came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IntersectionKind {
    #[default]
    Unknown,
    /// Point lying on an edge, or sub-edge produced by one.
    PointEdge,
    /// Crossing of two edges, or sub-edge produced by one.
    EdgeEdge,
    /// Edge formed by fusing several input edges.
    FusedEdge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeMetadata {
    pub index: NodeIndex,
    pub union_size: usize,
    pub kind: IntersectionKind,
}

impl NodeMetadata {
    pub fn new(index: NodeIndex) -> Self {
        Self {
            index,
            union_size: 0,
            kind: IntersectionKind::Unknown,
        }
    }

    #[inline]
    pub fn is_union(&self) -> bool {
        self.union_size > 1
    }

    /// Point that split an edge.
    #[inline]
    pub fn is_intersector(&self) -> bool {
        self.kind == IntersectionKind::PointEdge
    }

    /// Node created where two edges cross.
    #[inline]
    pub fn is_crossing(&self) -> bool {
        self.kind == IntersectionKind::EdgeEdge
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeMetadata {
    pub index: EdgeIndex,
    /// Original edge this one was split from; `index` itself for unsplit edges.
    pub root_index: EdgeIndex,
    pub union_size: usize,
    pub kind: IntersectionKind,
    pub is_sub_edge: bool,
}

impl EdgeMetadata {
    pub fn new(index: EdgeIndex, root_index: EdgeIndex) -> Self {
        Self {
            index,
            root_index,
            union_size: 0,
            kind: IntersectionKind::Unknown,
            is_sub_edge: false,
        }
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.root_index == self.index
    }

    #[inline]
    pub fn is_union(&self) -> bool {
        self.union_size > 1
    }
}

#[derive(Debug, Clone, Default)]
pub struct GraphMetadata {
    nodes: FxHashMap<NodeIndex, NodeMetadata>,
    edges: FxHashMap<EdgeIndex, EdgeMetadata>,
}

impl GraphMetadata {
    pub fn node(&self, index: NodeIndex) -> Option<&NodeMetadata> {
        self.nodes.get(&index)
    }

    pub fn edge(&self, index: EdgeIndex) -> Option<&EdgeMetadata> {
        self.edges.get(&index)
    }

    pub fn node_or_create(&mut self, index: NodeIndex) -> &mut NodeMetadata {
        self.nodes
            .entry(index)
            .or_insert_with(|| NodeMetadata::new(index))
    }

    /// Existing metadata for `index`, or a fresh entry rooted at `root`.
    pub fn edge_or_create(&mut self, index: EdgeIndex, root: EdgeIndex) -> &mut EdgeMetadata {
        self.edges
            .entry(index)
            .or_insert_with(|| EdgeMetadata::new(index, root))
    }

    /// Original edge that `index` descends from.
    pub fn root_edge_index(&self, index: EdgeIndex) -> EdgeIndex {
        self.edges.get(&index).map_or(index, |m| m.root_index)
    }

    /// Tag `node` with `kind`, and make sure `edge` has metadata rooted at `root`.
    pub fn add_node_and_edge_metadata(
        &mut self,
        node: NodeIndex,
        edge: EdgeIndex,
        root: EdgeIndex,
        kind: IntersectionKind,
    ) {
        self.node_or_create(node).kind = kind;
        self.edge_or_create(edge, root);
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }
}
