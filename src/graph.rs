//! The collapsed graph: canonical node and edge arenas plus union bookkeeping.

use glam::DVec3;
use rustc_hash::FxHashMap;

use crate::aabb::Aabb;
use crate::metadata::{GraphMetadata, IntersectionKind};
use crate::spatial_key::h64u;
use crate::types::{Edge, EdgeIndex, Node, NodeIndex, UnionEntry};

/// Output of [`UnionGraph::collapse`](crate::UnionGraph::collapse).
///
/// Intersection passes append nodes and edges to it; they never reorder or
/// remove anything, so indices stay stable once collapsed. Split edges are
/// kept but marked invalid.
#[derive(Debug, Clone)]
pub struct Graph {
    bounds: Aabb,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    nodes_union: Vec<UnionEntry>,
    edges_union: Vec<UnionEntry>,
    unique_edges: FxHashMap<u64, EdgeIndex>,
    metadata: GraphMetadata,
}

impl Graph {
    pub(crate) fn from_parts(
        bounds: Aabb,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
        nodes_union: Vec<UnionEntry>,
        edges_union: Vec<UnionEntry>,
    ) -> Self {
        debug_assert_eq!(nodes.len(), nodes_union.len());
        debug_assert_eq!(edges.len(), edges_union.len());

        let unique_edges = edges.iter().map(|e| (e.key(), e.index)).collect();

        let mut metadata = GraphMetadata::default();
        for (i, union) in nodes_union.iter().enumerate() {
            if union.size() > 1 {
                metadata.node_or_create(i as NodeIndex).union_size = union.size();
            }
        }
        for (i, union) in edges_union.iter().enumerate() {
            if union.size() > 1 {
                let m = metadata.edge_or_create(i as EdgeIndex, i as EdgeIndex);
                m.union_size = union.size();
                m.kind = IntersectionKind::FusedEdge;
            }
        }

        Self {
            bounds,
            nodes,
            edges,
            nodes_union,
            edges_union,
            unique_edges,
            metadata,
        }
    }

    #[inline]
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Mutable node access for attribute blending.
    #[inline]
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[inline]
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index as usize]
    }

    #[inline]
    pub fn edge(&self, index: EdgeIndex) -> &Edge {
        &self.edges[index as usize]
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// All edges, split ones included.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn num_valid_edges(&self) -> usize {
        self.edges.iter().filter(|e| e.valid).count()
    }

    pub fn valid_edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().filter(|e| e.valid)
    }

    /// Valid edges touching `node`, ascending by index.
    pub fn node_edges(&self, node: NodeIndex) -> Vec<EdgeIndex> {
        self.valid_edges()
            .filter(|e| e.contains(node))
            .map(|e| e.index)
            .collect()
    }

    #[inline]
    pub fn nodes_union(&self) -> &[UnionEntry] {
        &self.nodes_union
    }

    #[inline]
    pub fn edges_union(&self) -> &[UnionEntry] {
        &self.edges_union
    }

    #[inline]
    pub fn node_union(&self, index: NodeIndex) -> &UnionEntry {
        &self.nodes_union[index as usize]
    }

    #[inline]
    pub fn edge_union(&self, index: EdgeIndex) -> &UnionEntry {
        &self.edges_union[index as usize]
    }

    #[inline]
    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    #[inline]
    pub fn metadata_mut(&mut self) -> &mut GraphMetadata {
        &mut self.metadata
    }

    pub fn find_edge(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.unique_edges.get(&h64u(a, b)).copied()
    }

    #[inline]
    pub fn set_node_center(&mut self, index: NodeIndex, center: DVec3) {
        self.nodes[index as usize].center = center;
    }

    /// Add an edge between `a` and `b` unless one already exists.
    ///
    /// Returns the edge index and whether it was created. New edges get an
    /// empty union entry.
    pub fn insert_edge(&mut self, a: NodeIndex, b: NodeIndex, dataset: u32) -> (EdgeIndex, bool) {
        let key = h64u(a, b);
        if let Some(&index) = self.unique_edges.get(&key) {
            return (index, false);
        }
        let index = self.edges.len() as EdgeIndex;
        self.edges.push(Edge::new(index, a, b, dataset));
        self.edges_union.push(UnionEntry::default());
        self.unique_edges.insert(key, index);
        (index, true)
    }

    /// Append `count` nodes at the origin with no source. Returns the first new index.
    pub fn add_nodes(&mut self, count: usize) -> NodeIndex {
        let first = self.nodes.len() as NodeIndex;
        self.nodes.reserve(count);
        self.nodes_union.reserve(count);
        for i in 0..count as NodeIndex {
            self.nodes.push(Node {
                index: first + i,
                center: DVec3::ZERO,
                source: None,
            });
            self.nodes_union.push(UnionEntry::default());
        }
        first
    }

    #[inline]
    pub fn invalidate_edge(&mut self, index: EdgeIndex) {
        self.edges[index as usize].valid = false;
    }

    /// Insert one piece of a split edge and record where it came from.
    ///
    /// A new sub-edge copies `root`'s dataset and union entry. Hitting an
    /// existing edge bumps its union size instead.
    pub(crate) fn insert_sub_edge(
        &mut self,
        a: NodeIndex,
        b: NodeIndex,
        root: EdgeIndex,
        kind: IntersectionKind,
    ) -> Option<EdgeIndex> {
        if a == b {
            return None;
        }
        let dataset = self.edges[root as usize].dataset;
        let (index, created) = self.insert_edge(a, b, dataset);
        if created {
            self.edges_union[index as usize] = self.edges_union[root as usize].clone();
        }
        let base = self.edges_union[index as usize].size();
        let meta = self
            .metadata
            .edge_or_create(index, if created { root } else { index });
        if meta.union_size == 0 {
            meta.union_size = base;
        }
        if !created {
            meta.union_size += 1;
        }
        meta.kind = kind;
        meta.is_sub_edge = true;
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceRef;

    fn line_graph() -> Graph {
        let nodes = (0..3)
            .map(|i| Node {
                index: i,
                center: DVec3::new(i as f64, 0.0, 0.0),
                source: Some(SourceRef::new(0, i)),
            })
            .collect();
        let mut fused = UnionEntry::new(SourceRef::new(0, 0));
        fused.push(SourceRef::new(1, 0));
        Graph::from_parts(
            Aabb::new(DVec3::ZERO, DVec3::new(2.0, 0.0, 0.0)),
            nodes,
            vec![Edge::new(0, 0, 1, 0), Edge::new(1, 1, 2, 0)],
            (0..3).map(|i| UnionEntry::new(SourceRef::new(0, i))).collect(),
            vec![fused, UnionEntry::new(SourceRef::new(0, 1))],
        )
    }

    #[test]
    fn test_from_parts_records_fused_edges() {
        let g = line_graph();
        let m = g.metadata().edge(0).unwrap();
        assert_eq!(m.kind, IntersectionKind::FusedEdge);
        assert_eq!(m.union_size, 2);
        assert!(g.metadata().edge(1).is_none());
        assert!(g.metadata().node(0).is_none());
    }

    #[test]
    fn test_insert_edge_dedups() {
        let mut g = line_graph();
        assert_eq!(g.insert_edge(1, 0, 5), (0, false));
        assert_eq!(g.insert_edge(0, 2, 5), (2, true));
        assert_eq!(g.find_edge(2, 0), Some(2));
        assert_eq!(g.edge(2).dataset, 5);
        assert_eq!(g.num_edges(), 3);
    }

    #[test]
    fn test_sub_edges_inherit_root() {
        let mut g = line_graph();
        let m = g.add_nodes(1);
        assert_eq!(m, 3);
        assert!(g.node(m).source.is_none());

        let a = g.insert_sub_edge(0, m, 0, IntersectionKind::PointEdge).unwrap();
        assert_eq!(g.edge_union(a), g.edge_union(0));
        let meta = g.metadata().edge(a).unwrap();
        assert_eq!((meta.root_index, meta.union_size), (0, 2));
        assert!(meta.is_sub_edge);

        // Re-hitting an existing edge bumps its union size.
        let b = g.insert_sub_edge(1, 2, 0, IntersectionKind::PointEdge).unwrap();
        assert_eq!(b, 1);
        assert_eq!(g.metadata().edge(1).unwrap().union_size, 2);
        assert!(g.insert_sub_edge(2, 2, 0, IntersectionKind::PointEdge).is_none());
    }

    #[test]
    fn test_valid_edges_and_adjacency() {
        let mut g = line_graph();
        assert_eq!(g.node_edges(1), vec![0, 1]);
        g.invalidate_edge(0);
        assert_eq!(g.num_valid_edges(), 1);
        assert_eq!(g.node_edges(1), vec![1]);
        assert!(g.node_edges(0).is_empty());
    }
}
