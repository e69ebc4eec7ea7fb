//! Core element types shared by the union graph and the collapsed graph.

use glam::DVec3;
use smallvec::SmallVec;

/// Index of a node in a node arena.
pub type NodeIndex = u32;

/// Index of an edge in an edge arena.
pub type EdgeIndex = u32;

/// Identity of one original input element: which dataset it came from and
/// its index inside that dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceRef {
    pub dataset: u32,
    pub index: u32,
}

impl SourceRef {
    /// Element index recorded for edges that have no concrete source element.
    pub const ABSTRACT_INDEX: u32 = u32::MAX;

    #[inline]
    pub const fn new(dataset: u32, index: u32) -> Self {
        Self { dataset, index }
    }

    #[inline]
    pub const fn is_abstract(&self) -> bool {
        self.index == Self::ABSTRACT_INDEX
    }
}

/// Identity of the element an inserted edge came from.
///
/// Edges synthesized from point pairs have no concrete source element but
/// still need union bookkeeping, so they are tracked as `Abstract` within a
/// dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeSource {
    Element(SourceRef),
    Abstract { dataset: u32 },
}

impl EdgeSource {
    /// Union-entry record for this source.
    #[inline]
    pub fn source_ref(&self) -> SourceRef {
        match *self {
            EdgeSource::Element(s) => s,
            EdgeSource::Abstract { dataset } => SourceRef::new(dataset, SourceRef::ABSTRACT_INDEX),
        }
    }
}

/// A point to insert: position plus source identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputPoint {
    pub position: DVec3,
    pub source: SourceRef,
}

impl InputPoint {
    #[inline]
    pub fn new<P: Vec3Like>(position: P, source: SourceRef) -> Self {
        Self {
            position: DVec3::new(position.x(), position.y(), position.z()),
            source,
        }
    }
}

/// A fused node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub index: NodeIndex,
    /// Mean of every fused source position.
    pub center: DVec3,
    /// Representative original point; `None` for synthesized crossing nodes.
    pub source: Option<SourceRef>,
}

/// An undirected edge between two distinct nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub index: EdgeIndex,
    pub start: NodeIndex,
    pub end: NodeIndex,
    /// Dataset the edge (or its root, for sub-edges) came from.
    pub dataset: u32,
    /// Cleared once the edge has been split by an intersection pass.
    pub valid: bool,
}

impl Edge {
    #[inline]
    pub fn new(index: EdgeIndex, start: NodeIndex, end: NodeIndex, dataset: u32) -> Self {
        debug_assert_ne!(start, end, "edges never connect a node to itself");
        Self {
            index,
            start,
            end,
            dataset,
            valid: true,
        }
    }

    #[inline]
    pub fn contains(&self, node: NodeIndex) -> bool {
        self.start == node || self.end == node
    }

    #[inline]
    pub fn other(&self, node: NodeIndex) -> NodeIndex {
        if self.start == node {
            self.end
        } else {
            self.start
        }
    }

    #[inline]
    pub fn key(&self) -> u64 {
        crate::spatial_key::h64u(self.start, self.end)
    }
}

/// Original elements that were fused into a single node or edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnionEntry {
    elements: SmallVec<[SourceRef; 2]>,
}

impl UnionEntry {
    pub fn new(first: SourceRef) -> Self {
        let mut elements = SmallVec::new();
        elements.push(first);
        Self { elements }
    }

    #[inline]
    pub fn push(&mut self, source: SourceRef) {
        self.elements.push(source);
    }

    /// Fan-in count.
    #[inline]
    pub fn size(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    pub fn elements(&self) -> &[SourceRef] {
        &self.elements
    }

    pub(crate) fn sort(&mut self) {
        self.elements.sort_unstable();
    }

    /// Distinct datasets contributing to this entry, ascending.
    pub fn datasets(&self) -> SmallVec<[u32; 4]> {
        let mut ids: SmallVec<[u32; 4]> = self.elements.iter().map(|s| s.dataset).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// True if any dataset contributing here also contributes to `other`.
    pub fn overlaps(&self, other: &UnionEntry) -> bool {
        let ours = self.datasets();
        other
            .elements
            .iter()
            .any(|s| ours.binary_search(&s.dataset).is_ok())
    }
}

impl FromIterator<SourceRef> for UnionEntry {
    fn from_iter<I: IntoIterator<Item = SourceRef>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

/// Trait for types that can be used as input positions.
///
/// This allows zero-copy input from various math libraries.
pub trait Vec3Like {
    fn x(&self) -> f64;
    fn y(&self) -> f64;
    fn z(&self) -> f64;
}

impl Vec3Like for DVec3 {
    #[inline]
    fn x(&self) -> f64 {
        self.x
    }
    #[inline]
    fn y(&self) -> f64 {
        self.y
    }
    #[inline]
    fn z(&self) -> f64 {
        self.z
    }
}

impl Vec3Like for glam::Vec3 {
    #[inline]
    fn x(&self) -> f64 {
        self.x as f64
    }
    #[inline]
    fn y(&self) -> f64 {
        self.y as f64
    }
    #[inline]
    fn z(&self) -> f64 {
        self.z as f64
    }
}

impl Vec3Like for [f64; 3] {
    #[inline]
    fn x(&self) -> f64 {
        self[0]
    }
    #[inline]
    fn y(&self) -> f64 {
        self[1]
    }
    #[inline]
    fn z(&self) -> f64 {
        self[2]
    }
}

impl Vec3Like for (f64, f64, f64) {
    #[inline]
    fn x(&self) -> f64 {
        self.0
    }
    #[inline]
    fn y(&self) -> f64 {
        self.1
    }
    #[inline]
    fn z(&self) -> f64 {
        self.2
    }
}
