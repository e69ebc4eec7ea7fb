//! Loose box octree used for fuse lookups and intersection broad-phase.
//!
//! Items are `(Aabb, T)` pairs stored in the deepest cell that fully contains
//! their box. Items that straddle a split plane stay in the parent; items
//! outside the root volume stay in the root.

use glam::DVec3;

use crate::aabb::Aabb;

/// Items a leaf holds before it is split.
const LEAF_CAPACITY: usize = 16;
/// Cells never split below this depth.
const MAX_DEPTH: u32 = 21;

#[derive(Debug, Clone)]
struct Cell<T> {
    bounds: Aabb,
    items: Vec<(Aabb, T)>,
    /// Index of the first of eight contiguous children, or 0 for a leaf.
    first_child: u32,
    depth: u32,
}

impl<T> Cell<T> {
    fn new(bounds: Aabb, depth: u32) -> Self {
        Self {
            bounds,
            items: Vec::new(),
            first_child: 0,
            depth,
        }
    }

    #[inline]
    fn is_leaf(&self) -> bool {
        self.first_child == 0
    }
}

#[derive(Debug, Clone)]
pub struct Octree<T> {
    cells: Vec<Cell<T>>,
    len: usize,
}

impl<T: Copy> Octree<T> {
    pub fn new(bounds: Aabb) -> Self {
        Self {
            cells: vec![Cell::new(bounds, 0)],
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert_point(&mut self, p: DVec3, value: T) {
        self.insert(Aabb::new(p, p), value);
    }

    pub fn insert(&mut self, bounds: Aabb, value: T) {
        self.len += 1;
        let mut cell = 0usize;
        loop {
            if self.cells[cell].is_leaf() {
                self.cells[cell].items.push((bounds, value));
                let c = &self.cells[cell];
                if c.items.len() > LEAF_CAPACITY && c.depth < MAX_DEPTH {
                    self.split(cell);
                }
                return;
            }
            match self.child_containing(cell, &bounds) {
                Some(child) => cell = child,
                None => {
                    self.cells[cell].items.push((bounds, value));
                    return;
                }
            }
        }
    }

    /// Child of `cell` that fully contains `item`, if any.
    fn child_containing(&self, cell: usize, item: &Aabb) -> Option<usize> {
        let c = &self.cells[cell];
        let center = c.bounds.center();
        let lo = item.min.cmpge(center).bitmask();
        let hi = item.max.cmpge(center).bitmask();
        if lo != hi {
            return None;
        }
        let child = c.first_child as usize + lo as usize;
        self.cells[child]
            .bounds
            .contains(item)
            .then_some(child)
    }

    fn split(&mut self, cell: usize) {
        let bounds = self.cells[cell].bounds;
        let depth = self.cells[cell].depth + 1;
        let center = bounds.center();
        let first = self.cells.len() as u32;

        for octant in 0..8u32 {
            let pick = |bit: u32, lo: f64, mid: f64, hi: f64| {
                if octant & bit != 0 {
                    (mid, hi)
                } else {
                    (lo, mid)
                }
            };
            let (x0, x1) = pick(1, bounds.min.x, center.x, bounds.max.x);
            let (y0, y1) = pick(2, bounds.min.y, center.y, bounds.max.y);
            let (z0, z1) = pick(4, bounds.min.z, center.z, bounds.max.z);
            self.cells.push(Cell::new(
                Aabb::new(DVec3::new(x0, y0, z0), DVec3::new(x1, y1, z1)),
                depth,
            ));
        }
        self.cells[cell].first_child = first;

        let items = std::mem::take(&mut self.cells[cell].items);
        for (b, v) in items {
            match self.child_containing(cell, &b) {
                Some(child) => self.cells[child].items.push((b, v)),
                None => self.cells[cell].items.push((b, v)),
            }
        }
    }

    /// Visit every item whose box intersects `query`.
    pub fn for_each_in<F: FnMut(&Aabb, T)>(&self, query: &Aabb, mut f: F) {
        let mut stack: Vec<usize> = vec![0];
        while let Some(cell) = stack.pop() {
            let c = &self.cells[cell];
            for (b, v) in &c.items {
                if b.intersects(query) {
                    f(b, *v);
                }
            }
            if !c.is_leaf() {
                let first = c.first_child as usize;
                for child in first..first + 8 {
                    if self.cells[child].bounds.intersects(query) {
                        stack.push(child);
                    }
                }
            }
        }
    }

    /// Collect every item whose box intersects `query` into `out`.
    pub fn query(&self, query: &Aabb, out: &mut Vec<T>) {
        self.for_each_in(query, |_, v| out.push(v));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_query_matches_brute_force() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let bounds = Aabb::new(DVec3::ZERO, DVec3::ONE);
        let mut tree = Octree::new(bounds);
        let mut boxes = Vec::new();
        for i in 0..500u32 {
            let p = DVec3::new(rng.gen(), rng.gen(), rng.gen());
            let b = Aabb::new(p, p).expand(DVec3::splat(rng.gen_range(0.0..0.05)));
            tree.insert(b, i);
            boxes.push(b);
        }
        assert_eq!(tree.len(), 500);

        for _ in 0..50 {
            let p = DVec3::new(rng.gen(), rng.gen(), rng.gen());
            let q = Aabb::new(p, p).expand(DVec3::splat(0.1));
            let mut got = Vec::new();
            tree.query(&q, &mut got);
            got.sort_unstable();
            let expected: Vec<u32> = (0..500u32)
                .filter(|&i| boxes[i as usize].intersects(&q))
                .collect();
            assert_eq!(got, expected);
        }
    }

    #[test]
    fn test_items_outside_root_are_found() {
        let mut tree = Octree::new(Aabb::new(DVec3::ZERO, DVec3::ONE));
        for i in 0..40u32 {
            tree.insert_point(DVec3::splat(0.01 * i as f64), i);
        }
        tree.insert_point(DVec3::splat(5.0), 99);

        let mut got = Vec::new();
        tree.query(&Aabb::new(DVec3::splat(4.9), DVec3::splat(5.1)), &mut got);
        assert_eq!(got, vec![99]);
    }
}
