#![allow(dead_code)]

use glam::DVec3;
use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use union_graph::{Aabb, EdgeSource, Graph, InputPoint, SourceRef};

pub type EdgeInput = (InputPoint, InputPoint, EdgeSource);

pub fn unit_bounds() -> Aabb {
    Aabb::new(DVec3::ZERO, DVec3::ONE)
}

/// Uniform random points in `bounds`, tagged with `dataset`.
pub fn random_points(n: usize, bounds: &Aabb, dataset: u32, seed: u64) -> Vec<InputPoint> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let t = DVec3::new(rng.gen(), rng.gen(), rng.gen());
            let p = bounds.min + (bounds.max - bounds.min) * t;
            InputPoint::new(p, SourceRef::new(dataset, i as u32))
        })
        .collect()
}

/// Clusters of `per_cluster` points each, jittered by less than `jitter`
/// around lattice sites spaced `spacing` apart.
///
/// With `jitter` well under the fuse tolerance and `spacing` well over it,
/// every cluster fuses into exactly one node whatever the insert order.
pub fn clustered_points(
    sites_per_axis: usize,
    per_cluster: usize,
    spacing: f64,
    jitter: f64,
    seed: u64,
) -> Vec<InputPoint> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut out = Vec::new();
    let mut index = 0u32;
    for x in 0..sites_per_axis {
        for y in 0..sites_per_axis {
            for z in 0..sites_per_axis {
                // Site at the middle of a lattice cell.
                let site = (DVec3::new(x as f64, y as f64, z as f64) + 0.5) * spacing;
                for _ in 0..per_cluster {
                    let d = DVec3::new(
                        rng.gen_range(-jitter..jitter),
                        rng.gen_range(-jitter..jitter),
                        rng.gen_range(-jitter..jitter),
                    );
                    out.push(InputPoint::new(site + d, SourceRef::new(0, index)));
                    index += 1;
                }
            }
        }
    }
    out
}

/// Random edges between points drawn from `pool`, some repeated reversed.
pub fn random_edges(pool: &[InputPoint], n: usize, dataset: u32, seed: u64) -> Vec<EdgeInput> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let a = pool[rng.gen_range(0..pool.len())];
        let b = pool[rng.gen_range(0..pool.len())];
        let source = if rng.gen_bool(0.2) {
            EdgeSource::Abstract { dataset }
        } else {
            EdgeSource::Element(SourceRef::new(dataset, i as u32))
        };
        if rng.gen_bool(0.5) {
            out.push((a, b, source));
        } else {
            out.push((b, a, source));
        }
    }
    out
}

pub fn shuffled<T: Clone>(items: &[T], seed: u64) -> Vec<T> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut v = items.to_vec();
    v.shuffle(&mut rng);
    v
}

/// Every bit of the node and edge arrays, for exact comparisons.
pub fn fingerprint(graph: &Graph) -> Vec<u64> {
    let mut out = Vec::new();
    for n in graph.nodes() {
        out.push(n.index as u64);
        out.extend(n.center.to_array().map(f64::to_bits));
        out.push(n.source.map_or(u64::MAX, |s| ((s.dataset as u64) << 32) | s.index as u64));
    }
    for e in graph.edges() {
        out.extend([e.index as u64, e.start as u64, e.end as u64, e.dataset as u64]);
        out.push(e.valid as u64);
    }
    for u in graph.nodes_union().iter().chain(graph.edges_union()) {
        out.push(u.size() as u64);
        out.extend(u.elements().iter().map(|s| ((s.dataset as u64) << 32) | s.index as u64));
    }
    out
}
