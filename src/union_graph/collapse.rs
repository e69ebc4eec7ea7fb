//! Deterministic finalization of a [`UnionGraph`].

use std::cmp::Ordering;

use glam::DVec3;
use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::{UnionEdge, UnionGraph, UnionNode};
use crate::graph::Graph;
use crate::sort::{morton_key, radix_sort_pairs};
use crate::spatial_key::h64u;
use crate::timing::Timer;
use crate::types::{Edge, Node, UnionEntry};

#[inline]
fn bits(p: DVec3) -> [u64; 3] {
    [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]
}

impl UnionNode {
    /// Put samples in a schedule-independent order and recompute the mean
    /// in that order, so the center is bit-identical across runs.
    fn canonicalize(&mut self) {
        self.samples
            .sort_unstable_by(|a, b| a.0.cmp(&b.0).then_with(|| bits(a.1).cmp(&bits(b.1))));
        let mut center = DVec3::ZERO;
        for (i, (_, p)) in self.samples.iter().enumerate() {
            center += (*p - center) / (i + 1) as f64;
        }
        self.center = center;
    }
}

/// Total order on canonicalized nodes, used to break Morton key ties.
fn compare_nodes(a: &UnionNode, b: &UnionNode) -> Ordering {
    bits(a.center).cmp(&bits(b.center)).then_with(|| {
        a.samples
            .iter()
            .map(|(s, p)| (*s, bits(*p)))
            .cmp(b.samples.iter().map(|(s, p)| (*s, bits(*p))))
    })
}

impl UnionGraph {
    /// Finish insertion and produce the canonical graph.
    ///
    /// Nodes are ordered by the Morton key of their center, edges by their
    /// node pair. For a fixed set of inserts, the result is bit-identical
    /// no matter how many threads inserted or in which order. In octree
    /// mode this holds as long as fusion itself was order independent
    /// (no point within tolerance of two different nodes).
    pub fn collapse(self) -> Graph {
        let timer = Timer::start();
        let UnionGraph {
            config,
            nodes,
            edges,
            ..
        } = self;

        let mut nodes = nodes.into_vec();
        maybe_par_iter_mut!(nodes).for_each(UnionNode::canonicalize);

        let mut order: Vec<(u64, u32)> = maybe_par_iter!(nodes)
            .enumerate()
            .map(|(i, n)| (morton_key(n.center, &config.bounds), i as u32))
            .collect();
        radix_sort_pairs(&mut order);

        let mut run = 0;
        while run < order.len() {
            let key = order[run].0;
            let end = run + order[run..].iter().take_while(|(k, _)| *k == key).count();
            if end - run > 1 {
                order[run..end].sort_by(|a, b| {
                    compare_nodes(&nodes[a.1 as usize], &nodes[b.1 as usize])
                });
            }
            run = end;
        }

        let mut remap = vec![0u32; nodes.len()];
        let mut out_nodes = Vec::with_capacity(nodes.len());
        let mut nodes_union = Vec::with_capacity(nodes.len());
        for (new_index, &(_, old)) in order.iter().enumerate() {
            remap[old as usize] = new_index as u32;
            let node = &mut nodes[old as usize];
            let samples = std::mem::take(&mut node.samples);
            out_nodes.push(Node {
                index: new_index as u32,
                center: node.center,
                source: samples.first().map(|s| s.0),
            });
            nodes_union.push(samples.into_iter().map(|s| s.0).collect::<UnionEntry>());
        }

        let mut edges: Vec<UnionEdge> = edges
            .into_vec()
            .into_iter()
            .map(|mut e| {
                let (a, b) = (remap[e.start as usize], remap[e.end as usize]);
                e.start = a.min(b);
                e.end = a.max(b);
                e.union.sort();
                e
            })
            .collect();

        let mut edge_order: Vec<(u64, u32)> = edges
            .iter()
            .enumerate()
            .map(|(i, e)| (h64u(e.start, e.end), i as u32))
            .collect();
        radix_sort_pairs(&mut edge_order);

        let mut out_edges = Vec::with_capacity(edges.len());
        let mut edges_union = Vec::with_capacity(edges.len());
        for (new_index, &(_, old)) in edge_order.iter().enumerate() {
            let e = &mut edges[old as usize];
            let union = std::mem::take(&mut e.union);
            let dataset = union.elements().first().map_or(0, |s| s.dataset);
            out_edges.push(Edge::new(new_index as u32, e.start, e.end, dataset));
            edges_union.push(union);
        }

        debug!(
            "collapsed union graph: {} nodes, {} edges",
            out_nodes.len(),
            out_edges.len()
        );
        timer.report("collapse");

        Graph::from_parts(config.bounds, out_nodes, out_edges, nodes_union, edges_union)
    }
}
