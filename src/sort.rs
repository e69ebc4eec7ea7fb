//! Canonical ordering primitives: a stable byte-wise radix sort over 64-bit keys
//! and a Morton key for positions.

use glam::DVec3;

use crate::aabb::Aabb;

/// Bits per axis in a Morton key (3 * 21 = 63).
pub const MORTON_BITS: u32 = 21;
const MORTON_MAX: f64 = ((1u64 << MORTON_BITS) - 1) as f64;

/// Stable LSD radix sort of `(key, payload)` pairs, ascending by key.
///
/// Byte passes where every key shares the same byte are skipped.
pub fn radix_sort_pairs(pairs: &mut Vec<(u64, u32)>) {
    let n = pairs.len();
    if n < 2 {
        return;
    }

    // One histogram per byte, computed in a single scan.
    let mut counts = [[0usize; 256]; 8];
    for &(key, _) in pairs.iter() {
        for (byte, hist) in counts.iter_mut().enumerate() {
            hist[((key >> (byte * 8)) & 0xff) as usize] += 1;
        }
    }

    let mut scratch: Vec<(u64, u32)> = vec![(0, 0); n];

    for (byte, hist) in counts.iter().enumerate() {
        if hist.iter().any(|&c| c == n) {
            continue;
        }

        let mut offsets = [0usize; 256];
        let mut sum = 0usize;
        for (o, &c) in offsets.iter_mut().zip(hist.iter()) {
            *o = sum;
            sum += c;
        }

        let shift = byte * 8;
        for &item in pairs.iter() {
            let b = ((item.0 >> shift) & 0xff) as usize;
            scratch[offsets[b]] = item;
            offsets[b] += 1;
        }
        std::mem::swap(pairs, &mut scratch);
    }
}

/// Spread the low 21 bits of `v` so that bit `i` lands on bit `3 * i`.
#[inline(always)]
fn part1by2(v: u64) -> u64 {
    let mut x = v & 0x1f_ffff;
    x = (x | (x << 32)) & 0x001f_0000_0000_ffff;
    x = (x | (x << 16)) & 0x001f_0000_ff00_00ff;
    x = (x | (x << 8)) & 0x100f_00f0_0f00_f00f;
    x = (x | (x << 4)) & 0x10c3_0c30_c30c_30c3;
    x = (x | (x << 2)) & 0x1249_2492_4924_9249;
    x
}

#[inline(always)]
fn quantize(v: f64, min: f64, extent: f64) -> u64 {
    if !(extent > 0.0) {
        return 0;
    }
    let t = ((v - min) / extent).clamp(0.0, 1.0);
    (t * MORTON_MAX) as u64
}

/// Morton (Z-order) key of `p`, quantized to 21 bits per axis relative to `bounds`.
///
/// Positions outside `bounds` clamp to its faces. Flat axes quantize to zero.
/// Used only to order nodes; never for fusion decisions.
pub fn morton_key(p: DVec3, bounds: &Aabb) -> u64 {
    let size = bounds.max - bounds.min;
    let x = quantize(p.x, bounds.min.x, size.x);
    let y = quantize(p.y, bounds.min.y, size.y);
    let z = quantize(p.z, bounds.min.z, size.z);
    part1by2(x) | (part1by2(y) << 1) | (part1by2(z) << 2)
}
