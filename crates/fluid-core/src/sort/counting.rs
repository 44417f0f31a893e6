//! Hash and counting passes of the cell sort.

use std::sync::atomic::{AtomicU32, Ordering};

use glam::Vec3;

use crate::grid::GridLayout;
use crate::parallel::for_each_indexed;

/// `keys[i]` = linear cell index of `positions[i]`.
pub fn compute_keys(layout: &GridLayout, positions: &[Vec3], keys: &mut [u32]) {
    debug_assert_eq!(positions.len(), keys.len());
    for_each_indexed(keys, |i, key| *key = layout.cell_index(positions[i]));
}

/// Zero every histogram counter, the sentinel included.
pub fn clear_histogram(histogram: &mut [AtomicU32]) {
    for_each_indexed(histogram, |_, counter| *counter.get_mut() = 0);
}

/// Count particles per cell and record each particle's rank within its cell.
///
/// The rank is the counter value *before* the increment, so ranks within a
/// cell are `0..count` with no gaps. Which particle gets which rank depends
/// on arrival order and is not reproducible under parallel execution.
pub fn count_and_rank(keys: &[u32], histogram: &[AtomicU32], ranks: &mut [u32]) {
    debug_assert_eq!(keys.len(), ranks.len());
    for_each_indexed(ranks, |i, rank| {
        *rank = histogram[keys[i] as usize].fetch_add(1, Ordering::Relaxed);
    });
}

/// Copy the finished histogram into the plain buffer the scan works on.
pub fn load_counts(histogram: &[AtomicU32], counts: &mut [u32]) {
    debug_assert_eq!(histogram.len(), counts.len());
    for_each_indexed(counts, |c, out| *out = histogram[c].load(Ordering::Relaxed));
}
