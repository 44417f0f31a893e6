use std::sync::atomic::{AtomicU32, Ordering};

use crate::parallel::for_each_indexed;

/// Write each particle's sorted slot and the inverse permutation.
///
/// `dest[i] = cell_start[keys[i]] + ranks[i]` is a pure function of values
/// the counting pass already produced, and ranks are unique inside a cell,
/// so every slot of `sorted_index` is written exactly once.
pub fn scatter(
    keys: &[u32],
    ranks: &[u32],
    cell_start: &[u32],
    dest: &mut [u32],
    sorted_index: &[AtomicU32],
) {
    debug_assert_eq!(keys.len(), dest.len());
    debug_assert_eq!(ranks.len(), dest.len());
    debug_assert_eq!(sorted_index.len(), dest.len());

    for_each_indexed(dest, |i, slot| {
        *slot = cell_start[keys[i] as usize] + ranks[i];
        sorted_index[*slot as usize].store(i as u32, Ordering::Relaxed);
    });
}
