//! Hierarchical work-efficient (Blelloch) exclusive prefix scan.
//!
//! Level 0 scans the input in independent blocks of [`SCAN_BLOCK_SIZE`]
//! elements and writes one total per block. The block totals are scanned
//! the same way (Level 1, and Level 2 if Level 1 still spans several
//! blocks), then every block adds the scanned offset of its parent block.
//! Three levels bound the input length at `SCAN_BLOCK_SIZE^3`.

use crate::error::SimError;
use crate::parallel::{for_each_chunk, for_each_chunk_zip};

/// Elements scanned by one block.
pub const SCAN_BLOCK_SIZE: usize = 512;

/// Number of hierarchy levels, the input level included.
pub const SCAN_LEVELS: u32 = 3;

/// Longest input the hierarchy can scan.
pub const SCAN_CAPACITY: usize = SCAN_BLOCK_SIZE * SCAN_BLOCK_SIZE * SCAN_BLOCK_SIZE;

/// Exclusive scan over a fixed-length buffer, with block-total scratch
/// allocated up front.
pub struct PrefixScan {
    len: usize,
    /// Block totals per level above the input, lowest level first.
    levels: Vec<Vec<u32>>,
}

impl PrefixScan {
    pub fn new(len: usize) -> Result<Self, SimError> {
        if len > SCAN_CAPACITY {
            return Err(SimError::GridTooLarge {
                cells: len as u64,
                max: SCAN_CAPACITY as u64,
            });
        }

        let mut levels = Vec::new();
        let mut n = len;
        while n > SCAN_BLOCK_SIZE {
            n = n.div_ceil(SCAN_BLOCK_SIZE);
            levels.push(vec![0u32; n]);
        }

        Ok(Self { len, levels })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels this input needs (1 to 3).
    pub fn depth(&self) -> usize {
        self.levels.len() + 1
    }

    /// Replace `data[k]` by `sum(data[0..k))`.
    pub fn exclusive_scan(&mut self, data: &mut [u32]) {
        assert_eq!(data.len(), self.len, "scan input length changed since allocation");
        scan_level(data, &mut self.levels);
    }
}

fn scan_level(data: &mut [u32], levels: &mut [Vec<u32>]) {
    if data.len() <= SCAN_BLOCK_SIZE {
        scan_block(data);
        return;
    }

    let Some((sums, parents)) = levels.split_first_mut() else {
        unreachable!("scan scratch is sized for the input at construction");
    };

    scan_blocks(data, sums);
    scan_level(sums, parents);
    add_block_offsets(data, sums);
}

/// Local scan of every block; `sums[b]` receives the total of block `b`.
fn scan_blocks(data: &mut [u32], sums: &mut [u32]) {
    for_each_chunk_zip(data, SCAN_BLOCK_SIZE, sums, |block, total| {
        *total = scan_block(block);
    });
}

/// Add the scanned parent offset to every element of every block but the first.
fn add_block_offsets(data: &mut [u32], offsets: &[u32]) {
    for_each_chunk(data, SCAN_BLOCK_SIZE, |b, block| {
        if b == 0 {
            return;
        }
        let offset = offsets[b];
        for v in block.iter_mut() {
            *v += offset;
        }
    });
}

/// Blelloch scan of at most one block, in place. Returns the block total.
///
/// The block is padded with zeros to the full power-of-two width, built up
/// into a reduction tree (up-sweep), then the root is replaced by the
/// identity and pushed back down (down-sweep).
fn scan_block(block: &mut [u32]) -> u32 {
    debug_assert!(block.len() <= SCAN_BLOCK_SIZE);
    let mut temp = [0u32; SCAN_BLOCK_SIZE];
    temp[..block.len()].copy_from_slice(block);

    // Up-sweep
    let mut offset = 1;
    let mut d = SCAN_BLOCK_SIZE >> 1;
    while d > 0 {
        for k in 0..d {
            let ai = offset * (2 * k + 1) - 1;
            let bi = offset * (2 * k + 2) - 1;
            temp[bi] += temp[ai];
        }
        offset <<= 1;
        d >>= 1;
    }

    let total = temp[SCAN_BLOCK_SIZE - 1];
    temp[SCAN_BLOCK_SIZE - 1] = 0;

    // Down-sweep
    let mut d = 1;
    while d < SCAN_BLOCK_SIZE {
        offset >>= 1;
        for k in 0..d {
            let ai = offset * (2 * k + 1) - 1;
            let bi = offset * (2 * k + 2) - 1;
            let t = temp[ai];
            temp[ai] = temp[bi];
            temp[bi] += t;
        }
        d <<= 1;
    }

    let n = block.len();
    block.copy_from_slice(&temp[..n]);
    total
}
