//! Spatial reindexing: counting sort of particles by grid cell.
//!
//! One rebuild runs these passes, each finishing before the next starts:
//! hash -> clear + count (atomic ranks) -> hierarchical scan -> scatter -> reorder.
//! Afterwards the particles of cell `c` occupy
//! `cell_start[c]..cell_start[c + 1]` of every particle buffer.

pub mod counting;
pub mod reorder;
pub mod scan;
pub mod scatter;

use std::sync::atomic::{AtomicU32, Ordering};

use glam::Vec3;

use crate::config::SimLimits;
use crate::error::SimError;
use crate::grid::GridLayout;
use crate::particle::ParticleSet;

use self::reorder::SortedBuffers;
use self::scan::PrefixScan;

/// Grid, sort intermediates and neighbour lookup for one configuration.
pub struct SpatialIndex {
    layout: GridLayout,
    count: usize,
    keys: Vec<u32>,
    ranks: Vec<u32>,
    /// Per-cell counters plus a sentinel, the only buffer with concurrent increments
    histogram: Vec<AtomicU32>,
    /// Exclusive prefix sum of the histogram; `cell_start[total_cells] == count`
    cell_start: Vec<u32>,
    scan: PrefixScan,
    dest: Vec<u32>,
    sorted_index: Vec<AtomicU32>,
    sorted: SortedBuffers,
}

impl SpatialIndex {
    /// Allocate every buffer for `particle_count` particles on `layout`.
    pub fn new(layout: GridLayout, particle_count: usize, limits: &SimLimits) -> Result<Self, SimError> {
        let slots = layout.total_cells() + 1;

        if particle_count > u32::MAX as usize {
            return Err(SimError::BufferTooLarge {
                buffer: "keys",
                bytes: particle_count as u64 * 4,
                max: u32::MAX as u64 * 4,
            });
        }
        limits.check("cell_start", slots, std::mem::size_of::<u32>())?;
        limits.check("keys", particle_count, std::mem::size_of::<u32>())?;
        limits.check("sorted_position", particle_count, std::mem::size_of::<Vec3>())?;

        let scan = PrefixScan::new(slots)?;

        let res = layout.resolution();
        log::debug!(
            "spatial index: {} particles, grid {}x{}x{} ({} cells, {} scan levels)",
            particle_count,
            res.x,
            res.y,
            res.z,
            slots - 1,
            scan.depth()
        );

        Ok(Self {
            layout,
            count: particle_count,
            keys: vec![0; particle_count],
            ranks: vec![0; particle_count],
            histogram: (0..slots).map(|_| AtomicU32::new(0)).collect(),
            cell_start: vec![0; slots],
            scan,
            dest: vec![0; particle_count],
            sorted_index: (0..particle_count).map(|i| AtomicU32::new(i as u32)).collect(),
            sorted: SortedBuffers::new(particle_count),
        })
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn particle_count(&self) -> usize {
        self.count
    }

    /// Run every pass on `particles.predicted` and leave the particles in cell order.
    pub fn rebuild(&mut self, particles: &mut ParticleSet) {
        debug_assert_eq!(particles.count, self.count);
        self.hash(&particles.predicted);
        self.count_cells();
        self.scan_cells();
        self.scatter();
        self.reorder(particles);
    }

    /// Compute the cell key of every position.
    pub fn hash(&mut self, positions: &[Vec3]) {
        counting::compute_keys(&self.layout, positions, &mut self.keys);
    }

    /// Clear the histogram, then count keys and assign ranks.
    pub fn count_cells(&mut self) {
        counting::clear_histogram(&mut self.histogram);
        counting::count_and_rank(&self.keys, &self.histogram, &mut self.ranks);
    }

    /// Turn the per-cell counts into cell start offsets.
    pub fn scan_cells(&mut self) {
        counting::load_counts(&self.histogram, &mut self.cell_start);
        self.scan.exclusive_scan(&mut self.cell_start);
    }

    pub fn scatter(&mut self) {
        scatter::scatter(
            &self.keys,
            &self.ranks,
            &self.cell_start,
            &mut self.dest,
            &self.sorted_index,
        );
    }

    pub fn reorder(&mut self, particles: &mut ParticleSet) {
        self.sorted.apply(&self.sorted_index, particles);
    }

    pub fn keys(&self) -> &[u32] {
        &self.keys
    }

    pub fn ranks(&self) -> &[u32] {
        &self.ranks
    }

    pub fn cell_start(&self) -> &[u32] {
        &self.cell_start
    }

    /// Sorted slot of each particle, by pre-sort index.
    pub fn destinations(&self) -> &[u32] {
        &self.dest
    }

    /// Pre-sort index of the particle now in each sorted slot.
    pub fn permutation(&self) -> Vec<u32> {
        self.sorted_index
            .iter()
            .map(|i| i.load(Ordering::Relaxed))
            .collect()
    }

    /// Particles in cell `cell`, as a range of sorted indices.
    pub fn cell_range(&self, cell: u32) -> std::ops::Range<usize> {
        let c = cell as usize;
        self.cell_start[c] as usize..self.cell_start[c + 1] as usize
    }

    /// Largest number of particles sharing one cell after the last rebuild.
    pub fn max_cell_occupancy(&self) -> u32 {
        self.cell_start
            .windows(2)
            .map(|w| w[1] - w[0])
            .max()
            .unwrap_or(0)
    }

    /// Call `f(j)` for every particle in the 3x3x3 cells around `pos`.
    ///
    /// Walks at most nine contiguous strips (one per Y-Z row, each spanning
    /// three X cells). The caller still does the distance check against the
    /// smoothing radius; the strips only change the access pattern.
    #[inline]
    pub fn for_each_candidate<F: FnMut(usize)>(&self, pos: Vec3, mut f: F) {
        let cell = self.layout.cell_coord(pos);
        for (first, last) in self.layout.neighbour_strips(cell) {
            let start = self.cell_start[first as usize] as usize;
            let end = self.cell_start[last as usize + 1] as usize;
            for j in start..end {
                f(j);
            }
        }
    }
}
