use glam::{UVec3, Vec3};

use crate::config::FluidConfig;
use crate::error::SimError;
use crate::sort::scan::SCAN_CAPACITY;

/// Fixed-bounds uniform grid mapping positions to linear cell indices.
///
/// Cells are linearised X-major (`x + res.x * (y + res.y * z)`), so the
/// three X-neighbours of a cell have consecutive indices. After particles
/// are sorted by cell this turns each row of a 3x3x3 neighbourhood into a
/// single contiguous range of particles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
    min_bounds: Vec3,
    cell_size: f32,
    inv_cell_size: f32,
    resolution: UVec3,
}

impl GridLayout {
    /// Grid covering `[min_bounds, max_bounds]` with cubic cells of side `cell_size`.
    pub fn new(min_bounds: Vec3, max_bounds: Vec3, cell_size: f32) -> Result<Self, SimError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(SimError::InvalidSmoothingRadius(cell_size));
        }
        let size = max_bounds - min_bounds;
        if !(size.is_finite() && size.min_element() > 0.0) {
            return Err(SimError::InvalidBounds(size));
        }

        let res = (size / cell_size).ceil().max(Vec3::ONE);
        // Checked in f64 so absurd resolutions cannot wrap before the limit test.
        let cells = res.x as f64 * res.y as f64 * res.z as f64;
        if cells + 1.0 > SCAN_CAPACITY as f64 {
            return Err(SimError::GridTooLarge {
                cells: cells.min(u64::MAX as f64) as u64 + 1,
                max: SCAN_CAPACITY as u64,
            });
        }

        Ok(Self {
            min_bounds,
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            resolution: UVec3::new(res.x as u32, res.y as u32, res.z as u32),
        })
    }

    /// Grid over the configured domain with cell side equal to the smoothing radius.
    pub fn from_config(config: &FluidConfig) -> Result<Self, SimError> {
        config.validate()?;
        Self::new(config.min_bounds(), config.max_bounds(), config.smoothing_radius)
    }

    pub fn min_bounds(&self) -> Vec3 {
        self.min_bounds
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn resolution(&self) -> UVec3 {
        self.resolution
    }

    pub fn total_cells(&self) -> usize {
        self.resolution.x as usize * self.resolution.y as usize * self.resolution.z as usize
    }

    /// Cell coordinates of `pos`, clamped into the grid.
    ///
    /// Positions outside the bounds (drift, NaN) land in the nearest
    /// boundary cell instead of producing an out-of-range index.
    #[inline]
    pub fn cell_coord(&self, pos: Vec3) -> UVec3 {
        let local = (pos - self.min_bounds) * self.inv_cell_size;
        let max = self.resolution - UVec3::ONE;
        UVec3::new(
            clamp_axis(local.x, max.x),
            clamp_axis(local.y, max.y),
            clamp_axis(local.z, max.z),
        )
    }

    #[inline]
    pub fn linear_index(&self, cell: UVec3) -> u32 {
        cell.x + self.resolution.x * (cell.y + self.resolution.y * cell.z)
    }

    /// Linear cell index of `pos`.
    #[inline]
    pub fn cell_index(&self, pos: Vec3) -> u32 {
        self.linear_index(self.cell_coord(pos))
    }

    /// The rows of the 3x3x3 neighbourhood around `cell`, clamped to the grid.
    ///
    /// Each item is `(first, last)`: the linear indices of the lowest and
    /// highest X cell in that row. Because of the X-major layout the row is
    /// every index in `first..=last`.
    pub fn neighbour_strips(&self, cell: UVec3) -> impl Iterator<Item = (u32, u32)> {
        let layout = *self;
        let max = self.resolution - UVec3::ONE;
        let min_x = cell.x.saturating_sub(1);
        let max_x = (cell.x + 1).min(max.x);
        let ys = cell.y.saturating_sub(1)..=(cell.y + 1).min(max.y);
        let zs = cell.z.saturating_sub(1)..=(cell.z + 1).min(max.z);

        zs.flat_map(move |z| {
            ys.clone().map(move |y| {
                (
                    layout.linear_index(UVec3::new(min_x, y, z)),
                    layout.linear_index(UVec3::new(max_x, y, z)),
                )
            })
        })
    }
}

/// Floor and clamp one axis to `[0, max]`. NaN maps to 0.
#[inline]
fn clamp_axis(v: f32, max: u32) -> u32 {
    let c = v.floor();
    if c >= max as f32 {
        max
    } else if c > 0.0 {
        c as u32
    } else {
        0
    }
}
