use std::sync::atomic::{AtomicU32, Ordering};

use glam::Vec3;

use crate::parallel::for_each_indexed;
use crate::particle::ParticleSet;

/// Shadow copies of the attributes that move with the sort.
///
/// After gathering, the shadow vectors are swapped with the primary ones,
/// so the sorted order becomes the working order without a copy-back and
/// the old primary storage becomes next step's shadow.
pub struct SortedBuffers {
    position: Vec<Vec3>,
    predicted: Vec<Vec3>,
    velocity: Vec<Vec3>,
}

impl SortedBuffers {
    pub fn new(count: usize) -> Self {
        Self {
            position: vec![Vec3::ZERO; count],
            predicted: vec![Vec3::ZERO; count],
            velocity: vec![Vec3::ZERO; count],
        }
    }

    /// Move every particle to slot `i` where `sorted_index[i]` names its old index.
    pub fn apply(&mut self, sorted_index: &[AtomicU32], particles: &mut ParticleSet) {
        gather(&particles.position, sorted_index, &mut self.position);
        gather(&particles.predicted, sorted_index, &mut self.predicted);
        gather(&particles.velocity, sorted_index, &mut self.velocity);

        std::mem::swap(&mut particles.position, &mut self.position);
        std::mem::swap(&mut particles.predicted, &mut self.predicted);
        std::mem::swap(&mut particles.velocity, &mut self.velocity);
    }
}

fn gather(src: &[Vec3], sorted_index: &[AtomicU32], dst: &mut [Vec3]) {
    debug_assert_eq!(src.len(), dst.len());
    for_each_indexed(dst, |i, out| {
        *out = src[sorted_index[i].load(Ordering::Relaxed) as usize];
    });
}
