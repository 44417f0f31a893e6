use glam::Vec3;

use crate::fluids::SmoothingKernels;
use crate::parallel::for_each_indexed;
use crate::particle::{DensityPair, ParticleSet};
use crate::sort::SpatialIndex;

/// Accumulate density and near-density for every particle.
///
/// Sums both spiky kernels over all neighbours within the smoothing
/// radius of the predicted position, the particle itself included. The
/// index must have been rebuilt on the current predicted positions.
pub fn compute_densities(particles: &mut ParticleSet, index: &SpatialIndex, kernels: &SmoothingKernels) {
    let predicted = &particles.predicted;
    for_each_indexed(&mut particles.density, |i, out| {
        *out = density_at(predicted[i], predicted, index, kernels);
    });
}

/// Density pair at `pos` from the particles at `positions`.
pub fn density_at(
    pos: Vec3,
    positions: &[Vec3],
    index: &SpatialIndex,
    kernels: &SmoothingKernels,
) -> DensityPair {
    let sqr_radius = kernels.radius * kernels.radius;
    let mut density = 0.0_f32;
    let mut near = 0.0_f32;

    index.for_each_candidate(pos, |j| {
        let sqr_dst = (positions[j] - pos).length_squared();
        if sqr_dst > sqr_radius {
            return;
        }
        let dst = sqr_dst.sqrt();
        density += kernels.density(dst);
        near += kernels.near_density(dst);
    });

    DensityPair { density, near }
}
