use glam::Vec3;

use crate::fluids::SmoothingKernels;
use crate::parallel::for_each_indexed;
use crate::particle::ParticleSet;
use crate::sort::SpatialIndex;

/// Blend each velocity toward its neighbours' velocities.
///
/// `v_i += strength * dt * sum_j { (v_j - v_i) * poly6(|x_i - x_j|) }`
///
/// All deltas are computed from the pre-pass velocities, then applied.
/// Does nothing when `strength` is zero.
pub fn apply_viscosity(
    particles: &mut ParticleSet,
    index: &SpatialIndex,
    kernels: &SmoothingKernels,
    strength: f32,
    dt: f32,
) {
    if strength == 0.0 {
        return;
    }

    let sqr_radius = kernels.radius * kernels.radius;
    let predicted = &particles.predicted;
    let velocity = &particles.velocity;
    let mut delta = vec![Vec3::ZERO; particles.count];

    for_each_indexed(&mut delta, |i, out| {
        let pos = predicted[i];
        let vel = velocity[i];
        let mut force = Vec3::ZERO;

        index.for_each_candidate(pos, |j| {
            if j == i {
                return;
            }
            let sqr_dst = (predicted[j] - pos).length_squared();
            if sqr_dst > sqr_radius {
                return;
            }
            force += (velocity[j] - vel) * kernels.poly6(sqr_dst.sqrt());
        });

        *out = force;
    });

    let scale = strength * dt;
    for_each_indexed(&mut particles.velocity, |i, vel| *vel += delta[i] * scale);
}
