use glam::Vec3;

use crate::config::FluidConfig;
use crate::fluids::SmoothingKernels;
use crate::parallel::for_each_indexed;
use crate::particle::{DensityPair, ParticleSet};
use crate::sort::SpatialIndex;

/// Equation-of-state parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PressureParams {
    pub target_density: f32,
    pub pressure_multiplier: f32,
    pub near_pressure_multiplier: f32,
}

impl PressureParams {
    pub fn from_config(config: &FluidConfig) -> Self {
        Self {
            target_density: config.target_density,
            pressure_multiplier: config.pressure_multiplier,
            near_pressure_multiplier: config.near_pressure_multiplier,
        }
    }
}

/// Density and pressures of one particle, as seen by the pair term.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PressureSample {
    pub density: DensityPair,
    pub pressure: f32,
    pub near_pressure: f32,
}

impl PressureSample {
    pub fn new(density: DensityPair, params: &PressureParams) -> Self {
        Self {
            density,
            pressure: (density.density - params.target_density) * params.pressure_multiplier,
            near_pressure: params.near_pressure_multiplier * density.near,
        }
    }
}

/// Direction from particle `own` toward particle `neighbour` when the two
/// share a position.
///
/// The lower index looks along +Y and the higher along -Y, so the pair is
/// pushed apart along the Y axis.
#[inline]
pub fn coincident_direction(own: usize, neighbour: usize) -> Vec3 {
    if own < neighbour {
        Vec3::Y
    } else {
        Vec3::NEG_Y
    }
}

/// Acceleration on `own` caused by `neighbour`.
///
/// `offset` points from `own` to `neighbour` and `dst` is its length.
/// `coincident_dir` replaces the direction when `dst` is zero; see
/// [`coincident_direction`].
/// Both pressures are averaged and the kernel derivative is divided by the
/// product of both densities, so swapping the two particles negates the
/// result exactly. Pairs with a non-positive density contribute nothing.
#[inline]
pub fn pair_acceleration(
    offset: Vec3,
    dst: f32,
    coincident_dir: Vec3,
    own: &PressureSample,
    neighbour: &PressureSample,
    kernels: &SmoothingKernels,
) -> Vec3 {
    if !(own.density.density > 0.0 && neighbour.density.density > 0.0) {
        return Vec3::ZERO;
    }
    let rho = own.density.density * neighbour.density.density;

    let dir = if dst > 0.0 { offset / dst } else { coincident_dir };

    let shared_pressure = (own.pressure + neighbour.pressure) * 0.5;
    let mut scale = kernels.density_derivative(dst) * shared_pressure / rho;

    let near_rho = own.density.near * neighbour.density.near;
    if near_rho > 0.0 {
        let shared_near = (own.near_pressure + neighbour.near_pressure) * 0.5;
        scale += kernels.near_density_derivative(dst) * shared_near / near_rho;
    }

    dir * scale
}

/// Add the pressure acceleration of every particle to its velocity.
pub fn apply_pressure(
    particles: &mut ParticleSet,
    index: &SpatialIndex,
    kernels: &SmoothingKernels,
    params: &PressureParams,
    dt: f32,
) {
    let predicted = &particles.predicted;
    let density = &particles.density;
    for_each_indexed(&mut particles.velocity, |i, vel| {
        *vel += pressure_acceleration(i, predicted, density, index, kernels, params) * dt;
    });
}

fn pressure_acceleration(
    i: usize,
    predicted: &[Vec3],
    density: &[DensityPair],
    index: &SpatialIndex,
    kernels: &SmoothingKernels,
    params: &PressureParams,
) -> Vec3 {
    let own = PressureSample::new(density[i], params);
    if own.density.density <= 0.0 {
        return Vec3::ZERO;
    }

    let pos = predicted[i];
    let sqr_radius = kernels.radius * kernels.radius;
    let mut accel = Vec3::ZERO;

    index.for_each_candidate(pos, |j| {
        if j == i {
            return;
        }
        let offset = predicted[j] - pos;
        let sqr_dst = offset.length_squared();
        if sqr_dst > sqr_radius {
            return;
        }
        let neighbour = PressureSample::new(density[j], params);
        accel += pair_acceleration(
            offset,
            sqr_dst.sqrt(),
            coincident_direction(i, j),
            &own,
            &neighbour,
            kernels,
        );
    });

    accel
}
