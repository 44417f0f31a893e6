use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Density and near-density accumulated for one particle.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct DensityPair {
    pub density: f32,
    pub near: f32,
}

/// SoA particle storage
///
/// Index order is not stable across steps: every step reorders the
/// particles by grid cell, so index `i` only identifies a particle until
/// the next spatial rebuild.
pub struct ParticleSet {
    pub count: usize,
    pub position: Vec<Vec3>,
    /// Look-ahead position used for every neighbour query in a step
    pub predicted: Vec<Vec3>,
    pub velocity: Vec<Vec3>,
    pub density: Vec<DensityPair>,
}

impl ParticleSet {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            position: vec![Vec3::ZERO; count],
            predicted: vec![Vec3::ZERO; count],
            velocity: vec![Vec3::ZERO; count],
            density: vec![DensityPair::default(); count],
        }
    }

    /// Build a set from explicit positions and velocities.
    ///
    /// Predicted positions start equal to the positions.
    pub fn from_state(position: Vec<Vec3>, velocity: Vec<Vec3>) -> Self {
        let count = position.len();
        debug_assert_eq!(count, velocity.len());
        Self {
            count,
            predicted: position.clone(),
            position,
            velocity,
            density: vec![DensityPair::default(); count],
        }
    }
}
