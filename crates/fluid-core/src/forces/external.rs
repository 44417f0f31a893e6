use glam::Vec3;

use crate::config::{FluidConfig, InteractionInput, PREDICTION_FACTOR};
use crate::parallel::for_each_indexed;
use crate::particle::ParticleSet;

/// Radial pull/push around the interaction point for this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveInteraction {
    pub point: Vec3,
    pub radius: f32,
    /// Positive pulls toward `point`, negative pushes away.
    pub strength: f32,
}

/// Body forces applied before prediction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExternalForces {
    pub gravity: Vec3,
    pub interaction: Option<ActiveInteraction>,
}

impl ExternalForces {
    pub fn new(config: &FluidConfig, input: &InteractionInput) -> Self {
        let strength = input.signed_strength(config.interaction_strength);
        let interaction = (strength != 0.0 && config.interaction_radius > 0.0).then_some(ActiveInteraction {
            point: input.point,
            radius: config.interaction_radius,
            strength,
        });
        Self {
            gravity: Vec3::new(0.0, config.gravity, 0.0),
            interaction,
        }
    }

    /// Acceleration on a particle at `pos` moving with `vel`.
    ///
    /// Inside the interaction radius the pull fades linearly to the edge
    /// (`centre_t = 1 - dist / radius`), gravity is weakened near the
    /// centre while pulling, and velocity is damped by `centre_t` so
    /// particles settle instead of orbiting the point.
    #[inline]
    pub fn acceleration(&self, pos: Vec3, vel: Vec3) -> Vec3 {
        let Some(it) = self.interaction else {
            return self.gravity;
        };

        let offset = it.point - pos;
        let sqr_dst = offset.length_squared();
        if sqr_dst >= it.radius * it.radius {
            return self.gravity;
        }

        let dst = sqr_dst.sqrt();
        let centre_t = 1.0 - dst / it.radius;
        let dir_to_centre = if dst > 0.0 { offset / dst } else { Vec3::ZERO };
        let gravity_weight = 1.0 - centre_t * (it.strength / 10.0).clamp(0.0, 1.0);

        self.gravity * gravity_weight + dir_to_centre * centre_t * it.strength - vel * centre_t
    }
}

/// Integrate body forces into velocities, then rebuild predicted positions.
///
/// The prediction always looks `PREDICTION_FACTOR` seconds ahead,
/// whatever `dt` is.
pub fn apply_external_forces(particles: &mut ParticleSet, forces: &ExternalForces, dt: f32) {
    let position = &particles.position;
    for_each_indexed(&mut particles.velocity, |i, vel| {
        *vel += forces.acceleration(position[i], *vel) * dt;
    });

    let velocity = &particles.velocity;
    for_each_indexed(&mut particles.predicted, |i, predicted| {
        *predicted = position[i] + velocity[i] * PREDICTION_FACTOR;
    });
}
