use glam::{EulerRot, Quat, Vec3};

use crate::config::{FluidConfig, Obstacle};
use crate::parallel::for_each_zip;
use crate::particle::ParticleSet;

/// Obstacle with its transform precomputed.
#[derive(Clone, Copy, Debug, PartialEq)]
enum ObstacleShape {
    None,
    Box {
        centre: Vec3,
        half_size: Vec3,
        rotation: Quat,
        inv_rotation: Quat,
    },
    Sphere {
        centre: Vec3,
        radius: f32,
    },
}

/// Obstacle and domain-wall collision response.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collider {
    half_bounds: Vec3,
    damping: f32,
    obstacle: ObstacleShape,
}

impl Collider {
    pub fn new(config: &FluidConfig) -> Self {
        let obstacle = match config.obstacle {
            Obstacle::None => ObstacleShape::None,
            Obstacle::Box {
                centre,
                size,
                rotation,
            } => {
                let r = rotation * (std::f32::consts::PI / 180.0);
                let rotation = Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z);
                ObstacleShape::Box {
                    centre,
                    half_size: size.abs() * 0.5,
                    rotation,
                    inv_rotation: rotation.inverse(),
                }
            }
            Obstacle::Sphere { centre, radius } => ObstacleShape::Sphere {
                centre,
                radius: radius.abs(),
            },
        };

        Self {
            half_bounds: config.half_bounds(),
            damping: config.collision_damping.clamp(0.0, 1.0),
            obstacle,
        }
    }

    /// Push `pos` out of the obstacle, then back inside the domain.
    #[inline]
    pub fn resolve(&self, pos: &mut Vec3, vel: &mut Vec3) {
        self.resolve_obstacle(pos, vel);
        self.resolve_bounds(pos, vel);
    }

    fn resolve_obstacle(&self, pos: &mut Vec3, vel: &mut Vec3) {
        match self.obstacle {
            ObstacleShape::None => {}
            ObstacleShape::Box {
                centre,
                half_size,
                rotation,
                inv_rotation,
            } => {
                let mut local = inv_rotation * (*pos - centre);
                let depth = half_size - local.abs();
                if depth.min_element() <= 0.0 {
                    return;
                }

                // Leave through the nearest face
                let axis = if depth.x <= depth.y && depth.x <= depth.z {
                    0
                } else if depth.y <= depth.z {
                    1
                } else {
                    2
                };
                let sign = if local[axis] >= 0.0 { 1.0 } else { -1.0 };
                local[axis] = half_size[axis] * sign;
                let mut normal = Vec3::ZERO;
                normal[axis] = sign;

                *pos = centre + rotation * local;
                reflect(vel, rotation * normal, self.damping);
            }
            ObstacleShape::Sphere { centre, radius } => {
                let offset = *pos - centre;
                let sqr_dst = offset.length_squared();
                if sqr_dst >= radius * radius {
                    return;
                }
                let dst = sqr_dst.sqrt();
                let normal = if dst > 0.0 { offset / dst } else { Vec3::Y };
                *pos = centre + normal * radius;
                reflect(vel, normal, self.damping);
            }
        }
    }

    fn resolve_bounds(&self, pos: &mut Vec3, vel: &mut Vec3) {
        for axis in 0..3 {
            let half = self.half_bounds[axis];
            let p = pos[axis];
            if p.is_nan() {
                pos[axis] = 0.0;
                vel[axis] = 0.0;
            } else if p >= half {
                pos[axis] = half;
                if vel[axis] > 0.0 {
                    vel[axis] *= -self.damping;
                }
            } else if p <= -half {
                pos[axis] = -half;
                if vel[axis] < 0.0 {
                    vel[axis] *= -self.damping;
                }
            }
        }
    }
}

/// Flip the velocity component going into the surface and scale it by `damping`.
#[inline]
fn reflect(vel: &mut Vec3, normal: Vec3, damping: f32) {
    let vn = vel.dot(normal);
    if vn < 0.0 {
        *vel -= normal * vn * (1.0 + damping);
    }
}

/// Advance positions by `velocity * dt` and resolve collisions.
pub fn integrate(particles: &mut ParticleSet, collider: &Collider, dt: f32) {
    for_each_zip(&mut particles.position, &mut particles.velocity, |pos, vel| {
        *pos += *vel * dt;
        collider.resolve(pos, vel);
    });
}
