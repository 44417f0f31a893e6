use glam::Vec3;

use crate::parallel::min_by_key;

/// Nearest particle hit by a pick ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickHit {
    pub index: usize,
    pub position: Vec3,
    /// Distance along the ray to the particle's sphere.
    pub distance: f32,
}

/// Cast a ray against spheres of `radius` around every position.
///
/// Returns the hit closest to `origin`, or `None` if the ray misses every
/// sphere or `dir` has zero length. A ray starting inside a sphere hits it
/// at distance zero.
pub fn pick(positions: &[Vec3], origin: Vec3, dir: Vec3, radius: f32) -> Option<PickHit> {
    let dir = dir.try_normalize()?;
    let sqr_radius = radius * radius;

    let (index, distance) = min_by_key(positions.len(), |i| {
        let oc = positions[i] - origin;
        let along = oc.dot(dir);
        let sqr_miss = oc.length_squared() - along * along;
        if sqr_miss > sqr_radius {
            return None;
        }
        let half_chord = (sqr_radius - sqr_miss).sqrt();
        let near = along - half_chord;
        if near >= 0.0 {
            Some(near)
        } else if along + half_chord >= 0.0 {
            Some(0.0)
        } else {
            None
        }
    })?;

    Some(PickHit {
        index,
        position: positions[index],
        distance,
    })
}
