use glam::{UVec3, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Axis-aligned box to fill with particles.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnRegion {
    pub centre: Vec3,
    pub size: Vec3,
}

/// How to build the initial particle set on reset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSettings {
    pub regions: Vec<SpawnRegion>,
    /// Particles per unit volume.
    pub density: f32,
    /// Radius of the random offset added to each lattice point.
    pub jitter: f32,
    pub initial_velocity: Vec3,
    pub seed: u64,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            regions: vec![SpawnRegion {
                centre: Vec3::new(-1.5, 0.0, 0.0),
                size: Vec3::new(3.0, 3.0, 3.0),
            }],
            density: 600.0,
            jitter: 0.025,
            initial_velocity: Vec3::ZERO,
            seed: 42,
        }
    }
}

/// Initial positions and velocities produced by [`spawn_particles`].
pub struct SpawnData {
    pub positions: Vec<Vec3>,
    pub velocities: Vec<Vec3>,
}

impl SpawnSettings {
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.density.is_finite() && self.density > 0.0) {
            return Err(SimError::InvalidSpawn(format!(
                "density must be positive, got {}",
                self.density
            )));
        }
        if !(self.jitter.is_finite() && self.jitter >= 0.0) {
            return Err(SimError::InvalidSpawn(format!(
                "jitter must be non-negative, got {}",
                self.jitter
            )));
        }
        if !self.initial_velocity.is_finite() {
            return Err(SimError::InvalidSpawn("initial velocity is not finite".into()));
        }
        for (i, region) in self.regions.iter().enumerate() {
            if !(region.centre.is_finite() && region.size.is_finite() && region.size.min_element() > 0.0) {
                return Err(SimError::InvalidSpawn(format!(
                    "region {} has size {:?} at {:?}",
                    i, region.size, region.centre
                )));
            }
        }
        Ok(())
    }

    /// Lattice points per axis for `region`.
    pub fn points_per_axis(&self, region: &SpawnRegion) -> UVec3 {
        let per_unit = self.density.cbrt();
        let n = (region.size * per_unit).round().max(Vec3::ONE);
        UVec3::new(n.x as u32, n.y as u32, n.z as u32)
    }

    /// Total particle count these settings produce.
    pub fn particle_count(&self) -> Result<usize, SimError> {
        self.validate()?;
        let total: u64 = self
            .regions
            .iter()
            .map(|r| {
                let n = self.points_per_axis(r);
                n.x as u64 * n.y as u64 * n.z as u64
            })
            .sum();
        usize::try_from(total)
            .map_err(|_| SimError::InvalidSpawn(format!("{} particles do not fit in memory", total)))
    }
}

/// Fill every region with a jittered, cell-centred lattice.
///
/// Deterministic for a given seed.
pub fn spawn_particles(settings: &SpawnSettings) -> Result<SpawnData, SimError> {
    let count = settings.particle_count()?;
    let mut rng = StdRng::seed_from_u64(settings.seed);
    let mut positions = Vec::with_capacity(count);

    for region in &settings.regions {
        let n = settings.points_per_axis(region);
        let min = region.centre - region.size * 0.5;
        let step = region.size / n.as_vec3();

        for z in 0..n.z {
            for y in 0..n.y {
                for x in 0..n.x {
                    let lattice = min + (UVec3::new(x, y, z).as_vec3() + 0.5) * step;
                    positions.push(lattice + random_in_unit_sphere(&mut rng) * settings.jitter);
                }
            }
        }
    }

    log::debug!(
        "spawned {} particles in {} regions",
        positions.len(),
        settings.regions.len()
    );

    Ok(SpawnData {
        velocities: vec![settings.initial_velocity; positions.len()],
        positions,
    })
}

fn random_in_unit_sphere(rng: &mut StdRng) -> Vec3 {
    loop {
        let p = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        if p.length_squared() <= 1.0 {
            return p;
        }
    }
}
