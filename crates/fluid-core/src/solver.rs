use glam::Vec3;

use crate::collision::{integrate, Collider};
use crate::config::{FluidConfig, InteractionInput, SimLimits};
use crate::error::SimError;
use crate::fluids::density::compute_densities;
use crate::fluids::pressure::{apply_pressure, PressureParams};
use crate::fluids::viscosity::apply_viscosity;
use crate::fluids::SmoothingKernels;
use crate::forces::external::{apply_external_forces, ExternalForces};
use crate::grid::GridLayout;
use crate::particle::{DensityPair, ParticleSet};
use crate::picking::{pick, PickHit};
use crate::sort::SpatialIndex;
use crate::spawn::{spawn_particles, SpawnSettings};

/// Summary of the last `run_frame` call.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    /// Simulated time covered by the frame, after scaling and capping.
    pub frame_time: f32,
    pub sub_steps: u32,
    pub step_dt: f32,
    pub particle_count: u32,
    /// Fullest grid cell seen by the last sub-step.
    pub max_cell_occupancy: u32,
}

/// Owned simulation state: particles, grid buffers and parameters.
///
/// Created by [`FluidSim::new`], advanced by [`FluidSim::run_frame`] or
/// [`FluidSim::step`], and rebuilt from scratch by [`FluidSim::reset`].
pub struct FluidSim {
    pub particles: ParticleSet,
    /// Pointer interaction applied by the next steps.
    pub interaction: InteractionInput,
    config: FluidConfig,
    limits: SimLimits,
    kernels: SmoothingKernels,
    collider: Collider,
    index: SpatialIndex,
    last_frame: FrameStats,
}

impl FluidSim {
    pub fn new(config: FluidConfig, spawn: &SpawnSettings) -> Result<Self, SimError> {
        Self::with_limits(config, spawn, SimLimits::default())
    }

    /// Like [`FluidSim::new`] with explicit buffer limits.
    pub fn with_limits(config: FluidConfig, spawn: &SpawnSettings, limits: SimLimits) -> Result<Self, SimError> {
        config.validate()?;
        let count = spawn.particle_count()?;
        limits.check("position", count, std::mem::size_of::<Vec3>())?;

        let data = spawn_particles(spawn)?;
        Self::build(config, ParticleSet::from_state(data.positions, data.velocities), limits)
    }

    /// Start from explicit particle state instead of a spawn description.
    pub fn from_particles(
        config: FluidConfig,
        positions: Vec<Vec3>,
        velocities: Vec<Vec3>,
    ) -> Result<Self, SimError> {
        if positions.len() != velocities.len() {
            return Err(SimError::ParticleCountMismatch {
                positions: positions.len(),
                velocities: velocities.len(),
            });
        }
        Self::build(config, ParticleSet::from_state(positions, velocities), SimLimits::default())
    }

    fn build(config: FluidConfig, particles: ParticleSet, limits: SimLimits) -> Result<Self, SimError> {
        config.validate()?;
        let config = config.clamped();
        let layout = GridLayout::from_config(&config)?;
        let index = SpatialIndex::new(layout, particles.count, &limits)?;

        let res = layout.resolution();
        log::info!(
            "fluid sim ready: {} particles, radius {}, grid {}x{}x{}",
            particles.count,
            config.smoothing_radius,
            res.x,
            res.y,
            res.z
        );

        Ok(Self {
            particles,
            interaction: InteractionInput::default(),
            kernels: SmoothingKernels::new(config.smoothing_radius),
            collider: Collider::new(&config),
            config,
            limits,
            index,
            last_frame: FrameStats::default(),
        })
    }

    /// Regenerate every particle and reallocate every buffer.
    ///
    /// On error the current state is left untouched.
    pub fn reset(&mut self, config: FluidConfig, spawn: &SpawnSettings) -> Result<(), SimError> {
        *self = Self::with_limits(config, spawn, self.limits)?;
        Ok(())
    }

    /// Swap in new parameters that keep the current grid layout.
    ///
    /// Changing the smoothing radius or bounds needs [`FluidSim::reset`].
    pub fn update_config(&mut self, config: FluidConfig) -> Result<(), SimError> {
        if self.config.layout_differs(&config) {
            log::warn!(
                "rejected config update: radius {} -> {}, bounds {:?} -> {:?} needs a reset",
                self.config.smoothing_radius,
                config.smoothing_radius,
                self.config.bounds_size,
                config.bounds_size
            );
            return Err(SimError::ResetRequired);
        }
        self.config = config.clamped();
        self.collider = Collider::new(&self.config);
        Ok(())
    }

    /// Advance by one rendered frame of `frame_dt` real seconds.
    ///
    /// The frame is scaled by `time_scale`, capped at
    /// `1 / max_timestep_fps` and split evenly across
    /// `iterations_per_frame` sub-steps.
    pub fn run_frame(&mut self, frame_dt: f32) -> FrameStats {
        let frame_time = self.config.frame_time(frame_dt);
        let sub_steps = self.config.iterations_per_frame.max(1);
        let step_dt = self.config.step_time(frame_dt);

        if frame_time < frame_dt * self.config.time_scale {
            log::debug!("frame time capped: {} -> {}", frame_dt * self.config.time_scale, frame_time);
        }

        let steps_run = if step_dt > 0.0 {
            for _ in 0..sub_steps {
                self.step(step_dt);
            }
            sub_steps
        } else {
            0
        };

        self.last_frame = FrameStats {
            frame_time,
            sub_steps: steps_run,
            step_dt,
            particle_count: self.particles.count as u32,
            max_cell_occupancy: self.index.max_cell_occupancy(),
        };
        log::trace!("{:?}", self.last_frame);
        self.last_frame
    }

    /// One full pipeline pass of length `dt`.
    pub fn step(&mut self, dt: f32) {
        self.apply_external_forces(dt);
        self.rebuild_spatial_index();
        self.compute_densities();
        self.apply_pressure(dt);
        self.apply_viscosity(dt);
        self.integrate(dt);
    }

    /// Gravity and interaction into velocity, then predicted positions.
    pub fn apply_external_forces(&mut self, dt: f32) {
        let forces = ExternalForces::new(&self.config, &self.interaction);
        apply_external_forces(&mut self.particles, &forces, dt);
    }

    /// Hash, sort and reorder the particles by the cell of their predicted position.
    pub fn rebuild_spatial_index(&mut self) {
        self.index.rebuild(&mut self.particles);
    }

    pub fn compute_densities(&mut self) {
        compute_densities(&mut self.particles, &self.index, &self.kernels);
    }

    pub fn apply_pressure(&mut self, dt: f32) {
        let params = PressureParams::from_config(&self.config);
        apply_pressure(&mut self.particles, &self.index, &self.kernels, &params, dt);
    }

    pub fn apply_viscosity(&mut self, dt: f32) {
        apply_viscosity(
            &mut self.particles,
            &self.index,
            &self.kernels,
            self.config.viscosity_strength,
            dt,
        );
    }

    pub fn integrate(&mut self, dt: f32) {
        integrate(&mut self.particles, &self.collider, dt);
    }

    /// Nearest particle whose sphere of `radius` the ray hits.
    pub fn pick(&self, origin: Vec3, dir: Vec3, radius: f32) -> Option<PickHit> {
        pick(&self.particles.position, origin, dir, radius)
    }

    pub fn config(&self) -> &FluidConfig {
        &self.config
    }

    pub fn limits(&self) -> SimLimits {
        self.limits
    }

    pub fn kernels(&self) -> &SmoothingKernels {
        &self.kernels
    }

    pub fn spatial_index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn particle_count(&self) -> usize {
        self.particles.count
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.particles.position
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.particles.velocity
    }

    pub fn densities(&self) -> &[DensityPair] {
        &self.particles.density
    }

    pub fn last_frame(&self) -> FrameStats {
        self.last_frame
    }
}
