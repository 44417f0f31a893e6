use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Look-ahead used to build predicted positions, independent of the real timestep.
pub const PREDICTION_FACTOR: f32 = 1.0 / 120.0;

/// Static obstacle placed inside the simulation domain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Obstacle {
    #[default]
    None,
    /// Oriented box. `size` is the full extent, `rotation` is XYZ Euler angles in degrees.
    Box {
        centre: Vec3,
        size: Vec3,
        #[serde(default)]
        rotation: Vec3,
    },
    Sphere { centre: Vec3, radius: f32 },
}

/// Tunable simulation parameters.
///
/// Fields that shape the grid (`smoothing_radius`, `bounds_size`) are fixed
/// for the lifetime of a simulation; everything else may change between
/// frames through `FluidSim::update_config`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluidConfig {
    pub smoothing_radius: f32,
    pub target_density: f32,
    pub pressure_multiplier: f32,
    pub near_pressure_multiplier: f32,
    pub viscosity_strength: f32,
    /// Vertical gravity acceleration (negative pulls down).
    pub gravity: f32,
    /// Fraction of normal velocity kept after a wall bounce, in `[0, 1]`.
    pub collision_damping: f32,
    /// Full extent of the domain box, centred on the origin.
    pub bounds_size: Vec3,
    pub time_scale: f32,
    /// Frame time is capped at `1 / max_timestep_fps`. Zero or less disables the cap.
    pub max_timestep_fps: f32,
    pub iterations_per_frame: u32,
    pub obstacle: Obstacle,
    pub interaction_radius: f32,
    pub interaction_strength: f32,
}

impl Default for FluidConfig {
    fn default() -> Self {
        Self {
            smoothing_radius: 0.2,
            target_density: 630.0,
            pressure_multiplier: 288.0,
            near_pressure_multiplier: 2.15,
            viscosity_strength: 0.001,
            gravity: -10.0,
            collision_damping: 0.95,
            bounds_size: Vec3::new(8.0, 4.0, 4.0),
            time_scale: 1.0,
            max_timestep_fps: 60.0,
            iterations_per_frame: 3,
            obstacle: Obstacle::None,
            interaction_radius: 2.0,
            interaction_strength: 90.0,
        }
    }
}

impl FluidConfig {
    /// Reject values that would make the grid or buffers meaningless.
    pub fn validate(&self) -> Result<(), SimError> {
        let h = self.smoothing_radius;
        if !(h.is_finite() && h > 0.0) {
            return Err(SimError::InvalidSmoothingRadius(h));
        }
        let b = self.bounds_size;
        if !(b.is_finite() && b.min_element() > 0.0) {
            return Err(SimError::InvalidBounds(b));
        }
        Ok(())
    }

    /// Copy with soft parameters pulled back into their valid ranges.
    pub fn clamped(&self) -> Self {
        let mut out = self.clone();
        out.collision_damping = if self.collision_damping.is_finite() {
            self.collision_damping.clamp(0.0, 1.0)
        } else {
            0.0
        };
        out.iterations_per_frame = self.iterations_per_frame.max(1);
        out.viscosity_strength = self.viscosity_strength.max(0.0);
        out.interaction_radius = self.interaction_radius.max(0.0);
        out.time_scale = self.time_scale.max(0.0);
        if !self.interaction_strength.is_finite() {
            out.interaction_strength = 0.0;
        }
        out
    }

    pub fn half_bounds(&self) -> Vec3 {
        self.bounds_size * 0.5
    }

    pub fn min_bounds(&self) -> Vec3 {
        -self.half_bounds()
    }

    pub fn max_bounds(&self) -> Vec3 {
        self.half_bounds()
    }

    /// True when `other` would need a different grid / buffer layout.
    pub fn layout_differs(&self, other: &FluidConfig) -> bool {
        self.smoothing_radius != other.smoothing_radius || self.bounds_size != other.bounds_size
    }

    /// Simulated time covered by a frame of `frame_dt` real seconds.
    pub fn frame_time(&self, frame_dt: f32) -> f32 {
        let max_dt = if self.max_timestep_fps > 0.0 {
            1.0 / self.max_timestep_fps
        } else {
            f32::INFINITY
        };
        (frame_dt * self.time_scale).min(max_dt).max(0.0)
    }

    /// Length of one sub-step for a frame of `frame_dt` real seconds.
    pub fn step_time(&self, frame_dt: f32) -> f32 {
        self.frame_time(frame_dt) / self.iterations_per_frame.max(1) as f32
    }
}

/// Pointer interaction for the current frame, derived by the caller from picking.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InteractionInput {
    pub point: Vec3,
    pub pull: bool,
    pub push: bool,
}

impl InteractionInput {
    /// Signed strength: positive pulls toward `point`, negative pushes away.
    pub fn signed_strength(&self, strength: f32) -> f32 {
        match (self.pull, self.push) {
            (true, false) => strength,
            (false, true) => -strength,
            _ => 0.0,
        }
    }
}

/// Per-buffer allocation limit checked when buffers are (re)allocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimLimits {
    pub max_buffer_bytes: u64,
}

impl Default for SimLimits {
    fn default() -> Self {
        Self {
            max_buffer_bytes: 128 << 20,
        }
    }
}

impl SimLimits {
    pub(crate) fn check(&self, buffer: &'static str, elements: usize, stride: usize) -> Result<(), SimError> {
        let bytes = elements as u64 * stride as u64;
        if bytes > self.max_buffer_bytes {
            return Err(SimError::BufferTooLarge {
                buffer,
                bytes,
                max: self.max_buffer_bytes,
            });
        }
        Ok(())
    }
}
