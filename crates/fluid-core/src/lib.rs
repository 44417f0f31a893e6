//! CPU core of a real-time particle fluid.
//!
//! Each step predicts positions, sorts the particles into a uniform grid
//! with a counting sort, accumulates SPH density and near-density, applies
//! symmetric pressure and viscosity, then integrates against an optional
//! obstacle and the domain walls. [`solver::FluidSim`] owns the state and
//! runs the pipeline.

pub mod collision;
pub mod config;
pub mod error;
pub mod fluids;
pub mod forces;
pub mod grid;
pub mod particle;
pub mod picking;
pub mod solver;
pub mod sort;
pub mod spawn;

mod parallel;

pub use config::{FluidConfig, InteractionInput, Obstacle, SimLimits};
pub use error::SimError;
pub use solver::{FluidSim, FrameStats};
pub use spawn::{SpawnRegion, SpawnSettings};
