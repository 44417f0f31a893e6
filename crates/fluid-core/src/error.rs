use glam::Vec3;

/// Errors raised when a simulation is created, reset or reconfigured.
///
/// Stepping never fails: numerical trouble during a step is clamped away
/// instead. Everything here is an initialisation-time failure.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// Smoothing radius was zero, negative or not finite.
    InvalidSmoothingRadius(f32),
    /// One or more bounds extents were zero, negative or not finite.
    InvalidBounds(Vec3),
    /// The spawn description cannot produce particles.
    InvalidSpawn(String),
    /// The grid needs more scan elements than the hierarchical scan supports.
    GridTooLarge { cells: u64, max: u64 },
    /// A buffer would exceed the configured per-buffer size limit.
    BufferTooLarge {
        buffer: &'static str,
        bytes: u64,
        max: u64,
    },
    /// Position and velocity arrays handed to the simulation differ in length.
    ParticleCountMismatch { positions: usize, velocities: usize },
    /// The new configuration changes the grid layout and needs a full reset.
    ResetRequired,
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::InvalidSmoothingRadius(r) => {
                write!(f, "smoothing radius must be positive and finite, got {}", r)
            }
            SimError::InvalidBounds(b) => {
                write!(f, "bounds size must be positive and finite, got {:?}", b)
            }
            SimError::InvalidSpawn(msg) => write!(f, "invalid spawn settings: {}", msg),
            SimError::GridTooLarge { cells, max } => write!(
                f,
                "grid needs {} scan elements, hierarchical scan supports at most {}",
                cells, max
            ),
            SimError::BufferTooLarge { buffer, bytes, max } => write!(
                f,
                "{} buffer needs {} bytes, limit is {}",
                buffer, bytes, max
            ),
            SimError::ParticleCountMismatch {
                positions,
                velocities,
            } => write!(
                f,
                "got {} positions but {} velocities",
                positions, velocities
            ),
            SimError::ResetRequired => {
                write!(f, "grid layout changed, a full reset is required")
            }
        }
    }
}

impl std::error::Error for SimError {}
