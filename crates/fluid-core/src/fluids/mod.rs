pub mod density;
pub mod pressure;
pub mod viscosity;

use std::f32::consts::PI;

/// Smoothing kernels with scale factors derived from the smoothing radius.
///
/// The scales keep each kernel's integral over its support normalised, so
/// they are rebuilt whenever the radius changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothingKernels {
    pub radius: f32,
    spiky_pow2_scale: f32,
    spiky_pow3_scale: f32,
    spiky_pow2_derivative_scale: f32,
    spiky_pow3_derivative_scale: f32,
    poly6_scale: f32,
}

impl SmoothingKernels {
    pub fn new(radius: f32) -> Self {
        let h = radius;
        let h3 = h * h * h;
        let h5 = h3 * h * h;
        let h6 = h5 * h;
        let h9 = h6 * h3;
        Self {
            radius,
            spiky_pow2_scale: 15.0 / (2.0 * PI * h5),
            spiky_pow3_scale: 15.0 / (PI * h6),
            spiky_pow2_derivative_scale: 15.0 / (PI * h5),
            spiky_pow3_derivative_scale: 45.0 / (PI * h6),
            poly6_scale: 315.0 / (64.0 * PI * h9),
        }
    }

    /// Density kernel `15 / (2 PI h^5) * (h - r)^2`.
    #[inline]
    pub fn density(&self, dst: f32) -> f32 {
        if dst < self.radius {
            let v = self.radius - dst;
            v * v * self.spiky_pow2_scale
        } else {
            0.0
        }
    }

    /// Near-density kernel `15 / (PI h^6) * (h - r)^3`.
    #[inline]
    pub fn near_density(&self, dst: f32) -> f32 {
        if dst < self.radius {
            let v = self.radius - dst;
            v * v * v * self.spiky_pow3_scale
        } else {
            0.0
        }
    }

    /// Radial derivative of [`Self::density`]. Never positive.
    #[inline]
    pub fn density_derivative(&self, dst: f32) -> f32 {
        if dst <= self.radius {
            let v = self.radius - dst;
            -v * self.spiky_pow2_derivative_scale
        } else {
            0.0
        }
    }

    /// Radial derivative of [`Self::near_density`]. Never positive.
    #[inline]
    pub fn near_density_derivative(&self, dst: f32) -> f32 {
        if dst <= self.radius {
            let v = self.radius - dst;
            -v * v * self.spiky_pow3_derivative_scale
        } else {
            0.0
        }
    }

    /// Poly6 kernel `315 / (64 PI h^9) * (h^2 - r^2)^3`.
    #[inline]
    pub fn poly6(&self, dst: f32) -> f32 {
        if dst < self.radius {
            let v = self.radius * self.radius - dst * dst;
            v * v * v * self.poly6_scale
        } else {
            0.0
        }
    }
}
