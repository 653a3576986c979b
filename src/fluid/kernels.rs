//! SPH smoothing kernels for the 2D solver.
//!
//! All five kernels have compact support: they return exactly zero at and beyond
//! the smoothing radius. The scale factors are tuned for this 2D setup and are
//! not the textbook 3D normalizations.

use std::f32::consts::PI;

/// Kernel set for a fixed smoothing radius, with scale factors precomputed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphKernels {
    radius: f32,
    density_scale: f32,
    pressure_scale: f32,
    near_pressure_scale: f32,
    viscosity_scale: f32,
}

impl SphKernels {
    pub fn new(smoothing_radius: f32) -> Self {
        let h = smoothing_radius;
        Self {
            radius: h,
            density_scale: 4.0 / (PI * h.powi(8)),
            pressure_scale: -30.0 / (PI * h.powi(5)),
            near_pressure_scale: -3.0 / h,
            viscosity_scale: 40.0 / (PI * h.powi(5)),
        }
    }

    /// W(d) = 4 / (πh⁸) · (h² − d²)³
    #[inline]
    pub fn density(&self, distance: f32) -> f32 {
        if distance >= self.radius {
            return 0.0;
        }
        let v = self.radius * self.radius - distance * distance;
        v * v * v * self.density_scale
    }

    /// (1 − d/h)³, a short-range density proxy.
    #[inline]
    pub fn near_density(&self, distance: f32) -> f32 {
        if distance >= self.radius {
            return 0.0;
        }
        let v = 1.0 - distance / self.radius;
        v * v * v
    }

    /// −30 / (πh⁵) · (h − d)²
    #[inline]
    pub fn pressure(&self, distance: f32) -> f32 {
        if distance >= self.radius {
            return 0.0;
        }
        let v = self.radius - distance;
        v * v * self.pressure_scale
    }

    /// −3/h · (1 − d/h)²
    #[inline]
    pub fn near_pressure(&self, distance: f32) -> f32 {
        if distance >= self.radius {
            return 0.0;
        }
        let v = 1.0 - distance / self.radius;
        v * v * self.near_pressure_scale
    }

    /// 40 / (πh⁵) · (h − d)
    #[inline]
    pub fn viscosity(&self, distance: f32) -> f32 {
        if distance >= self.radius {
            return 0.0;
        }
        (self.radius - distance) * self.viscosity_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const H: f32 = 0.05;

    fn all(k: &SphKernels, d: f32) -> [f32; 5] {
        [
            k.density(d),
            k.near_density(d),
            k.pressure(d),
            k.near_pressure(d),
            k.viscosity(d),
        ]
    }

    #[test]
    fn test_compact_support() {
        let k = SphKernels::new(H);
        for d in [H, H * 1.0001, H * 2.0, 10.0] {
            assert_eq!(all(&k, d), [0.0; 5], "non-zero kernel at d={d}");
        }
    }

    #[test]
    fn test_values_at_zero() {
        let k = SphKernels::new(H);
        let density = 4.0 / (PI * H.powi(8)) * H.powi(6);
        assert!((k.density(0.0) - density).abs() / density < 1e-5);
        assert_eq!(k.near_density(0.0), 1.0);
        let pressure = -30.0 / (PI * H.powi(5)) * H * H;
        assert!((k.pressure(0.0) - pressure).abs() / pressure.abs() < 1e-5);
        assert!((k.near_pressure(0.0) - (-3.0 / H)).abs() < 1e-3);
        let viscosity = 40.0 / (PI * H.powi(5)) * H;
        assert!((k.viscosity(0.0) - viscosity).abs() / viscosity < 1e-5);
    }

    #[test]
    fn test_smoothing_kernels_positive_and_decreasing() {
        let k = SphKernels::new(H);
        let samples = 200;
        let mut prev = [f32::INFINITY; 3];
        for i in 0..samples {
            let d = H * i as f32 / samples as f32;
            let now = [k.density(d), k.near_density(d), k.viscosity(d)];
            for (j, value) in now.iter().enumerate() {
                assert!(*value >= 0.0, "kernel {j} negative at d={d}");
                assert!(*value <= prev[j], "kernel {j} increased at d={d}");
            }
            prev = now;
        }
    }

    #[test]
    fn test_pressure_kernels_are_repulsive() {
        let k = SphKernels::new(H);
        for d in [0.0, H * 0.25, H * 0.5, H * 0.99] {
            assert!(k.pressure(d) < 0.0);
            assert!(k.near_pressure(d) < 0.0);
        }
    }
}
