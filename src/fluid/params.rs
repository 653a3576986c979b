//! Fluid simulation parameters.
//!
//! These parameters are fixed for the lifetime of a [`ParticleSystem`](super::solver::ParticleSystem).
//! They are consumed once at construction; changing the resource afterwards only takes
//! effect on the next rebuild.

use bevy::prelude::*;
use thiserror::Error;

use super::particle::ParticleLayout;

/// Half-extent of the containment box. Walls sit at `±DOMAIN_HALF_EXTENT`.
pub const DOMAIN_HALF_EXTENT: f32 = 0.9;

/// Half-extent of the normalized space covered by the spatial grid.
pub const GRID_HALF_EXTENT: f32 = 1.0;

/// Downward acceleration applied to every particle.
pub const GRAVITY: f32 = 200.0;

/// Speed cap applied after every force pass.
pub const MAX_SPEED: f32 = 15.0;

/// Fraction of the normal velocity kept after a wall hit.
pub const BOUNDARY_RESTITUTION: f32 = 0.5;

/// Floor used whenever a density ends up in a denominator.
pub const MIN_DENSITY: f32 = 1e-4;

/// Pairs closer than this have no usable direction and are skipped.
pub const MIN_SEPARATION: f32 = 1e-6;

/// Parameters controlling the fluid simulation behavior.
///
/// The defaults are tuned for a few hundred particles in the normalized
/// `[-1, 1]` space. The kernels are only stable around these values, so scale
/// them together when changing the smoothing radius.
#[derive(Resource, Clone, Debug, PartialEq, Reflect)]
#[reflect(Resource)]
pub struct FluidParams {
    /// Number of simulated particles. Must match the layout.
    pub particle_count: usize,

    /// Particle radius for rendering and wall collision.
    pub particle_radius: f32,

    /// Smoothing kernel radius (h). Also the spatial grid cell size.
    pub smoothing_radius: f32,

    /// Density the pressure term pushes towards.
    pub target_density: f32,

    /// Stiffness of the pressure term.
    pub pressure_multiplier: f32,

    /// Stiffness of the short-range near-pressure term.
    pub near_pressure_multiplier: f32,

    /// Strength of velocity smoothing between neighbors.
    pub viscosity_multiplier: f32,

    /// Integration step size.
    pub step_size: f32,

    /// Gap between neighboring particles in a grid layout.
    pub spacing: f32,

    /// Initial placement of the particles.
    pub layout: ParticleLayout,
}

impl Default for FluidParams {
    fn default() -> Self {
        Self {
            particle_count: 500,
            particle_radius: 0.008,
            smoothing_radius: 0.05,
            target_density: 400.0,
            pressure_multiplier: 200.0,
            near_pressure_multiplier: 1000.0,
            viscosity_multiplier: 0.0002,
            step_size: 0.0005,
            spacing: 0.005,
            layout: ParticleLayout::Grid { rows: 20, cols: 25 },
        }
    }
}

impl FluidParams {
    /// Default tuning with a `rows × cols` block of particles hanging from the top wall.
    pub fn grid(rows: usize, cols: usize) -> Self {
        Self::default().with_layout(ParticleLayout::Grid { rows, cols })
    }

    /// Default tuning with `count` particles scattered uniformly.
    pub fn random(count: usize) -> Self {
        Self::default().with_layout(ParticleLayout::Random { count, seed: None })
    }

    /// Same as [`FluidParams::random`] but reproducible.
    pub fn random_seeded(count: usize, seed: u64) -> Self {
        Self::default().with_layout(ParticleLayout::Random {
            count,
            seed: Some(seed),
        })
    }

    /// Set the layout and keep `particle_count` in sync with it.
    pub fn with_layout(mut self, layout: ParticleLayout) -> Self {
        self.particle_count = layout.count();
        self.layout = layout;
        self
    }

    /// Set particle radius.
    pub fn with_particle_radius(mut self, radius: f32) -> Self {
        self.particle_radius = radius;
        self
    }

    /// Set smoothing radius.
    pub fn with_smoothing_radius(mut self, radius: f32) -> Self {
        self.smoothing_radius = radius;
        self
    }

    /// Set target density.
    pub fn with_target_density(mut self, density: f32) -> Self {
        self.target_density = density;
        self
    }

    /// Set pressure stiffness.
    pub fn with_pressure_multiplier(mut self, multiplier: f32) -> Self {
        self.pressure_multiplier = multiplier;
        self
    }

    /// Set near-pressure stiffness.
    pub fn with_near_pressure_multiplier(mut self, multiplier: f32) -> Self {
        self.near_pressure_multiplier = multiplier;
        self
    }

    /// Set viscosity strength.
    pub fn with_viscosity_multiplier(mut self, multiplier: f32) -> Self {
        self.viscosity_multiplier = multiplier;
        self
    }

    /// Set integration step size.
    pub fn with_step_size(mut self, step_size: f32) -> Self {
        self.step_size = step_size;
        self
    }

    /// Set lattice spacing.
    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }

    /// Cell size of the spatial grid. Equal to the smoothing radius so that
    /// all interactions stay inside a 3×3 block of cells.
    pub fn cell_size(&self) -> f32 {
        self.smoothing_radius
    }

    /// Number of grid cells along each axis.
    pub fn grid_resolution(&self) -> usize {
        (2.0 * GRID_HALF_EXTENT / self.cell_size()).ceil() as usize
    }

    /// Innermost coordinate a particle center may take on either axis.
    pub fn wall_limit(&self) -> f32 {
        DOMAIN_HALF_EXTENT - self.particle_radius
    }

    /// Distance between neighboring lattice centers of a grid layout.
    pub fn lattice_pitch(&self) -> f32 {
        2.0 * self.particle_radius + self.spacing
    }

    /// Check every construction-time invariant.
    pub fn validate(&self) -> Result<(), FluidConfigError> {
        self.validate_tuning()?;

        let layout_count = self.layout.count();
        if layout_count != self.particle_count {
            return Err(FluidConfigError::CountMismatch {
                configured: self.particle_count,
                layout: layout_count,
            });
        }

        if let ParticleLayout::Grid { rows, cols } = self.layout {
            let pitch = self.lattice_pitch();
            let limit = self.wall_limit();
            let left = -pitch * cols as f32 / 2.0;
            let right = left + pitch * cols.saturating_sub(1) as f32;
            let top = DOMAIN_HALF_EXTENT - (self.spacing + self.particle_radius);
            let bottom = top - pitch * rows.saturating_sub(1) as f32;
            if left < -limit || right > limit || bottom < -limit {
                return Err(FluidConfigError::LayoutOutOfBounds { rows, cols, limit });
            }
        }

        Ok(())
    }

    /// Check the scalar tuning values only, ignoring the layout.
    pub fn validate_tuning(&self) -> Result<(), FluidConfigError> {
        let scalars = [
            ("particle_radius", self.particle_radius),
            ("smoothing_radius", self.smoothing_radius),
            ("target_density", self.target_density),
            ("pressure_multiplier", self.pressure_multiplier),
            ("near_pressure_multiplier", self.near_pressure_multiplier),
            ("viscosity_multiplier", self.viscosity_multiplier),
            ("step_size", self.step_size),
            ("spacing", self.spacing),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(FluidConfigError::NotFinite { name, value });
            }
            if value < 0.0 {
                return Err(FluidConfigError::Negative { name, value });
            }
        }

        for (name, value) in [
            ("particle_radius", self.particle_radius),
            ("smoothing_radius", self.smoothing_radius),
            ("step_size", self.step_size),
        ] {
            if value == 0.0 {
                return Err(FluidConfigError::Zero { name });
            }
        }

        if self.particle_radius >= DOMAIN_HALF_EXTENT {
            return Err(FluidConfigError::RadiusTooLarge {
                radius: self.particle_radius,
                half_extent: DOMAIN_HALF_EXTENT,
            });
        }

        Ok(())
    }
}

/// Reasons a [`FluidParams`] cannot be turned into a running simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FluidConfigError {
    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f32 },
    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f32 },
    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
    #[error("particle radius {radius} does not fit inside walls at ±{half_extent}")]
    RadiusTooLarge { radius: f32, half_extent: f32 },
    #[error("particle count {configured} does not match the layout, which places {layout}")]
    CountMismatch { configured: usize, layout: usize },
    #[error("a {rows}x{cols} lattice does not fit inside ±{limit}")]
    LayoutOutOfBounds { rows: usize, cols: usize, limit: f32 },
    #[error("particle {index} at {position} lies outside the walls at ±{limit}")]
    ParticleOutsideDomain {
        index: usize,
        position: Vec2,
        limit: f32,
    },
    #[error("particle {index} has non-finite velocity {velocity}")]
    NonFiniteVelocity { index: usize, velocity: Vec2 },
    #[error("a custom layout of {count} particles has no centers to generate")]
    CustomLayout { count: usize },
}
