//! Fluid particle data and initial placement.
//!
//! Particles are created once from a list of centers and never added or removed
//! afterwards. [`ParticleLayout`] produces those centers.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::params::{FluidParams, DOMAIN_HALF_EXTENT};

/// One simulated fluid sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Particle {
    /// Current location in normalized domain coordinates.
    pub position: Vec2,
    /// Look-ahead location, only used for density evaluation.
    pub predicted_position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    /// Recomputed every step. Never negative.
    pub density: f32,
    pub near_density: f32,
}

impl Particle {
    /// Create a particle at rest at a given position.
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            predicted_position: position,
            ..default()
        }
    }

    /// Create a particle with initial velocity.
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }
}

/// Initial placement strategy, chosen once before the first step.
#[derive(Clone, Debug, PartialEq, Reflect)]
pub enum ParticleLayout {
    /// Regular lattice hanging from the top wall, centered horizontally.
    Grid { rows: usize, cols: usize },
    /// Uniform scatter inside the walls. `None` draws a fresh seed from the OS.
    Random { count: usize, seed: Option<u64> },
    /// Particles supplied directly to
    /// [`ParticleSystem::from_particles`](super::solver::ParticleSystem::from_particles).
    Custom { count: usize },
}

impl Default for ParticleLayout {
    fn default() -> Self {
        ParticleLayout::Grid { rows: 20, cols: 25 }
    }
}

impl ParticleLayout {
    /// Number of particles this layout places.
    pub fn count(&self) -> usize {
        match *self {
            ParticleLayout::Grid { rows, cols } => rows * cols,
            ParticleLayout::Random { count, .. } | ParticleLayout::Custom { count } => count,
        }
    }

    /// Generate particle centers for this layout. A custom layout has none.
    pub fn generate_centers(&self, params: &FluidParams) -> Vec<Vec2> {
        match *self {
            ParticleLayout::Custom { .. } => Vec::new(),
            ParticleLayout::Grid { rows, cols } => grid_centers(rows, cols, params),
            ParticleLayout::Random { count, seed } => {
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_os_rng(),
                };
                random_centers(count, params, &mut rng)
            }
        }
    }
}

/// Row-major lattice. The first row sits just below the top wall and rows
/// step downward by one pitch.
fn grid_centers(rows: usize, cols: usize, params: &FluidParams) -> Vec<Vec2> {
    let pitch = params.lattice_pitch();
    let left = -pitch * cols as f32 / 2.0;
    let mut top = DOMAIN_HALF_EXTENT - (params.spacing + params.particle_radius);

    let mut centers = Vec::with_capacity(rows * cols);
    for _ in 0..rows {
        for col in 0..cols {
            centers.push(Vec2::new(left + col as f32 * pitch, top));
        }
        top -= pitch;
    }
    centers
}

fn random_centers(count: usize, params: &FluidParams, rng: &mut impl Rng) -> Vec<Vec2> {
    let limit = params.wall_limit();
    (0..count)
        .map(|_| Vec2::new(rng.random_range(-limit..=limit), rng.random_range(-limit..=limit)))
        .collect()
}
