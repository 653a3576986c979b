//! sph2d - 2D SPH fluid simulation core for Bevy
//!
//! This library advances a fixed population of fluid particles inside a square
//! container using smoothed-particle hydrodynamics: density and near-density
//! from neighbors, pressure and near-pressure forces, viscosity, gravity and
//! inelastic wall bounces.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use bevy::prelude::*;
//! use sph2d::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(FluidPlugin::with_params(FluidParams::grid(20, 25)))
//!         .add_systems(Update, draw_particles)
//!         .run();
//! }
//!
//! fn draw_particles(system: Option<Res<ParticleSystem>>, mut gizmos: Gizmos) {
//!     let Some(system) = system else { return };
//!     let radius = system.params().particle_radius * 300.0;
//!     for particle in system.particles() {
//!         let color = velocity_to_color(particle.velocity.length());
//!         gizmos.circle_2d(particle.position * 300.0, radius, color);
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`fluid`]: Core fluid simulation module
//!   - [`fluid::params`]: Simulation parameters
//!   - [`fluid::particle`]: Particle data and layouts
//!   - [`fluid::spatial`]: Spatial grid for neighbor search
//!   - [`fluid::kernels`]: Smoothing kernels
//!   - [`fluid::boundary`]: Wall handling
//!   - [`fluid::solver`]: SPH step pipeline
//!   - [`fluid::render`]: Rendering helpers
//!   - [`fluid::plugin`]: Bevy plugin

pub mod fluid;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::fluid::prelude::*;
}
