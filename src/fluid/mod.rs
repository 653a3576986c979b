//! 2D smoothed-particle-hydrodynamics simulation module.
//!
//! The simulation is structured in the following components:
//!
//! - [`params`]: Simulation parameters and their validation
//! - [`particle`]: Particle data and initial layouts
//! - [`spatial`]: Flag-based uniform grid for neighbor search
//! - [`kernels`]: Smoothing kernels
//! - [`boundary`]: Wall collisions
//! - [`solver`]: The per-step SPH pipeline
//! - [`render`]: Read-only views for drawing
//! - [`plugin`]: Bevy plugin for easy integration
//!
//! # Example
//!
//! ```rust,no_run
//! use sph2d::fluid::prelude::*;
//!
//! let mut system = ParticleSystem::new(FluidParams::grid(20, 25)).unwrap();
//! for _ in 0..100 {
//!     system.step();
//! }
//! let lowest = system.positions().map(|p| p.y).fold(f32::INFINITY, f32::min);
//! println!("lowest particle at y = {lowest}");
//! ```

pub mod params;
pub mod particle;
pub mod spatial;
pub mod kernels;
pub mod boundary;
pub mod solver;
pub mod render;
pub mod plugin;

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::params::*;
    pub use super::particle::*;
    pub use super::spatial::*;
    pub use super::kernels::*;
    pub use super::boundary::*;
    pub use super::solver::*;
    pub use super::render::*;
    pub use super::plugin::*;
}
