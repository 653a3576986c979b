//! Bevy plugin for the SPH simulation.

use bevy::prelude::*;

use super::params::FluidParams;
use super::solver::ParticleSystem;

/// Plugin that runs a 2D SPH simulation inside a Bevy app.
///
/// Builds a [`ParticleSystem`] resource from [`FluidParams`] at startup and
/// advances it by exactly one step per `Update`, whether or not anything
/// draws the particles.
///
/// # Example
///
/// ```rust,ignore
/// use bevy::prelude::*;
/// use sph2d::prelude::*;
///
/// fn main() {
///     App::new()
///         .add_plugins(DefaultPlugins)
///         .add_plugins(FluidPlugin::with_params(FluidParams::grid(20, 25)))
///         .run();
/// }
/// ```
#[derive(Default)]
pub struct FluidPlugin {
    params: FluidParams,
}

impl FluidPlugin {
    /// Create a plugin with custom parameters.
    pub fn with_params(params: FluidParams) -> Self {
        Self { params }
    }
}

impl Plugin for FluidPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<FluidParams>();

        app.insert_resource(self.params.clone())
            .init_resource::<FluidState>()
            .add_systems(Startup, setup_particle_system)
            .add_systems(Update, run_simulation);
    }
}

/// Run control and per-frame statistics.
#[derive(Resource, Clone, Debug, Default)]
pub struct FluidState {
    /// When set, the simulation only advances on [`FluidState::request_step`].
    pub paused: bool,
    /// One pending single step while paused.
    pub step_requested: bool,
    /// Steps taken since the system was built.
    pub frame: u64,
    pub particle_count: usize,
    pub avg_density_error: f32,
}

impl FluidState {
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        debug!("fluid simulation {}", if self.paused { "paused" } else { "resumed" });
    }

    /// Advance one step on the next update while paused.
    pub fn request_step(&mut self) {
        self.step_requested = true;
    }

    fn should_step(&mut self) -> bool {
        if !self.paused {
            return true;
        }
        std::mem::take(&mut self.step_requested)
    }
}

/// System to build the particle system from the configured parameters.
fn setup_particle_system(mut commands: Commands, params: Res<FluidParams>) {
    match ParticleSystem::new(params.clone()) {
        Ok(system) => commands.insert_resource(system),
        Err(err) => error!("Invalid fluid parameters, simulation disabled: {err}"),
    }
}

/// System to run one simulation step per frame.
fn run_simulation(mut state: ResMut<FluidState>, system: Option<ResMut<ParticleSystem>>) {
    let Some(mut system) = system else {
        return;
    };

    if state.should_step() {
        system.step();
    }

    state.frame = system.frame();
    state.particle_count = system.len();
    state.avg_density_error = system.average_density_error();
}
