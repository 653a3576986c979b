//! SPH particle solver.
//!
//! [`ParticleSystem`] owns the particles and the spatial grid and advances both
//! by one fixed step per [`ParticleSystem::step`] call. A step runs five passes
//! in a fixed order:
//!
//! 1. advance positions, resolve wall hits and rebucket into the grid
//! 2. predict a look-ahead position for every particle
//! 3. accumulate density and near-density
//! 4. accumulate pressure, near-pressure and viscosity forces, then integrate
//!    velocity
//!
//! Densities are finished for every particle before the first force is
//! evaluated, since the force pass reads neighbor densities.

use bevy::prelude::*;

use super::boundary::BoxBoundary;
use super::kernels::SphKernels;
use super::params::{
    FluidConfigError, FluidParams, GRAVITY, MAX_SPEED, MIN_DENSITY, MIN_SEPARATION,
};
use super::particle::{Particle, ParticleLayout};
use super::render::{build_instances, ParticleInstance};
use super::spatial::SpatialGrid;

/// A running 2D SPH simulation.
#[derive(Resource, Clone, Debug)]
pub struct ParticleSystem {
    params: FluidParams,
    kernels: SphKernels,
    boundary: BoxBoundary,
    particles: Vec<Particle>,
    /// Particle state right after construction, restored by [`ParticleSystem::reset`].
    initial: Vec<Particle>,
    grid: SpatialGrid,
    frame: u64,
}

impl ParticleSystem {
    /// Build a simulation from the layout described by `params`.
    pub fn new(params: FluidParams) -> Result<Self, FluidConfigError> {
        params.validate()?;
        if let ParticleLayout::Custom { count } = params.layout {
            return Err(FluidConfigError::CustomLayout { count });
        }
        let particles = params
            .layout
            .generate_centers(&params)
            .into_iter()
            .map(Particle::new)
            .collect();
        Ok(Self::build(params, particles))
    }

    /// Build a simulation from explicit particles. The configured layout is
    /// replaced by [`ParticleLayout::Custom`] and `particle_count` is taken
    /// from `particles`.
    pub fn from_particles(
        mut params: FluidParams,
        particles: Vec<Particle>,
    ) -> Result<Self, FluidConfigError> {
        params.validate_tuning()?;

        let boundary = BoxBoundary::domain();
        if let Some((index, particle)) = particles
            .iter()
            .enumerate()
            .find(|(_, p)| !boundary.contains(p.position, params.particle_radius))
        {
            return Err(FluidConfigError::ParticleOutsideDomain {
                index,
                position: particle.position,
                limit: boundary.limit(params.particle_radius),
            });
        }

        if let Some((index, particle)) = particles
            .iter()
            .enumerate()
            .find(|(_, p)| !p.velocity.is_finite())
        {
            return Err(FluidConfigError::NonFiniteVelocity {
                index,
                velocity: particle.velocity,
            });
        }

        params = params.with_layout(ParticleLayout::Custom {
            count: particles.len(),
        });
        Ok(Self::build(params, particles))
    }

    fn build(params: FluidParams, particles: Vec<Particle>) -> Self {
        let grid = SpatialGrid::for_params(&params);
        info!(
            "SPH system: {} particles, {:?}, {}x{} grid of {} cells",
            particles.len(),
            params.layout,
            grid.resolution(),
            grid.resolution(),
            grid.cell_size()
        );

        let mut system = Self {
            kernels: SphKernels::new(params.smoothing_radius),
            boundary: BoxBoundary::domain(),
            initial: particles.clone(),
            particles,
            grid,
            frame: 0,
            params,
        };
        system.populate_grid();
        system
    }

    fn populate_grid(&mut self) {
        self.grid = SpatialGrid::for_params(&self.params);
        for (i, particle) in self.particles.iter().enumerate() {
            self.grid.insert(i, particle.position);
        }
    }

    /// Restore the particles to their state at construction.
    pub fn reset(&mut self) {
        self.particles.clone_from(&self.initial);
        self.populate_grid();
        self.frame = 0;
        debug!("SPH system reset to {} particles", self.particles.len());
    }

    /// Advance the simulation by one step of `params.step_size`.
    pub fn step(&mut self) {
        self.advance_and_rebucket();
        self.predict_positions();
        self.compute_densities();
        self.apply_forces();
        self.frame += 1;
    }

    fn advance_and_rebucket(&mut self) {
        let dt = self.params.step_size;
        for (i, particle) in self.particles.iter_mut().enumerate() {
            let previous = particle.position;
            particle.position += dt * particle.velocity;
            self.boundary
                .resolve(&mut particle.position, &mut particle.velocity, &self.params);
            self.grid.move_particle(i, previous, particle.position);
        }
    }

    fn predict_positions(&mut self) {
        let dt = self.params.step_size;
        for particle in &mut self.particles {
            particle.predicted_position = particle.position + dt * particle.velocity;
        }
    }

    /// Neighbors are looked up around the current position while distances use
    /// the predicted positions.
    fn compute_densities(&mut self) {
        for i in 0..self.particles.len() {
            let center = self.particles[i].predicted_position;
            let mut density = 0.0;
            let mut near_density = 0.0;

            for j in self.grid.neighbors(self.particles[i].position, i) {
                let distance = center.distance(self.particles[j].predicted_position);
                density += self.kernels.density(distance);
                near_density += self.kernels.near_density(distance);
            }

            let particle = &mut self.particles[i];
            particle.density = density;
            particle.near_density = near_density;
        }
    }

    /// Particles are integrated in index order, so later particles see the
    /// updated velocities of earlier ones in their viscosity term.
    fn apply_forces(&mut self) {
        let dt = self.params.step_size;
        for i in 0..self.particles.len() {
            let force = self.force_on(i);

            let particle = &mut self.particles[i];
            particle.acceleration = force / particle.density.max(MIN_DENSITY);
            particle.acceleration.y -= GRAVITY;
            particle.velocity += dt * particle.acceleration;
            particle.velocity = particle.velocity.clamp_length_max(MAX_SPEED);
        }
    }

    /// Pressure, near-pressure and viscosity force on particle `i`.
    fn force_on(&self, i: usize) -> Vec2 {
        let params = &self.params;
        let target = params.target_density;
        let particle = &self.particles[i];

        let mut pressure = Vec2::ZERO;
        let mut viscosity = Vec2::ZERO;

        for j in self.grid.neighbors(particle.position, i) {
            let neighbor = &self.particles[j];
            let offset = neighbor.position - particle.position;
            let distance = offset.length();
            if distance <= MIN_SEPARATION {
                continue;
            }
            let direction = offset / distance;

            let shared = self.kernels.pressure(distance)
                * ((neighbor.density - target) + (particle.density - target))
                * params.pressure_multiplier
                / (2.0 * neighbor.density.max(MIN_DENSITY))
                + self.kernels.near_pressure(distance)
                    * neighbor.near_density
                    * params.near_pressure_multiplier;
            pressure += direction * shared;

            viscosity += (neighbor.velocity - particle.velocity) * self.kernels.viscosity(distance);
        }

        pressure + viscosity * params.viscosity_multiplier * particle.density
    }

    pub fn params(&self) -> &FluidParams {
        &self.params
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Read-only particle state, valid until the next step.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn positions(&self) -> impl ExactSizeIterator<Item = Vec2> + '_ {
        self.particles.iter().map(|p| p.position)
    }

    pub fn velocities(&self) -> impl ExactSizeIterator<Item = Vec2> + '_ {
        self.particles.iter().map(|p| p.velocity)
    }

    /// Instance data for drawing the current state.
    pub fn instances(&self) -> Vec<ParticleInstance> {
        build_instances(&self.particles, self.params.particle_radius)
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Number of steps taken since construction or the last reset.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn average_density(&self) -> f32 {
        if self.particles.is_empty() {
            return 0.0;
        }
        self.particles.iter().map(|p| p.density).sum::<f32>() / self.particles.len() as f32
    }

    /// Mean relative deviation from the target density.
    pub fn average_density_error(&self) -> f32 {
        let target = self.params.target_density;
        if self.particles.is_empty() || target <= 0.0 {
            return 0.0;
        }
        let total: f32 = self
            .particles
            .iter()
            .map(|p| (p.density - target).abs() / target)
            .sum();
        total / self.particles.len() as f32
    }

    pub fn max_speed(&self) -> f32 {
        self.particles
            .iter()
            .map(|p| p.velocity.length())
            .fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(separation: f32, target_density: f32) -> ParticleSystem {
        let params = FluidParams::default().with_target_density(target_density);
        let particles = vec![
            Particle::new(Vec2::new(-separation / 2.0, 0.0)),
            Particle::new(Vec2::new(separation / 2.0, 0.0)),
        ];
        ParticleSystem::from_particles(params, particles).unwrap()
    }

    #[test]
    fn test_new_inserts_every_particle_once() {
        let system = ParticleSystem::new(FluidParams::grid(5, 8)).unwrap();
        assert_eq!(system.len(), 40);
        for i in 0..system.len() {
            assert_eq!(
                system.grid().cells_containing(i),
                vec![system.grid().cell_of(system.particles()[i].position)]
            );
        }
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = FluidParams {
            particle_count: 3,
            ..FluidParams::grid(2, 2)
        };
        assert!(matches!(
            ParticleSystem::new(params),
            Err(FluidConfigError::CountMismatch { .. })
        ));
    }

    #[test]
    fn test_particle_outside_walls_rejected() {
        let particles = vec![Particle::new(Vec2::ZERO), Particle::new(Vec2::new(0.0, 0.95))];
        assert!(matches!(
            ParticleSystem::from_particles(FluidParams::default(), particles),
            Err(FluidConfigError::ParticleOutsideDomain { index: 1, .. })
        ));
    }

    #[test]
    fn test_non_finite_velocity_rejected() {
        let particles = vec![
            Particle::new(Vec2::ZERO),
            Particle::new(Vec2::new(0.1, 0.0)).with_velocity(Vec2::new(f32::INFINITY, 0.0)),
        ];
        assert!(matches!(
            ParticleSystem::from_particles(FluidParams::default(), particles),
            Err(FluidConfigError::NonFiniteVelocity { index: 1, .. })
        ));
    }

    #[test]
    fn test_custom_particles_record_custom_layout() {
        let particles = vec![Particle::new(Vec2::ZERO), Particle::new(Vec2::new(0.1, 0.0))];
        let system = ParticleSystem::from_particles(FluidParams::grid(3, 3), particles).unwrap();
        assert_eq!(system.params().layout, ParticleLayout::Custom { count: 2 });
        assert_eq!(system.params().particle_count, 2);
        assert_eq!(system.params().validate(), Ok(()));

        assert_eq!(
            ParticleSystem::new(system.params().clone()).err(),
            Some(FluidConfigError::CustomLayout { count: 2 })
        );
    }

    #[test]
    fn test_density_uses_predicted_positions() {
        let h = FluidParams::default().smoothing_radius;
        let mut system = pair(0.5 * h, 100.0);
        system.particles[0].velocity = Vec2::new(-20.0, 0.0);
        system.predict_positions();
        system.compute_densities();

        let dt = system.params.step_size;
        let predicted = 0.5 * h + 20.0 * dt;
        let expected = system.kernels.density(predicted);
        assert!((system.particles[1].density - expected).abs() <= expected * 1e-4);
        assert!(
            (system.particles[1].near_density - system.kernels.near_density(predicted)).abs()
                < 1e-5
        );
    }

    #[test]
    fn test_close_pair_repels() {
        let h = FluidParams::default().smoothing_radius;
        let mut system = pair(0.5 * h, 100.0);
        system.predict_positions();
        system.compute_densities();

        let target = system.params.target_density;
        assert_eq!(system.particles[0].density, system.particles[1].density);
        assert!(system.particles[0].density > target);

        // Particle 0 is on the left, so it should be pushed towards -x.
        assert!(system.force_on(0).x < 0.0);
        assert!(system.force_on(1).x > 0.0);
    }

    #[test]
    fn test_coincident_particles_are_skipped() {
        let params = FluidParams::default();
        let particles = vec![Particle::new(Vec2::ZERO), Particle::new(Vec2::ZERO)];
        let mut system = ParticleSystem::from_particles(params, particles).unwrap();
        system.predict_positions();
        system.compute_densities();

        assert_eq!(system.force_on(0), Vec2::ZERO);
        system.step();
        for p in system.particles() {
            assert!(p.velocity.is_finite());
            assert!(p.position.is_finite());
        }
    }

    #[test]
    fn test_speed_is_capped() {
        let particles = vec![Particle::new(Vec2::ZERO).with_velocity(Vec2::new(0.0, 100.0))];
        let mut system = ParticleSystem::from_particles(FluidParams::default(), particles).unwrap();
        system.step();
        assert!(system.max_speed() <= MAX_SPEED + 1e-4);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut system = ParticleSystem::new(FluidParams::grid(4, 4)).unwrap();
        let initial = system.particles().to_vec();
        for _ in 0..10 {
            system.step();
        }
        assert_ne!(system.particles(), initial.as_slice());
        assert_eq!(system.frame(), 10);

        system.reset();
        assert_eq!(system.particles(), initial.as_slice());
        assert_eq!(system.frame(), 0);
        for i in 0..system.len() {
            assert_eq!(system.grid().cells_containing(i).len(), 1);
        }
    }

    #[test]
    fn test_density_error_diagnostics() {
        let h = FluidParams::default().smoothing_radius;
        let mut system = pair(0.5 * h, 100.0);
        system.predict_positions();
        system.compute_densities();
        let density = system.particles[0].density;

        assert!((system.average_density() - density).abs() < 1e-3);
        let error = (density - 100.0).abs() / 100.0;
        assert!((system.average_density_error() - error).abs() < 1e-5);
    }
}
