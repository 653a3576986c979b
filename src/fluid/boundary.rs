//! Wall collisions for the square simulation domain.

use bevy::prelude::*;

use super::params::{FluidParams, BOUNDARY_RESTITUTION, DOMAIN_HALF_EXTENT};

/// Axis-aligned square container centered on the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxBoundary {
    /// Walls sit at `±half_extent` on both axes.
    pub half_extent: f32,
    /// Restitution coefficient for collisions (0 = no bounce, 1 = perfect bounce).
    pub restitution: f32,
}

impl Default for BoxBoundary {
    fn default() -> Self {
        Self {
            half_extent: DOMAIN_HALF_EXTENT,
            restitution: BOUNDARY_RESTITUTION,
        }
    }
}

impl BoxBoundary {
    /// The fixed container used by every simulation.
    pub fn domain() -> Self {
        Self::default()
    }

    /// Innermost center coordinate for a particle of the given radius.
    pub fn limit(&self, particle_radius: f32) -> f32 {
        self.half_extent - particle_radius
    }

    /// Check if a particle center is inside the walls.
    pub fn contains(&self, point: Vec2, particle_radius: f32) -> bool {
        let limit = self.limit(particle_radius);
        point.x.abs() <= limit && point.y.abs() <= limit
    }

    /// Clamp a particle back inside the walls and bounce the velocity component
    /// of every axis that hit a wall.
    pub fn apply_collision(&self, position: &mut Vec2, velocity: &mut Vec2, particle_radius: f32) {
        let limit = self.limit(particle_radius);
        for axis in 0..2 {
            if position[axis] < -limit {
                position[axis] = -limit;
                velocity[axis] = -velocity[axis] * self.restitution;
            }
            if position[axis] > limit {
                position[axis] = limit;
                velocity[axis] = -velocity[axis] * self.restitution;
            }
        }
    }

    /// Same as [`BoxBoundary::apply_collision`] with the configured radius.
    pub fn resolve(&self, position: &mut Vec2, velocity: &mut Vec2, params: &FluidParams) {
        self.apply_collision(position, velocity, params.particle_radius);
    }
}
