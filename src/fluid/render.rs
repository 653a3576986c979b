//! Presentation-side views of the particle state.
//!
//! Nothing here touches the GPU. The host copies [`ParticleInstance`]s into
//! whatever vertex or storage buffer it draws from.

use bevy::prelude::*;

use super::params::MAX_SPEED;
use super::particle::Particle;

/// Color for a particle moving at `speed`: blue at rest, green at half the
/// speed cap, red at the cap.
pub fn velocity_to_color(speed: f32) -> Color {
    let t = (speed / MAX_SPEED).clamp(0.0, 1.0);
    Color::srgb(t, 1.0 - (t - 0.5).abs(), 1.0 - t)
}

/// Per-particle instance data, laid out for direct upload.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleInstance {
    /// Center (xy).
    pub position: [f32; 2],
    /// Draw radius.
    pub radius: f32,
    /// Padding for 16-byte alignment.
    pub _padding: f32,
    /// Color (rgba, sRGB).
    pub color: [f32; 4],
}

impl ParticleInstance {
    pub fn new(particle: &Particle, radius: f32) -> Self {
        let color = velocity_to_color(particle.velocity.length()).to_srgba();
        Self {
            position: particle.position.to_array(),
            radius,
            _padding: 0.0,
            color: [color.red, color.green, color.blue, color.alpha],
        }
    }
}

/// Build one instance per particle, in particle order.
pub fn build_instances(particles: &[Particle], radius: f32) -> Vec<ParticleInstance> {
    particles
        .iter()
        .map(|particle| ParticleInstance::new(particle, radius))
        .collect()
}
