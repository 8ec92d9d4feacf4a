//! Core state types for the particle simulation
//!
//! Defines the point-mass `Particle` record and the vector aliases used
//! throughout the engine:
//! - `NVec3`  for per-particle locations, velocities and forces
//! - `NState` for the flattened 6N state vector consumed by the solvers
//!
//! The flattened layout is particle-major: `[loc.x, loc.y, loc.z,
//! vel.x, vel.y, vel.z]` per particle, in particle index order.

use nalgebra::{DVector, Vector3};
pub type NVec3 = Vector3<f64>;
pub type NState = DVector<f64>;

/// A point mass
///
/// `force` is a transient accumulator: it is cleared at the start of every
/// derivative evaluation and has no meaning outside of one
#[derive(Debug, Clone)]
pub struct Particle {
    pub location: NVec3, // position
    pub velocity: NVec3, // velocity
    pub force: NVec3, // accumulator, valid only within one derivative evaluation
    pub mass: f64, // mass, > 0
}

impl Particle {
    pub fn new(location: NVec3, velocity: NVec3, mass: f64) -> Self {
        Self {
            location,
            velocity,
            force: NVec3::zeros(),
            mass,
        }
    }

    /// Zero the force accumulator at the start of a derivative evaluation
    pub fn clear_force(&mut self) {
        self.force = NVec3::zeros();
    }

    /// Accumulate a force contribution
    pub fn apply_force(&mut self, force: NVec3) {
        self.force += force;
    }

    /// Per-particle derivative: d(location)/dt and d(velocity)/dt
    pub fn derivative_eval(&self) -> (NVec3, NVec3) {
        (self.velocity, self.force / self.mass)
    }
}
