//! Particle system orchestrator
//!
//! `ParticleSystem` owns the particles, force/constraint/collision lists
//! and the active solver. It assembles and disassembles the flattened 6N
//! state vector, implements the derivative evaluation the solvers call
//! into, and drives the per-frame simulation loop.

use crate::error::SimError;
use crate::simulation::collisions::Collision;
use crate::simulation::constraints::{Constraint, ConstraintPhase};
use crate::simulation::forces::{Force, SpringPairForce};
use crate::simulation::integrator::Solver;
use crate::simulation::params::{DEFAULT_FRAME_END, DEFAULT_FRAME_START};
use crate::simulation::states::{NState, NVec3, Particle};

/// Owns all simulation state and runs the frame loop
///
/// Particle identity is the insertion-ordered index into `particles`;
/// forces, constraints and collisions store indices, never copies. The
/// live list and the initial-snapshot list always have equal length.
pub struct ParticleSystem {
    particles: Vec<Particle>,
    init_particles: Vec<Particle>,
    forces: Vec<Force>,
    coherent_forces: Vec<SpringPairForce>,
    constraints: Vec<Constraint>,
    collisions: Vec<Collision>,
    pub solver: Solver,
    pub frame_start: i32,
    pub frame_end: i32,
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            init_particles: Vec::new(),
            forces: Vec::new(),
            coherent_forces: Vec::new(),
            constraints: Vec::new(),
            collisions: Vec::new(),
            solver: Solver::default(),
            frame_start: DEFAULT_FRAME_START,
            frame_end: DEFAULT_FRAME_END,
        }
    }

    // =====================================================================
    // Scenario construction
    // =====================================================================

    /// Append a particle to both the live and the initial list
    ///
    /// Returns the new particle's index, the stable identity every other
    /// entity uses to refer to it
    pub fn add_particle(&mut self, location: NVec3, velocity: NVec3, mass: f64) -> usize {
        let index = self.particles.len();
        self.particles.push(Particle::new(location, velocity, mass));
        self.init_particles.push(Particle::new(location, velocity, mass));
        index
    }

    /// Remove a particle from both lists
    ///
    /// Fails while any coherent force or constraint still references the
    /// index; on success every stored index above the removed one is
    /// shifted down so existing references stay valid
    pub fn remove_particle(&mut self, index: usize) -> Result<(), SimError> {
        if index >= self.particles.len() {
            return Err(SimError::ParticleOutOfRange {
                index,
                count: self.particles.len(),
            });
        }
        let referenced = self.coherent_forces.iter().any(|f| f.references(index))
            || self.constraints.iter().any(|c| c.references(index));
        if referenced {
            return Err(SimError::ParticleReferenced { index });
        }

        self.particles.remove(index);
        self.init_particles.remove(index);
        for force in &mut self.coherent_forces {
            force.reindex_removed(index);
        }
        for constraint in &mut self.constraints {
            constraint.reindex_removed(index);
        }
        Ok(())
    }

    pub fn add_force(&mut self, force: Force) -> &mut Force {
        let index = self.forces.len();
        self.forces.push(force);
        &mut self.forces[index]
    }

    pub fn add_coherent_force(&mut self, force: SpringPairForce) -> &mut SpringPairForce {
        let index = self.coherent_forces.len();
        self.coherent_forces.push(force);
        &mut self.coherent_forces[index]
    }

    pub fn add_constraint(&mut self, constraint: Constraint) -> &mut Constraint {
        let index = self.constraints.len();
        self.constraints.push(constraint);
        &mut self.constraints[index]
    }

    pub fn add_collision(&mut self, collision: Collision) -> &mut Collision {
        let index = self.collisions.len();
        self.collisions.push(collision);
        &mut self.collisions[index]
    }

    // =====================================================================
    // Accessors
    // =====================================================================

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn init_particles(&self) -> &[Particle] {
        &self.init_particles
    }

    /// Mutable handle to a particle's initial copy, for reconfiguring the
    /// start state of an existing scenario
    pub fn init_particle_mut(&mut self, index: usize) -> &mut Particle {
        &mut self.init_particles[index]
    }

    pub fn forces(&self) -> &[Force] {
        &self.forces
    }

    pub fn coherent_forces(&self) -> &[SpringPairForce] {
        &self.coherent_forces
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    // =====================================================================
    // State vector
    // =====================================================================

    /// Dimension of the flattened state vector
    pub fn state_dim(&self) -> usize {
        6 * self.particles.len()
    }

    /// Flatten all particles into a 6N state vector, particle-major
    pub fn get_state(&self) -> NState {
        let mut state = NState::zeros(self.state_dim());
        for (i, particle) in self.particles.iter().enumerate() {
            for k in 0..3 {
                state[6 * i + k] = particle.location[k];
                state[6 * i + 3 + k] = particle.velocity[k];
            }
        }
        state
    }

    /// Write a 6N state vector back into the particles
    pub fn set_state(&mut self, state: &NState) {
        for (i, particle) in self.particles.iter_mut().enumerate() {
            for k in 0..3 {
                particle.location[k] = state[6 * i + k];
                particle.velocity[k] = state[6 * i + 3 + k];
            }
        }
    }

    /// Evaluate d(state)/dt for the current particle state
    ///
    /// Clears every accumulator, applies per-particle forces, coherent
    /// forces and `pre` constraints in that order, then reads off
    /// `(velocity, force/mass)` per particle. Pre-constraints mutate
    /// velocity/force/location directly so the solver never sees the
    /// removed degrees of freedom.
    pub fn derivative_eval(&mut self) -> NState {
        for particle in &mut self.particles {
            particle.clear_force();
        }

        for force in &self.forces {
            for particle in &mut self.particles {
                force.apply(particle);
            }
        }

        for coherent in &self.coherent_forces {
            coherent.apply(&mut self.particles);
        }

        for constraint in &self.constraints {
            if constraint.phase() == ConstraintPhase::Pre {
                constraint.apply(&mut self.particles);
            }
        }

        let mut derivative = NState::zeros(self.state_dim());
        for (i, particle) in self.particles.iter().enumerate() {
            let (velocity, acceleration) = particle.derivative_eval();
            for k in 0..3 {
                derivative[6 * i + k] = velocity[k];
                derivative[6 * i + 3 + k] = acceleration[k];
            }
        }
        derivative
    }

    // =====================================================================
    // Frame loop
    // =====================================================================

    /// Restore the live particles from the initial snapshot
    pub fn reset_particles(&mut self) {
        self.particles = self.init_particles.clone();
    }

    /// Run the configured frame range and return per-frame locations
    ///
    /// Each frame: solver step, then `post` constraints, then collision
    /// projection. The order is load-bearing.
    pub fn run_frames(&mut self, dt: f64) -> Vec<Vec<NVec3>> {
        self.reset_particles();

        // The solver is taken out for the duration of the run so it can
        // borrow the system mutably inside solve_step
        let mut solver = std::mem::take(&mut self.solver);
        solver.reset();

        let frame_count = (self.frame_end - self.frame_start).max(0) as usize;
        let mut frames = Vec::with_capacity(frame_count);

        for _frame in self.frame_start..self.frame_end {
            solver.solve_step(self, dt);

            for constraint in &self.constraints {
                if constraint.phase() == ConstraintPhase::Post {
                    constraint.apply(&mut self.particles);
                }
            }

            for collision in &mut self.collisions {
                collision.project_collision(&mut self.particles);
            }

            frames.push(self.particles.iter().map(|p| p.location).collect());
        }

        self.solver = solver;
        frames
    }
}
