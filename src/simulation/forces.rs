//! Force contributors for the particle engine
//!
//! Two families feed the accumulator during a derivative evaluation:
//! - [`Force`]: per-particle forces, stateless with respect to every other
//!   particle, applied to each particle in turn
//! - [`SpringPairForce`]: a coherent force acting on registered particle
//!   pairs, applied once per evaluation over its own link list

use crate::simulation::params::GEOM_EPS;
use crate::simulation::states::{NVec3, Particle};

/// Per-particle force laws
///
/// The set is closed: the variants correspond one-to-one to the
/// `force_name` tags of the persistence schema
#[derive(Debug, Clone)]
pub enum Force {
    /// Fixed contribution `k`, independent of particle state
    Constant { force: NVec3 },
    /// `F = -c v`: opposes motion, dissipative for c >= 0
    Damping { damping: f64 },
    /// `F = k (x0 - x)`: Hookean pull toward a fixed anchor
    Spring { stiffness: f64, anchor: NVec3 },
    /// `F = (0, 0, -m g)`
    Gravity { gravity: f64 },
}

impl Force {
    /// Add this force's contribution to the particle's accumulator
    pub fn apply(&self, particle: &mut Particle) {
        match self {
            Force::Constant { force } => {
                particle.apply_force(*force);
            }
            Force::Damping { damping } => {
                let damped = -*damping * particle.velocity;
                particle.apply_force(damped);
            }
            Force::Spring { stiffness, anchor } => {
                let pull = *stiffness * (*anchor - particle.location);
                particle.apply_force(pull);
            }
            Force::Gravity { gravity } => {
                let weight = NVec3::new(0.0, 0.0, -particle.mass * *gravity);
                particle.apply_force(weight);
            }
        }
    }
}

/// One spring linkage between two particles, identified by index
#[derive(Debug, Clone, Copy)]
pub struct SpringLink {
    pub a: usize,
    pub b: usize,
    pub rest_length: f64,
}

/// Coherent spring force over a list of particle pairs
///
/// For each link with rest length `r` and separation `d = loc_a - loc_b`,
/// the force on `a` is `k (r - |d|) d/|d|` and the force on `b` its exact
/// negation, so every link contributes zero net momentum
#[derive(Debug, Clone)]
pub struct SpringPairForce {
    pub stiffness: f64,
    links: Vec<SpringLink>,
}

impl SpringPairForce {
    pub fn new(stiffness: f64) -> Self {
        Self {
            stiffness,
            links: Vec::new(),
        }
    }

    /// Register a spring between particles `a` and `b`
    pub fn add_link(&mut self, a: usize, b: usize, rest_length: f64) {
        self.links.push(SpringLink { a, b, rest_length });
    }

    pub fn links(&self) -> &[SpringLink] {
        &self.links
    }

    /// True if any link references the given particle index
    pub fn references(&self, index: usize) -> bool {
        self.links.iter().any(|l| l.a == index || l.b == index)
    }

    /// Shift link indices down after the removal of `removed`
    ///
    /// Caller guarantees no link still references `removed` itself
    pub fn reindex_removed(&mut self, removed: usize) {
        for link in &mut self.links {
            if link.a > removed {
                link.a -= 1;
            }
            if link.b > removed {
                link.b -= 1;
            }
        }
    }

    /// Apply every link once, accumulating into both endpoints
    pub fn apply(&self, particles: &mut [Particle]) {
        for link in &self.links {
            let d = particles[link.a].location - particles[link.b].location;
            let len = d.norm();
            if len <= GEOM_EPS {
                // Coincident endpoints leave the spring direction undefined
                log::warn!(
                    "spring link {}-{} has zero length, skipping contribution",
                    link.a,
                    link.b
                );
                continue;
            }

            // F = k (r - |d|) d/|d|
            let spring_force = self.stiffness * (link.rest_length - len) * (d / len);

            // Equal and opposite on the two endpoints
            particles[link.a].apply_force(spring_force);
            particles[link.b].apply_force(-spring_force);
        }
    }
}
