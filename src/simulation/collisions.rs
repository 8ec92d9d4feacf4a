//! Collision detection and response
//!
//! Collisions are projected once per frame, after post-constraints. All
//! pairwise tests are exhaustive; there is no broad phase.

use crate::simulation::params::GEOM_EPS;
use crate::simulation::states::{NVec3, Particle};

/// Closed set of collision responses, dispatched by match
///
/// `Wall` and `Particles` correspond to the `collision_name` tags of the
/// persistence schema; `Cloth` is runtime-only.
#[derive(Debug, Clone)]
pub enum Collision {
    Wall(WallCollision),
    Particles(ParticleCollision),
    Cloth(ClothCollision),
}

impl Collision {
    pub fn project_collision(&mut self, particles: &mut [Particle]) {
        match self {
            Collision::Wall(c) => c.project(particles),
            Collision::Particles(c) => c.project(particles),
            Collision::Cloth(c) => c.project(particles),
        }
    }
}

/// Infinite wall given by a point on the plane and its outward normal
///
/// A particle on the wrong side is pushed back out by twice its penetration
/// depth and has its velocity mirrored about the normal
#[derive(Debug, Clone)]
pub struct WallCollision {
    pub location: NVec3,
    pub normal: NVec3,
}

impl WallCollision {
    pub fn new(location: NVec3, normal: NVec3) -> Self {
        Self { location, normal }
    }

    fn project(&self, particles: &mut [Particle]) {
        let norm = self.normal.norm();
        if norm <= GEOM_EPS {
            log::warn!("wall collision has zero-length normal, skipping");
            return;
        }
        let n = self.normal / norm;

        for particle in particles.iter_mut() {
            let penetration = (self.location - particle.location).dot(&n);
            if penetration > 0.0 {
                particle.location += 2.0 * penetration * n;
                // v' = v - 2 (v.n) n
                particle.velocity -= 2.0 * particle.velocity.dot(&n) * n;
            }
        }
    }
}

/// Exhaustive all-pairs particle collision with elastic impulse response
///
/// Two particles collide when their squared separation is at most
/// `(mass_a + mass_b)^2`; mass doubles as the collision-radius proxy. The
/// response is a 1-D elastic impulse exchange along the line of centers
/// using the reduced-mass formula, always perfectly elastic.
#[derive(Debug, Clone, Default)]
pub struct ParticleCollision;

impl ParticleCollision {
    pub fn new() -> Self {
        Self
    }

    fn project(&self, particles: &mut [Particle]) {
        let n = particles.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let d = particles[i].location - particles[j].location;
                let radius_sum = particles[i].mass + particles[j].mass;
                if d.norm_squared() > radius_sum * radius_sum {
                    continue;
                }

                let len = d.norm();
                if len <= GEOM_EPS {
                    log::warn!(
                        "colliding particles {} and {} coincide, skipping impulse",
                        i,
                        j
                    );
                    continue;
                }
                let normal = d / len;

                let mass_i = particles[i].mass;
                let mass_j = particles[j].mass;
                let relative = particles[i].velocity - particles[j].velocity;

                // Reduced-mass impulse along the line of centers
                let impulse = 2.0 * normal.dot(&relative) / (1.0 / mass_i + 1.0 / mass_j);
                particles[i].velocity -= (impulse / mass_i) * normal;
                particles[j].velocity += (impulse / mass_j) * normal;
            }
        }
    }
}

/// Self-collision against a triangulated rest shape
///
/// Unfinished: captures the rest shape on its first invocation and
/// refreshes the working snapshot every frame, but performs no triangle
/// intersection test yet. Not part of the persistence schema.
#[derive(Debug, Clone, Default)]
pub struct ClothCollision {
    rest_shape: Option<Vec<NVec3>>,
    snapshot: Vec<NVec3>,
}

impl ClothCollision {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rest_shape(&self) -> Option<&[NVec3]> {
        self.rest_shape.as_deref()
    }

    fn project(&mut self, particles: &mut [Particle]) {
        if self.rest_shape.is_none() {
            self.rest_shape = Some(particles.iter().map(|p| p.location).collect());
        }
        self.snapshot = particles.iter().map(|p| p.location).collect();
        // TODO triangle-triangle intersection response against rest_shape
    }
}
