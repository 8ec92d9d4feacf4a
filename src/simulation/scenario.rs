//! Build fully-initialized particle systems from configuration
//!
//! Takes a `ScenarioConfig` (JSON-facing) and produces a runtime
//! [`ParticleSystem`] with all particle references resolved to list
//! indices, and maps a runtime system back into a `ScenarioConfig` for
//! saving. Also provides the mass-spring grid builder, a cloth-like
//! scenario composed purely from the public construction calls.

use crate::configuration::config::{
    AxisConfig, CoherentForceConfig, CollisionConfig, ConstraintConfig, ForceConfig,
    ParticleConfig, PinConfig, PlaneConfig, ScenarioConfig, SolverConfig, SpringLinkConfig,
    AxisEntryConfig, PlaneEntryConfig,
};
use crate::error::SimError;
use crate::simulation::collisions::{Collision, ParticleCollision, WallCollision};
use crate::simulation::constraints::{
    AngularConstraint, Axis, AxisConstraint, Constraint, PinConstraint, PlaneConstraint,
    PlaneMask,
};
use crate::simulation::forces::{Force, SpringPairForce};
use crate::simulation::integrator::{Solver, BACKWARD_EULER_STIFFNESS};
use crate::simulation::params::DEFAULT_GRAVITY;
use crate::simulation::states::{NVec3, Particle};
use crate::simulation::system::ParticleSystem;

fn vec3(v: [f64; 3]) -> NVec3 {
    NVec3::new(v[0], v[1], v[2])
}

fn arr3(v: &NVec3) -> [f64; 3] {
    [v.x, v.y, v.z]
}

fn check_idx(index: usize, count: usize) -> Result<usize, SimError> {
    if index < count {
        Ok(index)
    } else {
        Err(SimError::ParticleOutOfRange { index, count })
    }
}

/// Build a runtime system from a scenario snapshot
///
/// Every persisted particle index is validated against the particle list;
/// the first invalid reference fails the whole build, leaving no partially
/// constructed state behind
pub fn build_system(cfg: &ScenarioConfig) -> Result<ParticleSystem, SimError> {
    let mut sys = ParticleSystem::new();
    let count = cfg.particle_list.len();

    for pc in &cfg.particle_list {
        sys.add_particle(vec3(pc.location), vec3(pc.velocity), pc.mass);
    }

    for fc in &cfg.force_list {
        sys.add_force(match fc {
            ForceConfig::Constant { constant_force } => Force::Constant {
                force: vec3(*constant_force),
            },
            ForceConfig::Damping { constant_damp } => Force::Damping {
                damping: *constant_damp,
            },
            ForceConfig::Spring {
                constant_spring,
                rest_location,
            } => Force::Spring {
                stiffness: *constant_spring,
                anchor: vec3(*rest_location),
            },
            ForceConfig::Gravity => Force::Gravity {
                gravity: DEFAULT_GRAVITY,
            },
        });
    }

    for cfc in &cfg.coherent_force_list {
        match cfc {
            CoherentForceConfig::SpringTwoParticle {
                coherent_particle_list,
                spring_constant,
            } => {
                let mut force = SpringPairForce::new(*spring_constant);
                for link in coherent_particle_list {
                    let a = check_idx(link.coherent_particle_idx[0], count)?;
                    let b = check_idx(link.coherent_particle_idx[1], count)?;
                    force.add_link(a, b, link.rest_length);
                }
                sys.add_coherent_force(force);
            }
        }
    }

    for cc in &cfg.constraint_list {
        let constraint = match cc {
            ConstraintConfig::Pin { pin_list } => {
                let mut pin = PinConstraint::new();
                for entry in pin_list {
                    pin.add_pin(
                        check_idx(entry.particle_idx, count)?,
                        vec3(entry.pin_location),
                    );
                }
                Constraint::Pin(pin)
            }
            ConstraintConfig::Axis { axis_list } => {
                let mut axis = AxisConstraint::new();
                for entry in axis_list {
                    let tag = match entry.axis {
                        AxisConfig::X => Axis::X,
                        AxisConfig::Y => Axis::Y,
                        AxisConfig::Z => Axis::Z,
                    };
                    axis.add_axis(check_idx(entry.particle_idx, count)?, tag);
                }
                Constraint::Axis(axis)
            }
            ConstraintConfig::Plane { plane_list } => {
                let mut plane = PlaneConstraint::new();
                for entry in plane_list {
                    let tag = match entry.plane {
                        PlaneConfig::Xy => PlaneMask::Xy,
                        PlaneConfig::Yz => PlaneMask::Yz,
                        PlaneConfig::Xz => PlaneMask::Xz,
                    };
                    plane.add_plane(check_idx(entry.particle_idx, count)?, tag);
                }
                Constraint::Plane(plane)
            }
            ConstraintConfig::Angular {
                axis_particle_idx,
                pair_particle_idx,
                min_angle,
                max_angle,
            } => Constraint::Angular(AngularConstraint::new(
                check_idx(*axis_particle_idx, count)?,
                (
                    check_idx(pair_particle_idx[0], count)?,
                    check_idx(pair_particle_idx[1], count)?,
                ),
                *min_angle,
                *max_angle,
            )),
        };
        sys.add_constraint(constraint);
    }

    for col in &cfg.collision_list {
        sys.add_collision(match col {
            CollisionConfig::Wall {
                wall_location,
                wall_normal,
            } => Collision::Wall(WallCollision::new(vec3(*wall_location), vec3(*wall_normal))),
            CollisionConfig::Particle => Collision::Particles(ParticleCollision::new()),
        });
    }

    sys.solver = match cfg.solver {
        SolverConfig::ForwardEuler => Solver::ForwardEuler,
        SolverConfig::SecondOrderRk => Solver::SecondOrderRk,
        SolverConfig::FourthOrderRk => Solver::FourthOrderRk,
        SolverConfig::Verlet => Solver::Verlet,
        SolverConfig::Leapfrog => Solver::Leapfrog { half_velocity: None },
        SolverConfig::BackwardEuler => Solver::BackwardEuler {
            stiffness: BACKWARD_EULER_STIFFNESS,
        },
    };

    Ok(sys)
}

/// Snapshot a runtime system into the scenario schema
///
/// The particle list is taken from the initial copies, so the snapshot
/// captures the scenario's start state rather than whatever frame the live
/// particles last reached
pub fn snapshot_system(sys: &ParticleSystem) -> ScenarioConfig {
    let particle_list = sys
        .init_particles()
        .iter()
        .map(|p: &Particle| ParticleConfig {
            location: arr3(&p.location),
            velocity: arr3(&p.velocity),
            mass: p.mass,
        })
        .collect();

    let force_list = sys
        .forces()
        .iter()
        .map(|f| match f {
            Force::Constant { force } => ForceConfig::Constant {
                constant_force: arr3(force),
            },
            Force::Damping { damping } => ForceConfig::Damping {
                constant_damp: *damping,
            },
            Force::Spring { stiffness, anchor } => ForceConfig::Spring {
                constant_spring: *stiffness,
                rest_location: arr3(anchor),
            },
            Force::Gravity { .. } => ForceConfig::Gravity,
        })
        .collect();

    let coherent_force_list = sys
        .coherent_forces()
        .iter()
        .map(|f| CoherentForceConfig::SpringTwoParticle {
            coherent_particle_list: f
                .links()
                .iter()
                .map(|l| SpringLinkConfig {
                    coherent_particle_idx: [l.a, l.b],
                    rest_length: l.rest_length,
                })
                .collect(),
            spring_constant: f.stiffness,
        })
        .collect();

    let constraint_list = sys
        .constraints()
        .iter()
        .map(|c| match c {
            Constraint::Pin(pin) => ConstraintConfig::Pin {
                pin_list: pin
                    .pins()
                    .iter()
                    .map(|(idx, loc)| PinConfig {
                        particle_idx: *idx,
                        pin_location: arr3(loc),
                    })
                    .collect(),
            },
            Constraint::Axis(axis) => ConstraintConfig::Axis {
                axis_list: axis
                    .axes()
                    .iter()
                    .map(|(idx, a)| AxisEntryConfig {
                        particle_idx: *idx,
                        axis: match a {
                            Axis::X => AxisConfig::X,
                            Axis::Y => AxisConfig::Y,
                            Axis::Z => AxisConfig::Z,
                        },
                    })
                    .collect(),
            },
            Constraint::Plane(plane) => ConstraintConfig::Plane {
                plane_list: plane
                    .planes()
                    .iter()
                    .map(|(idx, p)| PlaneEntryConfig {
                        particle_idx: *idx,
                        plane: match p {
                            PlaneMask::Xy => PlaneConfig::Xy,
                            PlaneMask::Yz => PlaneConfig::Yz,
                            PlaneMask::Xz => PlaneConfig::Xz,
                        },
                    })
                    .collect(),
            },
            Constraint::Angular(ang) => ConstraintConfig::Angular {
                axis_particle_idx: ang.pivot,
                pair_particle_idx: [ang.pair.0, ang.pair.1],
                min_angle: ang.min_angle,
                max_angle: ang.max_angle,
            },
        })
        .collect();

    // The cloth stub is runtime-only and has no schema entry
    let collision_list = sys
        .collisions()
        .iter()
        .filter_map(|c| match c {
            Collision::Wall(w) => Some(CollisionConfig::Wall {
                wall_location: arr3(&w.location),
                wall_normal: arr3(&w.normal),
            }),
            Collision::Particles(_) => Some(CollisionConfig::Particle),
            Collision::Cloth(_) => None,
        })
        .collect();

    let solver = match sys.solver {
        Solver::ForwardEuler => SolverConfig::ForwardEuler,
        Solver::SecondOrderRk => SolverConfig::SecondOrderRk,
        Solver::FourthOrderRk => SolverConfig::FourthOrderRk,
        Solver::Verlet => SolverConfig::Verlet,
        Solver::Leapfrog { .. } => SolverConfig::Leapfrog,
        Solver::BackwardEuler { .. } => SolverConfig::BackwardEuler,
    };

    ScenarioConfig {
        particle_list,
        force_list,
        coherent_force_list,
        constraint_list,
        collision_list,
        solver,
    }
}

// =========================================================================
// Mass-spring grid builder
// =========================================================================

/// Cloth-like grid of particles tied together by spring linkages
///
/// Structural springs connect horizontal and vertical neighbors; `shear`
/// adds diagonal springs at `rest_length * sqrt(2)` and `flexion` adds
/// skip-one springs at `2 * rest_length`. The two top corners are pinned
/// at their rest locations, and gravity plus damping act on every
/// particle.
#[derive(Debug, Clone)]
pub struct MassSpringGrid {
    pub rows: usize,
    pub cols: usize,
    pub spacing: f64,
    pub stiffness: f64,
    pub rest_length: f64,
    pub shear: bool,
    pub flexion: bool,
}

impl Default for MassSpringGrid {
    fn default() -> Self {
        Self {
            rows: 7,
            cols: 7,
            spacing: 3.0,
            stiffness: 0.2,
            rest_length: 4.0,
            shear: false,
            flexion: false,
        }
    }
}

impl MassSpringGrid {
    fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    fn location(&self, row: usize, col: usize) -> NVec3 {
        NVec3::new(self.spacing * col as f64, 0.0, -self.spacing * row as f64)
    }

    /// Assemble the grid into a fresh system using only the public
    /// construction calls
    pub fn build(&self) -> ParticleSystem {
        let mut sys = ParticleSystem::new();

        for i in 0..self.rows {
            for j in 0..self.cols {
                sys.add_particle(self.location(i, j), NVec3::zeros(), 1.0);
            }
        }

        // Top corners hold the cloth up
        let mut pin = PinConstraint::new();
        pin.add_pin(self.index(0, 0), self.location(0, 0));
        pin.add_pin(self.index(0, self.cols - 1), self.location(0, self.cols - 1));
        sys.add_constraint(Constraint::Pin(pin));

        // Structural springs, each neighbor edge registered once
        let mut structural = SpringPairForce::new(self.stiffness);
        for i in 0..self.rows {
            for j in 0..self.cols {
                if j + 1 < self.cols {
                    structural.add_link(self.index(i, j), self.index(i, j + 1), self.rest_length);
                }
                if i + 1 < self.rows {
                    structural.add_link(self.index(i, j), self.index(i + 1, j), self.rest_length);
                }
            }
        }
        sys.add_coherent_force(structural);

        if self.shear {
            let shear_rest = self.rest_length * std::f64::consts::SQRT_2;
            let mut shear = SpringPairForce::new(self.stiffness);
            for i in 0..self.rows.saturating_sub(1) {
                for j in 0..self.cols {
                    if j + 1 < self.cols {
                        shear.add_link(self.index(i, j), self.index(i + 1, j + 1), shear_rest);
                    }
                    if j > 0 {
                        shear.add_link(self.index(i, j), self.index(i + 1, j - 1), shear_rest);
                    }
                }
            }
            sys.add_coherent_force(shear);
        }

        if self.flexion {
            let flexion_rest = 2.0 * self.rest_length;
            let mut flexion = SpringPairForce::new(self.stiffness);
            for i in 0..self.rows {
                for j in 0..self.cols {
                    if j + 2 < self.cols {
                        flexion.add_link(self.index(i, j), self.index(i, j + 2), flexion_rest);
                    }
                    if i + 2 < self.rows {
                        flexion.add_link(self.index(i, j), self.index(i + 2, j), flexion_rest);
                    }
                }
            }
            sys.add_coherent_force(flexion);
        }

        sys.add_force(Force::Gravity {
            gravity: DEFAULT_GRAVITY,
        });
        sys.add_force(Force::Damping { damping: 0.5 });

        sys
    }
}
