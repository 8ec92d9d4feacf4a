//! Schema types for persisting scenarios and animation traces as JSON.
//!
//! This module defines a thin, `serde`-facing representation of the two
//! on-disk documents:
//!
//! - [`ScenarioConfig`] – a full scenario snapshot: particles, forces,
//!   coherent forces, constraints, collisions and the active solver
//! - [`AnimationConfig`] + [`FrameConfig`] – an animation trace: the
//!   initial particle snapshot with the frame range, plus one document of
//!   bare locations per frame
//!
//! # JSON format
//! An example scenario document matching these types:
//!
//! ```json
//! {
//!   "particle_list": [
//!     { "location": [0.0, 0.0, 0.0], "velocity": [0.0, 0.0, 0.0], "mass": 1.0 },
//!     { "location": [4.0, 0.0, 0.0], "velocity": [0.0, 0.0, 0.0], "mass": 1.0 }
//!   ],
//!   "force_list": [
//!     { "force_name": "gravity_force" },
//!     { "force_name": "damping_force", "constant_damp": 0.5 }
//!   ],
//!   "coherent_force_list": [
//!     {
//!       "coherent_force_name": "spring_two_particle_force",
//!       "coherent_particle_list": [
//!         { "coherent_particle_idx": [0, 1], "rest_length": 4.0 }
//!       ],
//!       "spring_constant": 4.0
//!     }
//!   ],
//!   "constraint_list": [
//!     {
//!       "constraint_name": "pin_constraint",
//!       "pin_list": [ { "particle_idx": 0, "pin_location": [0.0, 0.0, 0.0] } ]
//!     }
//!   ],
//!   "collision_list": [
//!     {
//!       "collision_name": "wall_collision",
//!       "wall_location": [0.0, 0.0, -10.0],
//!       "wall_normal": [0.0, 0.0, 1.0]
//!     }
//!   ],
//!   "solver": "verlet_solver"
//! }
//! ```
//!
//! Particle references are persisted as integer indices into
//! `particle_list` and resolved back when the runtime system is built.

use serde::{Deserialize, Serialize};

/// Initial state for a single particle
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ParticleConfig {
    pub location: [f64; 3],
    pub velocity: [f64; 3],
    pub mass: f64,
}

/// Per-particle force entries, tagged by `force_name`
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "force_name")]
pub enum ForceConfig {
    #[serde(rename = "constant_force")]
    Constant { constant_force: [f64; 3] },

    #[serde(rename = "damping_force")]
    Damping { constant_damp: f64 },

    #[serde(rename = "spring_force")]
    Spring {
        constant_spring: f64,
        rest_location: [f64; 3],
    },

    #[serde(rename = "gravity_force")] // gravity constant is not persisted
    Gravity,
}

/// One spring linkage: a particle index pair and its rest length
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SpringLinkConfig {
    pub coherent_particle_idx: [usize; 2],
    pub rest_length: f64,
}

/// Coherent force entries, tagged by `coherent_force_name`
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "coherent_force_name")]
pub enum CoherentForceConfig {
    #[serde(rename = "spring_two_particle_force")]
    SpringTwoParticle {
        coherent_particle_list: Vec<SpringLinkConfig>,
        spring_constant: f64,
    },
}

/// One pinned particle and its fixed location
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PinConfig {
    pub particle_idx: usize,
    pub pin_location: [f64; 3],
}

/// Axis tag for axis constraints
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub enum AxisConfig {
    #[serde(rename = "x")]
    X,
    #[serde(rename = "y")]
    Y,
    #[serde(rename = "z")]
    Z,
}

/// One axis-constrained particle
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AxisEntryConfig {
    pub particle_idx: usize,
    pub axis: AxisConfig,
}

/// Plane tag for plane constraints
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub enum PlaneConfig {
    #[serde(rename = "xy")]
    Xy,
    #[serde(rename = "yz")]
    Yz,
    #[serde(rename = "xz")]
    Xz,
}

/// One plane-constrained particle
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PlaneEntryConfig {
    pub particle_idx: usize,
    pub plane: PlaneConfig,
}

/// Constraint entries, tagged by `constraint_name`
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "constraint_name")]
pub enum ConstraintConfig {
    #[serde(rename = "pin_constraint")]
    Pin { pin_list: Vec<PinConfig> },

    #[serde(rename = "axis_constraint")]
    Axis { axis_list: Vec<AxisEntryConfig> },

    #[serde(rename = "plane_constraint")]
    Plane { plane_list: Vec<PlaneEntryConfig> },

    #[serde(rename = "angular_constraint")]
    Angular {
        axis_particle_idx: usize,
        pair_particle_idx: [usize; 2],
        min_angle: f64,
        max_angle: f64,
    },
}

/// Collision entries, tagged by `collision_name`
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "collision_name")]
pub enum CollisionConfig {
    #[serde(rename = "wall_collision")]
    Wall {
        wall_location: [f64; 3],
        wall_normal: [f64; 3],
    },

    #[serde(rename = "particle_collision")]
    Particle,
}

/// Which solver advances the system state
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverConfig {
    #[serde(rename = "forward_euler_solver")]
    ForwardEuler,

    #[serde(rename = "second_order_rk_solver")]
    SecondOrderRk,

    #[serde(rename = "fourth_order_rk_solver")]
    FourthOrderRk,

    #[serde(rename = "verlet_solver")]
    Verlet,

    #[serde(rename = "leap_frog_solver")]
    Leapfrog,

    #[serde(rename = "backward_euler_solver")]
    BackwardEuler,
}

/// Top-level scenario snapshot document
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    pub particle_list: Vec<ParticleConfig>,
    pub force_list: Vec<ForceConfig>,
    pub coherent_force_list: Vec<CoherentForceConfig>,
    pub constraint_list: Vec<ConstraintConfig>,
    pub collision_list: Vec<CollisionConfig>,
    pub solver: SolverConfig,
}

/// `config.json` of an animation trace: the initial particle snapshot and
/// the frame range the trace covers
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnimationConfig {
    pub particle_list: Vec<ParticleConfig>,
    pub frame_start: i32,
    pub frame_end: i32,
}

/// Location of one particle within one frame document
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FrameParticleConfig {
    pub location: [f64; 3],
}

/// One `N.json` frame document: bare per-particle locations
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FrameConfig {
    pub particle_list: Vec<FrameParticleConfig>,
}
