pub mod simulation;
pub mod configuration;
pub mod benchmark;
pub mod error;

pub use simulation::states::{NState, NVec3, Particle};
pub use simulation::forces::{Force, SpringLink, SpringPairForce};
pub use simulation::constraints::{
    AngularConstraint, Axis, AxisConstraint, Constraint, ConstraintPhase, PinConstraint,
    PlaneConstraint, PlaneMask,
};
pub use simulation::collisions::{ClothCollision, Collision, ParticleCollision, WallCollision};
pub use simulation::integrator::Solver;
pub use simulation::system::ParticleSystem;
pub use simulation::scenario::{build_system, snapshot_system, MassSpringGrid};
pub use simulation::params::{DEFAULT_FRAME_END, DEFAULT_FRAME_START, DEFAULT_GRAVITY, DEFAULT_TIME_STEP};

pub use configuration::config::{AnimationConfig, FrameConfig, ScenarioConfig, SolverConfig};
pub use configuration::persist::{load_animation, load_init, save_animation, save_init, AnimationTrace};

pub use error::SimError;

pub use benchmark::benchmark::{bench_collision, bench_derivative, bench_solver_curve};
