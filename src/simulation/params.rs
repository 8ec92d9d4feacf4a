//! Default numerical parameters for the simulation
//!
//! Frame-range and step-size defaults match the values the host
//! application drives the engine with; `GEOM_EPS` is the floor below
//! which a vector length or angle counts as degenerate.

pub const DEFAULT_TIME_STEP: f64 = 0.05; // fixed per-frame step size
pub const DEFAULT_GRAVITY: f64 = 9.8; // gravitational acceleration, -z
pub const DEFAULT_FRAME_START: i32 = 1;
pub const DEFAULT_FRAME_END: i32 = 250;

/// Lengths/angles below this are treated as degenerate and skipped
pub const GEOM_EPS: f64 = 1e-9;
