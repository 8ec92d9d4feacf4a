//! Fixed-step time integrators for the particle system
//!
//! Every solver advances the flattened 6N state vector through
//! `get_state`/`set_state` and one or more derivative evaluations per
//! step. All are stateless across steps except `Leapfrog`, which caches
//! the half-step velocities and must be `reset()` between runs, and
//! `BackwardEuler`, which carries its fixed stiffness.

use crate::simulation::states::NState;
use crate::simulation::system::ParticleSystem;

/// The solver suite
///
/// The variants correspond one-to-one to the `solver` tag strings of the
/// persistence schema
#[derive(Debug, Clone)]
pub enum Solver {
    /// `s' = s + dt f(s)`, one derivative evaluation
    ForwardEuler,
    /// Explicit midpoint, two evaluations
    SecondOrderRk,
    /// Classical RK4, four evaluations
    FourthOrderRk,
    /// Velocity Verlet: kick-drift-kick, two evaluations
    Verlet,
    /// Leapfrog with a half-step velocity cache carried across calls
    Leapfrog { half_velocity: Option<NState> },
    /// Linear damping-only contraction `s' = s / (1 + dt k)`
    ///
    /// Not an implicit solve against the actual force function; the
    /// approximation is kept as-is
    BackwardEuler { stiffness: f64 },
}

/// Default stiffness for the backward-Euler contraction
pub const BACKWARD_EULER_STIFFNESS: f64 = 3.0;

impl Default for Solver {
    fn default() -> Self {
        Solver::ForwardEuler
    }
}

impl Solver {
    /// Advance the system by one step of size `dt`
    pub fn solve_step(&mut self, sys: &mut ParticleSystem, dt: f64) {
        if sys.particle_count() == 0 { // no particles, return
            return;
        }
        match self {
            Solver::ForwardEuler => forward_euler_step(sys, dt),
            Solver::SecondOrderRk => second_order_rk_step(sys, dt),
            Solver::FourthOrderRk => fourth_order_rk_step(sys, dt),
            Solver::Verlet => verlet_step(sys, dt),
            Solver::Leapfrog { half_velocity } => leapfrog_step(half_velocity, sys, dt),
            Solver::BackwardEuler { stiffness } => backward_euler_step(*stiffness, sys, dt),
        }
    }

    /// Clear any state carried across steps; called at the start of a run
    pub fn reset(&mut self) {
        if let Solver::Leapfrog { half_velocity } = self {
            *half_velocity = None;
        }
    }
}

/// `s_n+1 = s_n + dt f(s_n)`
fn forward_euler_step(sys: &mut ParticleSystem, dt: f64) {
    let state = sys.get_state();
    let derivative = sys.derivative_eval();
    sys.set_state(&(state + dt * derivative));
}

/// Explicit midpoint: evaluate at s_n, step half-way, re-evaluate, apply
/// the midpoint derivative over the full step from s_n
fn second_order_rk_step(sys: &mut ParticleSystem, dt: f64) {
    let origin = sys.get_state();

    let k1 = sys.derivative_eval();
    sys.set_state(&(&origin + (dt / 2.0) * k1));

    let k2 = sys.derivative_eval();
    sys.set_state(&(origin + dt * k2));
}

/// Classical RK4 with stage evaluations at s_n, the two midpoints and the
/// full step
fn fourth_order_rk_step(sys: &mut ParticleSystem, dt: f64) {
    let origin = sys.get_state();

    let k1 = sys.derivative_eval();
    sys.set_state(&(&origin + (dt / 2.0) * &k1));

    let k2 = sys.derivative_eval();
    sys.set_state(&(&origin + (dt / 2.0) * &k2));

    let k3 = sys.derivative_eval();
    sys.set_state(&(&origin + dt * &k3));

    let k4 = sys.derivative_eval();
    sys.set_state(&(origin + (dt / 6.0) * (k1 + 2.0 * k2 + 2.0 * k3 + k4)));
}

/// Velocity Verlet over the flattened state
///
/// Half-kick the velocities with a_n, drift the positions a full step with
/// v_n+1/2, re-evaluate at x_n+1, half-kick again
fn verlet_step(sys: &mut ParticleSystem, dt: f64) {
    let n = sys.particle_count();
    let half_dt = 0.5 * dt;

    let mut state = sys.get_state();
    let derivative = sys.derivative_eval();

    for i in 0..n {
        // v_n+1/2 = v_n + (dt/2) a_n
        for k in 0..3 {
            state[6 * i + 3 + k] += half_dt * derivative[6 * i + 3 + k];
        }
        // x_n+1 = x_n + dt v_n+1/2
        for k in 0..3 {
            state[6 * i + k] += dt * state[6 * i + 3 + k];
        }
    }
    sys.set_state(&state);

    // a_n+1 from x_n+1
    let derivative = sys.derivative_eval();

    // v_n+1 = v_n+1/2 + (dt/2) a_n+1
    for i in 0..n {
        for k in 0..3 {
            state[6 * i + 3 + k] += half_dt * derivative[6 * i + 3 + k];
        }
    }
    sys.set_state(&state);
}

/// Leapfrog with a persistent half-step velocity cache
///
/// The first call seeds the cache from the current velocities plus a half
/// kick; later calls full-kick the cache and derive position and stored
/// velocity from it
fn leapfrog_step(half_velocity: &mut Option<NState>, sys: &mut ParticleSystem, dt: f64) {
    let n = sys.particle_count();

    match half_velocity {
        None => {
            let mut state = sys.get_state();
            let derivative = sys.derivative_eval();

            let mut half = NState::zeros(3 * n);
            for i in 0..n {
                for k in 0..3 {
                    // v_1/2 = v_0 + (dt/2) a_0
                    half[3 * i + k] =
                        state[6 * i + 3 + k] + (dt / 2.0) * derivative[6 * i + 3 + k];
                    // stored velocity takes the full kick
                    state[6 * i + 3 + k] += dt * derivative[6 * i + 3 + k];
                    // x_1 = x_0 + dt v_1/2
                    state[6 * i + k] += dt * half[3 * i + k];
                }
            }
            sys.set_state(&state);
            *half_velocity = Some(half);
        }
        Some(half) => {
            let mut state = sys.get_state();
            let derivative = sys.derivative_eval();

            for i in 0..n {
                for k in 0..3 {
                    // v_n+1/2 = v_n-1/2 + dt a_n
                    half[3 * i + k] += dt * derivative[6 * i + 3 + k];
                    // stored velocity re-centered on the step boundary
                    state[6 * i + 3 + k] =
                        half[3 * i + k] + (dt / 2.0) * derivative[6 * i + 3 + k];
                    // x_n+1 = x_n + dt v_n+1/2
                    state[6 * i + k] += dt * half[3 * i + k];
                }
            }
            sys.set_state(&state);
        }
    }
}

/// Uniform contraction of the whole state vector
///
/// `s_n+1 = s_n / (1 + dt k)` with the fixed stiffness `k`; no implicit
/// solve is performed
fn backward_euler_step(stiffness: f64, sys: &mut ParticleSystem, dt: f64) {
    let state = sys.get_state();
    sys.set_state(&(state / (1.0 + dt * stiffness)));
}
