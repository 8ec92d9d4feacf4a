use std::time::Instant;

use crate::simulation::collisions::{Collision, ParticleCollision};
use crate::simulation::forces::{Force, SpringPairForce};
use crate::simulation::integrator::Solver;
use crate::simulation::params::DEFAULT_TIME_STEP;
use crate::simulation::states::NVec3;
use crate::simulation::system::ParticleSystem;

/// Helper to build a chained system of size `n`
///
/// Deterministic positions, no rand needed; consecutive particles are
/// linked by springs so the coherent pass has real work to do
fn make_system(n: usize) -> ParticleSystem {
    let mut sys = ParticleSystem::new();

    for i in 0..n {
        let i_f = i as f64;
        let location = NVec3::new(
            (i_f * 0.37).sin() * 5.0,
            (i_f * 0.13).cos() * 5.0,
            (i_f * 0.07).sin() * 5.0,
        );
        sys.add_particle(location, NVec3::zeros(), 1.0);
    }

    let mut chain = SpringPairForce::new(4.0);
    for i in 1..n {
        chain.add_link(i - 1, i, 1.0);
    }
    sys.add_coherent_force(chain);

    sys.add_force(Force::Gravity { gravity: 9.8 });
    sys.add_force(Force::Damping { damping: 0.5 });

    sys
}

/// Time one derivative evaluation for a range of system sizes
pub fn bench_derivative() {
    let ns = [200, 400, 800, 1600, 3200, 6400];

    for n in ns {
        let mut sys = make_system(n);

        // Warm up
        let _ = sys.derivative_eval();

        let t0 = Instant::now();
        let _ = sys.derivative_eval();
        let dt_eval = t0.elapsed().as_secs_f64();

        println!("N = {n:5}, derivative eval = {:8.6} s", dt_eval);
    }
}

/// Time the exhaustive all-pairs collision scan for a range of sizes
pub fn bench_collision() {
    let ns = [200, 400, 800, 1600, 3200];

    for n in ns {
        let mut sys = make_system(n);
        let mut collision = Collision::Particles(ParticleCollision::new());

        // Warm up
        {
            let mut particles = sys.particles().to_vec();
            collision.project_collision(&mut particles);
        }

        let mut particles = sys.particles().to_vec();
        let t0 = Instant::now();
        collision.project_collision(&mut particles);
        let dt_scan = t0.elapsed().as_secs_f64();

        // Full frame for comparison: one solver step on the same system
        let mut solver = Solver::Verlet;
        let t1 = Instant::now();
        solver.solve_step(&mut sys, DEFAULT_TIME_STEP);
        let dt_step = t1.elapsed().as_secs_f64();

        println!(
            "N = {n:5}, collision scan = {:8.6} s, verlet step = {:8.6} s",
            dt_scan, dt_step
        );
    }
}

/// Per-step cost of every solver over a fixed-size chain
/// Paste output directly into a spreadsheet to graph
pub fn bench_solver_curve() {
    println!("solver,step_ms");

    let solvers: [(&str, Solver); 6] = [
        ("forward_euler", Solver::ForwardEuler),
        ("second_order_rk", Solver::SecondOrderRk),
        ("fourth_order_rk", Solver::FourthOrderRk),
        ("verlet", Solver::Verlet),
        ("leapfrog", Solver::Leapfrog { half_velocity: None }),
        ("backward_euler", Solver::BackwardEuler { stiffness: 3.0 }),
    ];

    let steps = 50;
    for (name, solver) in solvers {
        let mut sys = make_system(1600);
        let mut solver = solver;
        solver.reset();

        // Warm up one step
        solver.solve_step(&mut sys, DEFAULT_TIME_STEP);

        let t0 = Instant::now();
        for _ in 0..steps {
            solver.solve_step(&mut sys, DEFAULT_TIME_STEP);
        }
        let ms = t0.elapsed().as_secs_f64() * 1000.0 / steps as f64;

        println!("{},{:.6}", name, ms);
    }
}
