use pdsim::simulation::scenario::{build_system, snapshot_system, MassSpringGrid};
use pdsim::simulation::states::{NVec3, Particle};
use pdsim::simulation::system::ParticleSystem;
use pdsim::{
    AngularConstraint, Axis, AxisConstraint, ClothCollision, Collision, Constraint, Force,
    ParticleCollision, PinConstraint, PlaneConstraint, PlaneMask, ScenarioConfig, SimError,
    Solver, SpringPairForce, WallCollision,
};

/// Build a one-particle system with no forces attached
pub fn free_particle_system() -> ParticleSystem {
    let mut sys = ParticleSystem::new();
    sys.add_particle(
        NVec3::new(1.0, 2.0, 3.0),
        NVec3::new(0.5, -1.0, 2.0),
        2.0,
    );
    sys
}

/// Harmonic oscillator: unit mass on a unit-stiffness spring anchored at
/// the origin, released from (1, 0, 0)
pub fn oscillator_system() -> ParticleSystem {
    let mut sys = ParticleSystem::new();
    sys.add_particle(NVec3::new(1.0, 0.0, 0.0), NVec3::zeros(), 1.0);
    sys.add_force(Force::Spring {
        stiffness: 1.0,
        anchor: NVec3::zeros(),
    });
    sys
}

/// Final-position error of the oscillator against the analytic cos(t)
pub fn oscillator_error(mut solver: Solver, dt: f64, steps: usize) -> f64 {
    let mut sys = oscillator_system();
    solver.reset();
    for _ in 0..steps {
        solver.solve_step(&mut sys, dt);
    }
    let t = dt * steps as f64;
    (sys.particles()[0].location.x - t.cos()).abs()
}

/// Net momentum of all particles
pub fn total_momentum(sys: &ParticleSystem) -> NVec3 {
    sys.particles()
        .iter()
        .map(|p| p.mass * p.velocity)
        .sum()
}

// ==================================================================================
// Derivative evaluation tests
// ==================================================================================

#[test]
fn derivative_free_particle_is_velocity_and_zero() {
    let mut sys = free_particle_system();
    let derivative = sys.derivative_eval();

    assert_eq!(derivative[0], 0.5);
    assert_eq!(derivative[1], -1.0);
    assert_eq!(derivative[2], 2.0);
    assert_eq!(derivative[3], 0.0);
    assert_eq!(derivative[4], 0.0);
    assert_eq!(derivative[5], 0.0);
}

#[test]
fn state_vector_round_trip() {
    let mut sys = free_particle_system();
    sys.add_particle(NVec3::new(-1.0, 0.0, 4.0), NVec3::new(0.0, 3.0, 0.0), 1.0);

    let state = sys.get_state();
    assert_eq!(state.len(), 12);

    let mut shifted = state.clone();
    shifted[6] = 9.0;
    sys.set_state(&shifted);
    assert_eq!(sys.particles()[1].location.x, 9.0);
    assert_eq!(sys.get_state(), shifted);
}

#[test]
fn degenerate_spring_link_keeps_state_finite() {
    let mut sys = ParticleSystem::new();
    sys.add_particle(NVec3::new(1.0, 1.0, 1.0), NVec3::zeros(), 1.0);
    sys.add_particle(NVec3::new(1.0, 1.0, 1.0), NVec3::zeros(), 1.0);

    let mut pair = SpringPairForce::new(4.0);
    pair.add_link(0, 1, 2.0);
    sys.add_coherent_force(pair);

    let derivative = sys.derivative_eval();
    assert!(
        derivative.iter().all(|x| x.is_finite()),
        "coincident spring endpoints leaked non-finite derivative"
    );
}

// ==================================================================================
// Integrator tests
// ==================================================================================

#[test]
fn forward_euler_matches_closed_form_velocity() {
    let mut sys = ParticleSystem::new();
    sys.add_particle(NVec3::zeros(), NVec3::zeros(), 1.0);
    sys.add_force(Force::Constant {
        force: NVec3::new(0.0, 0.0, -9.8),
    });

    let dt = 0.05;
    let steps = 20;
    let mut solver = Solver::ForwardEuler;
    for _ in 0..steps {
        solver.solve_step(&mut sys, dt);
    }

    let expected = -9.8 * steps as f64 * dt;
    let velocity = sys.particles()[0].velocity.z;
    assert!(
        (velocity - expected).abs() < 1e-9,
        "velocity {} expected {}",
        velocity,
        expected
    );
}

#[test]
fn forward_euler_position_error_is_first_order() {
    // Under constant acceleration the Euler position error against the
    // analytic -4.9 t^2 shrinks linearly with the step size
    let error_at = |dt: f64| {
        let mut sys = ParticleSystem::new();
        sys.add_particle(NVec3::zeros(), NVec3::zeros(), 1.0);
        sys.add_force(Force::Constant {
            force: NVec3::new(0.0, 0.0, -9.8),
        });
        let steps = (1.0 / dt).round() as usize;
        let mut solver = Solver::ForwardEuler;
        for _ in 0..steps {
            solver.solve_step(&mut sys, dt);
        }
        (sys.particles()[0].location.z - (-4.9)).abs()
    };

    let ratio = error_at(0.05) / error_at(0.025);
    assert!(
        (1.9..2.1).contains(&ratio),
        "expected ~2x error reduction, got {}",
        ratio
    );
}

#[test]
fn integrator_orders_on_harmonic_oscillator() {
    // Fixed total time 1.0; halving dt should halve Euler's error,
    // quarter the midpoint method's, and cut RK4's by ~16x
    let euler = oscillator_error(Solver::ForwardEuler, 0.05, 20)
        / oscillator_error(Solver::ForwardEuler, 0.025, 40);
    assert!(
        (1.5..3.0).contains(&euler),
        "forward euler ratio {}",
        euler
    );

    let rk2 = oscillator_error(Solver::SecondOrderRk, 0.05, 20)
        / oscillator_error(Solver::SecondOrderRk, 0.025, 40);
    assert!((3.0..6.0).contains(&rk2), "second order rk ratio {}", rk2);

    let rk4 = oscillator_error(Solver::FourthOrderRk, 0.05, 20)
        / oscillator_error(Solver::FourthOrderRk, 0.025, 40);
    assert!((8.0..32.0).contains(&rk4), "fourth order rk ratio {}", rk4);
}

#[test]
fn spring_pair_conserves_momentum() {
    let mut sys = ParticleSystem::new();
    sys.add_particle(NVec3::new(-1.0, 0.0, 0.0), NVec3::new(0.3, 0.0, 0.0), 1.0);
    sys.add_particle(NVec3::new(1.0, 0.0, 0.0), NVec3::zeros(), 2.0);

    let mut pair = SpringPairForce::new(4.0);
    pair.add_link(0, 1, 1.0);
    sys.add_coherent_force(pair);

    let initial = total_momentum(&sys);
    let mut solver = Solver::Verlet;
    for _ in 0..50 {
        solver.solve_step(&mut sys, 0.05);
        let drift = (total_momentum(&sys) - initial).norm();
        assert!(drift < 1e-9, "momentum drift {} after a step", drift);
    }
}

#[test]
fn leapfrog_reset_reproduces_trajectory() {
    let mut sys = oscillator_system();
    let mut solver = Solver::Leapfrog {
        half_velocity: None,
    };

    let mut first = Vec::new();
    for _ in 0..10 {
        solver.solve_step(&mut sys, 0.05);
        first.push(sys.particles()[0].location);
    }

    // Second run on the same system: without reset() the stale
    // half-velocity cache would leak into the new trajectory
    sys.reset_particles();
    solver.reset();
    let mut second = Vec::new();
    for _ in 0..10 {
        solver.solve_step(&mut sys, 0.05);
        second.push(sys.particles()[0].location);
    }

    assert_eq!(first, second);
}

#[test]
fn leapfrog_run_frames_is_repeatable() {
    let mut sys = oscillator_system();
    sys.solver = Solver::Leapfrog {
        half_velocity: None,
    };
    sys.frame_start = 1;
    sys.frame_end = 21;

    let first = sys.run_frames(0.05);
    let second = sys.run_frames(0.05);
    assert_eq!(first, second);
}

#[test]
fn backward_euler_contracts_state() {
    let mut sys = ParticleSystem::new();
    sys.add_particle(NVec3::new(2.0, 0.0, 0.0), NVec3::new(0.0, 4.0, 0.0), 1.0);

    let mut solver = Solver::BackwardEuler { stiffness: 3.0 };
    solver.solve_step(&mut sys, 0.05);

    let factor = 1.0 / (1.0 + 0.05 * 3.0);
    let p = &sys.particles()[0];
    assert!((p.location.x - 2.0 * factor).abs() < 1e-12);
    assert!((p.velocity.y - 4.0 * factor).abs() < 1e-12);
}

// ==================================================================================
// Constraint tests
// ==================================================================================

#[test]
fn pin_constraint_overrides_forces() {
    let pinned_at = NVec3::new(1.0, 1.0, 1.0);

    let mut sys = ParticleSystem::new();
    sys.add_particle(NVec3::zeros(), NVec3::new(5.0, 5.0, 5.0), 1.0);
    sys.add_force(Force::Gravity { gravity: 9.8 });
    sys.add_force(Force::Constant {
        force: NVec3::new(100.0, 0.0, 0.0),
    });

    let mut pin = PinConstraint::new();
    pin.add_pin(0, pinned_at);
    sys.add_constraint(Constraint::Pin(pin));

    let derivative = sys.derivative_eval();

    let p = &sys.particles()[0];
    assert_eq!(p.velocity, NVec3::zeros());
    assert_eq!(p.location, pinned_at);
    assert_eq!(p.force, NVec3::zeros());
    // The solver sees no motion at all for the pinned particle
    for k in 0..6 {
        assert_eq!(derivative[k], 0.0);
    }
}

#[test]
fn axis_constraint_masks_velocity() {
    let mut sys = ParticleSystem::new();
    sys.add_particle(NVec3::zeros(), NVec3::new(1.0, 2.0, 3.0), 1.0);
    sys.add_force(Force::Gravity { gravity: 9.8 });

    let mut axis = AxisConstraint::new();
    axis.add_axis(0, Axis::X);
    sys.add_constraint(Constraint::Axis(axis));

    sys.derivative_eval();
    let p = &sys.particles()[0];
    assert_eq!(p.velocity, NVec3::new(1.0, 0.0, 0.0));
    assert_eq!(p.force, NVec3::zeros());
}

#[test]
fn plane_constraint_masks_velocity() {
    let mut sys = ParticleSystem::new();
    sys.add_particle(NVec3::zeros(), NVec3::new(1.0, 2.0, 3.0), 1.0);

    let mut plane = PlaneConstraint::new();
    plane.add_plane(0, PlaneMask::Xy);
    sys.add_constraint(Constraint::Plane(plane));

    sys.derivative_eval();
    assert_eq!(sys.particles()[0].velocity, NVec3::new(1.0, 2.0, 0.0));
}

#[test]
fn angular_constraint_in_range_is_noop() {
    let mut particles = vec![
        Particle::new(NVec3::zeros(), NVec3::zeros(), 1.0),
        Particle::new(NVec3::new(1.0, 0.0, 0.0), NVec3::zeros(), 1.0),
        Particle::new(NVec3::new(0.0, 1.0, 0.0), NVec3::zeros(), 1.0),
    ];

    let constraint = Constraint::Angular(AngularConstraint::new(
        0,
        (1, 2),
        std::f64::consts::FRAC_PI_3,
        std::f64::consts::PI,
    ));
    constraint.apply(&mut particles);

    assert_eq!(particles[1].location, NVec3::new(1.0, 0.0, 0.0));
    assert_eq!(particles[2].location, NVec3::new(0.0, 1.0, 0.0));
}

#[test]
fn angular_constraint_projects_to_boundary() {
    let mut particles = vec![
        Particle::new(NVec3::zeros(), NVec3::zeros(), 1.0),
        Particle::new(NVec3::new(1.0, 0.0, 0.0), NVec3::zeros(), 1.0),
        Particle::new(NVec3::new(0.0, 1.0, 0.0), NVec3::zeros(), 1.0),
    ];

    // Current angle pi/2 is below the minimum 2pi/3; both arms should be
    // rotated apart by the same amount until the boundary is met
    let min_angle = 2.0 * std::f64::consts::FRAC_PI_3;
    let constraint = Constraint::Angular(AngularConstraint::new(
        0,
        (1, 2),
        min_angle,
        std::f64::consts::PI,
    ));
    constraint.apply(&mut particles);

    let v1 = particles[1].location;
    let v2 = particles[2].location;
    assert!((v1.angle(&v2) - min_angle).abs() < 1e-9, "angle {}", v1.angle(&v2));
    // Arm lengths are preserved by the rotation
    assert!((v1.norm() - 1.0).abs() < 1e-9);
    assert!((v2.norm() - 1.0).abs() < 1e-9);
}

#[test]
fn angular_constraint_skips_degenerate_angle() {
    // Colinear arms leave the rotation axis undefined; the constraint
    // must leave the particles alone instead of producing NaN
    let mut particles = vec![
        Particle::new(NVec3::zeros(), NVec3::zeros(), 1.0),
        Particle::new(NVec3::new(1.0, 0.0, 0.0), NVec3::zeros(), 1.0),
        Particle::new(NVec3::new(2.0, 0.0, 0.0), NVec3::zeros(), 1.0),
    ];

    let constraint = Constraint::Angular(AngularConstraint::new(
        0,
        (1, 2),
        std::f64::consts::FRAC_PI_3,
        std::f64::consts::PI,
    ));
    constraint.apply(&mut particles);

    assert_eq!(particles[1].location, NVec3::new(1.0, 0.0, 0.0));
    assert_eq!(particles[2].location, NVec3::new(2.0, 0.0, 0.0));
}

// ==================================================================================
// Collision tests
// ==================================================================================

#[test]
fn wall_collision_reflects_and_pushes_out() {
    let mut particles = vec![Particle::new(
        NVec3::new(0.0, 0.0, -0.1),
        NVec3::new(0.0, 0.0, -5.0),
        1.0,
    )];

    let mut wall = Collision::Wall(WallCollision::new(
        NVec3::zeros(),
        NVec3::new(0.0, 0.0, 1.0),
    ));
    wall.project_collision(&mut particles);

    let p = &particles[0];
    assert_eq!(p.velocity, NVec3::new(0.0, 0.0, 5.0));
    assert!(p.location.z >= 0.0, "particle still inside wall: {}", p.location.z);
}

#[test]
fn wall_collision_ignores_outside_particles() {
    let mut particles = vec![Particle::new(
        NVec3::new(0.0, 0.0, 3.0),
        NVec3::new(0.0, 0.0, -5.0),
        1.0,
    )];

    let mut wall = Collision::Wall(WallCollision::new(
        NVec3::zeros(),
        NVec3::new(0.0, 0.0, 1.0),
    ));
    wall.project_collision(&mut particles);

    assert_eq!(particles[0].location, NVec3::new(0.0, 0.0, 3.0));
    assert_eq!(particles[0].velocity, NVec3::new(0.0, 0.0, -5.0));
}

#[test]
fn particle_collision_exchanges_equal_mass_velocities() {
    let mut particles = vec![
        Particle::new(NVec3::new(-0.5, 0.0, 0.0), NVec3::new(1.0, 0.0, 0.0), 1.0),
        Particle::new(NVec3::new(0.5, 0.0, 0.0), NVec3::new(-1.0, 0.0, 0.0), 1.0),
    ];

    let mut collision = Collision::Particles(ParticleCollision::new());
    collision.project_collision(&mut particles);

    assert!((particles[0].velocity.x - (-1.0)).abs() < 1e-12);
    assert!((particles[1].velocity.x - 1.0).abs() < 1e-12);
}

#[test]
fn particle_collision_respects_mass_radius() {
    // Separation 5 exceeds the combined mass-as-radius 2, so the pair
    // must pass through untouched
    let mut particles = vec![
        Particle::new(NVec3::new(-2.5, 0.0, 0.0), NVec3::new(1.0, 0.0, 0.0), 1.0),
        Particle::new(NVec3::new(2.5, 0.0, 0.0), NVec3::new(-1.0, 0.0, 0.0), 1.0),
    ];

    let mut collision = Collision::Particles(ParticleCollision::new());
    collision.project_collision(&mut particles);

    assert_eq!(particles[0].velocity, NVec3::new(1.0, 0.0, 0.0));
    assert_eq!(particles[1].velocity, NVec3::new(-1.0, 0.0, 0.0));
}

#[test]
fn particle_collision_conserves_momentum_unequal_masses() {
    let mut particles = vec![
        Particle::new(NVec3::new(-0.5, 0.0, 0.0), NVec3::new(2.0, 0.0, 0.0), 1.0),
        Particle::new(NVec3::new(0.5, 0.0, 0.0), NVec3::new(-1.0, 0.0, 0.0), 3.0),
    ];
    let before = particles[0].mass * particles[0].velocity
        + particles[1].mass * particles[1].velocity;

    let mut collision = Collision::Particles(ParticleCollision::new());
    collision.project_collision(&mut particles);

    let after = particles[0].mass * particles[0].velocity
        + particles[1].mass * particles[1].velocity;
    assert!((after - before).norm() < 1e-12, "momentum changed by impulse");
}

#[test]
fn cloth_collision_snapshots_rest_shape() {
    let mut particles = vec![
        Particle::new(NVec3::new(0.0, 0.0, 0.0), NVec3::zeros(), 1.0),
        Particle::new(NVec3::new(1.0, 0.0, 0.0), NVec3::zeros(), 1.0),
    ];

    let mut cloth = ClothCollision::new();
    {
        let mut collision = Collision::Cloth(cloth.clone());
        collision.project_collision(&mut particles);
        if let Collision::Cloth(c) = collision {
            cloth = c;
        }
    }

    let rest = cloth.rest_shape().expect("rest shape captured on first call");
    assert_eq!(rest.len(), 2);
    assert_eq!(rest[1], NVec3::new(1.0, 0.0, 0.0));

    // The rest shape is pinned to the first invocation even after motion
    particles[1].location = NVec3::new(9.0, 0.0, 0.0);
    let mut collision = Collision::Cloth(cloth);
    collision.project_collision(&mut particles);
    if let Collision::Cloth(c) = collision {
        assert_eq!(c.rest_shape().unwrap()[1], NVec3::new(1.0, 0.0, 0.0));
    }
}

// ==================================================================================
// Frame loop tests
// ==================================================================================

#[test]
fn run_frames_covers_configured_range() {
    let mut sys = oscillator_system();
    sys.frame_start = 1;
    sys.frame_end = 4;

    let frames = sys.run_frames(0.05);
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].len(), 1);
}

#[test]
fn run_frames_resets_to_initial_state() {
    let mut sys = oscillator_system();
    sys.frame_start = 1;
    sys.frame_end = 11;

    let first = sys.run_frames(0.05);
    // Live particles have drifted; a second run must start over from the
    // retained initial copies and reproduce the same trajectory
    let second = sys.run_frames(0.05);
    assert_eq!(first, second);
}

#[test]
fn post_constraint_applies_after_each_frame() {
    // Two arms on a pivot, pulled together by springs, held apart by the
    // angular constraint; after every frame the angle must respect it
    let min_angle = std::f64::consts::FRAC_PI_2;
    let mut sys = ParticleSystem::new();
    sys.add_particle(NVec3::zeros(), NVec3::zeros(), 1.0);
    sys.add_particle(NVec3::new(1.0, 0.0, 0.0), NVec3::zeros(), 1.0);
    sys.add_particle(NVec3::new(0.0, 1.0, 0.0), NVec3::zeros(), 1.0);

    let mut pin = PinConstraint::new();
    pin.add_pin(0, NVec3::zeros());
    sys.add_constraint(Constraint::Pin(pin));
    sys.add_constraint(Constraint::Angular(AngularConstraint::new(
        0,
        (1, 2),
        min_angle,
        std::f64::consts::PI,
    )));

    let mut pair = SpringPairForce::new(2.0);
    pair.add_link(1, 2, 0.1); // rest length far below current distance
    sys.add_coherent_force(pair);

    sys.solver = Solver::Verlet;
    sys.frame_start = 1;
    sys.frame_end = 21;

    for frame in sys.run_frames(0.05) {
        let v1 = frame[1] - frame[0];
        let v2 = frame[2] - frame[0];
        assert!(
            v1.angle(&v2) >= min_angle - 1e-6,
            "angle {} dropped below the constraint",
            v1.angle(&v2)
        );
    }
}

// ==================================================================================
// Persistence tests
// ==================================================================================

/// Scenario exercising every persistable entity kind
pub fn full_scenario() -> ParticleSystem {
    let mut sys = ParticleSystem::new();
    sys.add_particle(NVec3::zeros(), NVec3::zeros(), 1.0);
    sys.add_particle(NVec3::new(4.0, 0.0, 0.0), NVec3::zeros(), 1.5);
    sys.add_particle(NVec3::new(0.0, 4.0, 0.0), NVec3::new(0.0, 0.0, -1.0), 2.0);

    sys.add_force(Force::Constant {
        force: NVec3::new(2.0, 2.0, 2.0),
    });
    sys.add_force(Force::Damping { damping: 0.5 });
    sys.add_force(Force::Spring {
        stiffness: 0.5,
        anchor: NVec3::new(0.5, 0.5, 0.5),
    });
    sys.add_force(Force::Gravity { gravity: 9.8 });

    let mut pair = SpringPairForce::new(4.0);
    pair.add_link(0, 1, 4.0);
    pair.add_link(1, 2, 5.0);
    sys.add_coherent_force(pair);

    let mut pin = PinConstraint::new();
    pin.add_pin(0, NVec3::zeros());
    sys.add_constraint(Constraint::Pin(pin));

    let mut axis = AxisConstraint::new();
    axis.add_axis(1, Axis::Z);
    sys.add_constraint(Constraint::Axis(axis));

    let mut plane = PlaneConstraint::new();
    plane.add_plane(2, PlaneMask::Xz);
    sys.add_constraint(Constraint::Plane(plane));

    sys.add_constraint(Constraint::Angular(AngularConstraint::new(
        0,
        (1, 2),
        0.5,
        2.5,
    )));

    sys.add_collision(Collision::Wall(WallCollision::new(
        NVec3::new(0.0, 0.0, -10.0),
        NVec3::new(0.0, 0.0, 1.0),
    )));
    sys.add_collision(Collision::Particles(ParticleCollision::new()));

    sys.solver = Solver::Leapfrog {
        half_velocity: None,
    };
    sys.frame_start = 1;
    sys.frame_end = 6;
    sys
}

#[test]
fn scenario_round_trip_preserves_configuration() {
    let sys = full_scenario();
    let saved = snapshot_system(&sys);

    let json = serde_json::to_string_pretty(&saved).expect("serialize scenario");
    let loaded: ScenarioConfig = serde_json::from_str(&json).expect("parse scenario");
    let rebuilt = build_system(&loaded).expect("rebuild system");
    let resaved = snapshot_system(&rebuilt);

    assert_eq!(
        serde_json::to_value(&saved).unwrap(),
        serde_json::to_value(&resaved).unwrap()
    );
}

#[test]
fn scenario_tags_use_wire_names() {
    let sys = full_scenario();
    let json = serde_json::to_value(snapshot_system(&sys)).expect("serialize scenario");

    assert_eq!(json["solver"], "leap_frog_solver");
    assert_eq!(json["force_list"][0]["force_name"], "constant_force");
    assert_eq!(json["force_list"][3]["force_name"], "gravity_force");
    assert_eq!(
        json["coherent_force_list"][0]["coherent_force_name"],
        "spring_two_particle_force"
    );
    assert_eq!(
        json["constraint_list"][0]["constraint_name"],
        "pin_constraint"
    );
    assert_eq!(json["constraint_list"][1]["axis_list"][0]["axis"], "z");
    assert_eq!(json["collision_list"][0]["collision_name"], "wall_collision");
}

#[test]
fn cloth_collision_is_not_persisted() {
    let mut sys = full_scenario();
    sys.add_collision(Collision::Cloth(ClothCollision::new()));

    let saved = snapshot_system(&sys);
    assert_eq!(saved.collision_list.len(), 2);
}

#[test]
fn load_rejects_out_of_range_particle_index() {
    let json = r#"{
        "particle_list": [
            { "location": [0.0, 0.0, 0.0], "velocity": [0.0, 0.0, 0.0], "mass": 1.0 }
        ],
        "force_list": [],
        "coherent_force_list": [
            {
                "coherent_force_name": "spring_two_particle_force",
                "coherent_particle_list": [
                    { "coherent_particle_idx": [0, 5], "rest_length": 1.0 }
                ],
                "spring_constant": 4.0
            }
        ],
        "constraint_list": [],
        "collision_list": [],
        "solver": "forward_euler_solver"
    }"#;

    let cfg: ScenarioConfig = serde_json::from_str(json).expect("parse scenario");
    match build_system(&cfg) {
        Err(SimError::ParticleOutOfRange { index: 5, count: 1 }) => {}
        other => panic!("expected out-of-range error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn load_rejects_unknown_tags() {
    let json = r#"{
        "particle_list": [],
        "force_list": [ { "force_name": "wind_force" } ],
        "coherent_force_list": [],
        "constraint_list": [],
        "collision_list": [],
        "solver": "forward_euler_solver"
    }"#;

    assert!(serde_json::from_str::<ScenarioConfig>(json).is_err());
}

#[test]
fn load_init_missing_file_is_io_error() {
    let missing = std::env::temp_dir().join("pdsim_no_such_scenario.json");
    match pdsim::load_init(&missing) {
        Err(SimError::Io { .. }) => {}
        other => panic!("expected io error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn animation_round_trip_preserves_positions() {
    let mut sys = full_scenario();
    let frames = sys.run_frames(0.05);
    assert_eq!(frames.len(), 5);

    let dir = std::env::temp_dir().join(format!("pdsim_anim_{}", std::process::id()));
    pdsim::save_animation(&dir, &sys, &frames).expect("save animation");
    let trace = pdsim::load_animation(&dir).expect("load animation");
    let _ = std::fs::remove_dir_all(&dir);

    assert_eq!(trace.config.frame_start, 1);
    assert_eq!(trace.config.frame_end, 6);
    assert_eq!(trace.config.particle_list.len(), 3);
    assert_eq!(trace.frames, frames);
}

// ==================================================================================
// Particle bookkeeping tests
// ==================================================================================

#[test]
fn remove_particle_rejects_referenced_index() {
    let mut sys = ParticleSystem::new();
    sys.add_particle(NVec3::zeros(), NVec3::zeros(), 1.0);
    sys.add_particle(NVec3::new(1.0, 0.0, 0.0), NVec3::zeros(), 1.0);
    sys.add_particle(NVec3::new(2.0, 0.0, 0.0), NVec3::zeros(), 1.0);

    let mut pair = SpringPairForce::new(4.0);
    pair.add_link(1, 2, 1.0);
    sys.add_coherent_force(pair);

    match sys.remove_particle(1) {
        Err(SimError::ParticleReferenced { index: 1 }) => {}
        other => panic!("expected referenced error, got {:?}", other),
    }
    assert_eq!(sys.particle_count(), 3);
}

#[test]
fn remove_particle_shifts_stored_indices() {
    let mut sys = ParticleSystem::new();
    sys.add_particle(NVec3::zeros(), NVec3::zeros(), 1.0);
    sys.add_particle(NVec3::new(1.0, 0.0, 0.0), NVec3::zeros(), 1.0);
    sys.add_particle(NVec3::new(2.0, 0.0, 0.0), NVec3::zeros(), 1.0);

    let mut pair = SpringPairForce::new(4.0);
    pair.add_link(1, 2, 1.0);
    sys.add_coherent_force(pair);

    let mut pin = PinConstraint::new();
    pin.add_pin(2, NVec3::new(2.0, 0.0, 0.0));
    sys.add_constraint(Constraint::Pin(pin));

    sys.remove_particle(0).expect("particle 0 is unreferenced");

    assert_eq!(sys.particle_count(), 2);
    assert_eq!(sys.init_particles().len(), 2);
    let link = sys.coherent_forces()[0].links()[0];
    assert_eq!((link.a, link.b), (0, 1));
    if let Constraint::Pin(pin) = &sys.constraints()[0] {
        assert_eq!(pin.pins()[0].0, 1);
    } else {
        panic!("pin constraint lost");
    }
}

#[test]
fn remove_particle_out_of_range() {
    let mut sys = ParticleSystem::new();
    match sys.remove_particle(0) {
        Err(SimError::ParticleOutOfRange { index: 0, count: 0 }) => {}
        other => panic!("expected out-of-range error, got {:?}", other),
    }
}

#[test]
fn init_particle_handle_feeds_next_run() {
    let mut sys = oscillator_system();
    sys.frame_start = 1;
    sys.frame_end = 2;

    let baseline = sys.run_frames(0.05);
    sys.init_particle_mut(0).location = NVec3::new(2.0, 0.0, 0.0);
    let moved = sys.run_frames(0.05);

    assert_ne!(baseline[0][0], moved[0][0]);
}

// ==================================================================================
// Mass-spring grid tests
// ==================================================================================

#[test]
fn grid_wires_structural_springs() {
    let grid = MassSpringGrid::default();
    let sys = grid.build();

    assert_eq!(sys.particle_count(), 49);
    assert_eq!(sys.coherent_forces().len(), 1);
    // 7 rows of 6 horizontal edges plus 6 rows of 7 vertical edges
    assert_eq!(sys.coherent_forces()[0].links().len(), 84);
    assert_eq!(sys.forces().len(), 2);

    if let Constraint::Pin(pin) = &sys.constraints()[0] {
        assert_eq!(pin.pins().len(), 2);
    } else {
        panic!("grid must pin its top corners");
    }
}

#[test]
fn grid_shear_and_flexion_add_links() {
    let grid = MassSpringGrid {
        shear: true,
        flexion: true,
        ..MassSpringGrid::default()
    };
    let sys = grid.build();

    assert_eq!(sys.coherent_forces().len(), 3);
    // Two diagonals per interior cell
    assert_eq!(sys.coherent_forces()[1].links().len(), 72);
    // Skip-one links horizontally and vertically
    assert_eq!(sys.coherent_forces()[2].links().len(), 70);

    let shear_rest = 4.0 * std::f64::consts::SQRT_2;
    assert!((sys.coherent_forces()[1].links()[0].rest_length - shear_rest).abs() < 1e-12);
    assert_eq!(sys.coherent_forces()[2].links()[0].rest_length, 8.0);
}

#[test]
fn grid_cloth_falls_under_gravity_except_pins() {
    let grid = MassSpringGrid::default();
    let mut sys = grid.build();
    sys.solver = Solver::Verlet;
    sys.frame_start = 1;
    sys.frame_end = 11;

    let frames = sys.run_frames(0.05);
    let last = frames.last().expect("frames recorded");

    // Pinned corners stay, the middle of the bottom row sags
    assert_eq!(last[0], NVec3::new(0.0, 0.0, 0.0));
    assert_eq!(last[6], NVec3::new(18.0, 0.0, 0.0));
    let bottom_middle = 6 * 7 + 3;
    assert!(
        last[bottom_middle].z < -18.0,
        "bottom row did not sag: {}",
        last[bottom_middle].z
    );
}
