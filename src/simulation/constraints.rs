//! Velocity/position constraints applied around integration
//!
//! Every constraint carries a fixed phase decided by its kind:
//! - `Pre` constraints run inside the derivative evaluation, before the
//!   solver reads derivatives. They mutate velocity/force/location directly
//!   so the removed degrees of freedom are invisible to the solver.
//! - `Post` constraints run once per frame after a full solver step, as a
//!   geometric projection of particle positions.

use nalgebra::{Unit, UnitQuaternion};

use crate::simulation::params::GEOM_EPS;
use crate::simulation::states::{NVec3, Particle};

/// When a constraint is applied relative to integration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintPhase {
    Pre,
    Post,
}

/// Single coordinate axis, as a one-hot mask over (x, y, z)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn mask(&self) -> NVec3 {
        match self {
            Axis::X => NVec3::new(1.0, 0.0, 0.0),
            Axis::Y => NVec3::new(0.0, 1.0, 0.0),
            Axis::Z => NVec3::new(0.0, 0.0, 1.0),
        }
    }
}

/// Coordinate plane, as a two-hot mask over (x, y, z)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneMask {
    Xy,
    Yz,
    Xz,
}

impl PlaneMask {
    pub fn mask(&self) -> NVec3 {
        match self {
            PlaneMask::Xy => NVec3::new(1.0, 1.0, 0.0),
            PlaneMask::Yz => NVec3::new(0.0, 1.0, 1.0),
            PlaneMask::Xz => NVec3::new(1.0, 0.0, 1.0),
        }
    }
}

/// Closed set of constraints, dispatched by match
///
/// The variants correspond one-to-one to the `constraint_name` tags of the
/// persistence schema
#[derive(Debug, Clone)]
pub enum Constraint {
    Pin(PinConstraint),
    Axis(AxisConstraint),
    Plane(PlaneConstraint),
    Angular(AngularConstraint),
}

impl Constraint {
    /// Phase is fixed by kind at construction, never re-derived
    pub fn phase(&self) -> ConstraintPhase {
        match self {
            Constraint::Pin(_) | Constraint::Axis(_) | Constraint::Plane(_) => {
                ConstraintPhase::Pre
            }
            Constraint::Angular(_) => ConstraintPhase::Post,
        }
    }

    pub fn apply(&self, particles: &mut [Particle]) {
        match self {
            Constraint::Pin(c) => c.apply(particles),
            Constraint::Axis(c) => c.apply(particles),
            Constraint::Plane(c) => c.apply(particles),
            Constraint::Angular(c) => c.apply(particles),
        }
    }

    /// True if the constraint stores a reference to the given particle index
    pub fn references(&self, index: usize) -> bool {
        match self {
            Constraint::Pin(c) => c.pins.iter().any(|(i, _)| *i == index),
            Constraint::Axis(c) => c.axes.iter().any(|(i, _)| *i == index),
            Constraint::Plane(c) => c.planes.iter().any(|(i, _)| *i == index),
            Constraint::Angular(c) => {
                c.pivot == index || c.pair.0 == index || c.pair.1 == index
            }
        }
    }

    /// Shift stored indices down after the removal of `removed`
    ///
    /// Caller guarantees the constraint no longer references `removed` itself
    pub fn reindex_removed(&mut self, removed: usize) {
        let shift = |i: &mut usize| {
            if *i > removed {
                *i -= 1;
            }
        };
        match self {
            Constraint::Pin(c) => c.pins.iter_mut().for_each(|(i, _)| shift(i)),
            Constraint::Axis(c) => c.axes.iter_mut().for_each(|(i, _)| shift(i)),
            Constraint::Plane(c) => c.planes.iter_mut().for_each(|(i, _)| shift(i)),
            Constraint::Angular(c) => {
                shift(&mut c.pivot);
                shift(&mut c.pair.0);
                shift(&mut c.pair.1);
            }
        }
    }
}

/// Pins particles to fixed locations (`pre`)
///
/// Overrides anything the force phase computed: force and velocity are
/// zeroed and the location snaps to the pin
#[derive(Debug, Clone, Default)]
pub struct PinConstraint {
    pins: Vec<(usize, NVec3)>,
}

impl PinConstraint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pin(&mut self, particle: usize, location: NVec3) {
        self.pins.push((particle, location));
    }

    pub fn pins(&self) -> &[(usize, NVec3)] {
        &self.pins
    }

    fn apply(&self, particles: &mut [Particle]) {
        for (index, location) in &self.pins {
            let particle = &mut particles[*index];
            particle.velocity = NVec3::zeros();
            particle.force = NVec3::zeros();
            particle.location = *location;
        }
    }
}

/// Restricts particles to motion along one axis (`pre`)
#[derive(Debug, Clone, Default)]
pub struct AxisConstraint {
    axes: Vec<(usize, Axis)>,
}

impl AxisConstraint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_axis(&mut self, particle: usize, axis: Axis) {
        self.axes.push((particle, axis));
    }

    pub fn axes(&self) -> &[(usize, Axis)] {
        &self.axes
    }

    fn apply(&self, particles: &mut [Particle]) {
        for (index, axis) in &self.axes {
            let particle = &mut particles[*index];
            particle.velocity = particle.velocity.component_mul(&axis.mask());
            particle.force = NVec3::zeros();
        }
    }
}

/// Restricts particles to motion within one coordinate plane (`pre`)
#[derive(Debug, Clone, Default)]
pub struct PlaneConstraint {
    planes: Vec<(usize, PlaneMask)>,
}

impl PlaneConstraint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_plane(&mut self, particle: usize, plane: PlaneMask) {
        self.planes.push((particle, plane));
    }

    pub fn planes(&self) -> &[(usize, PlaneMask)] {
        &self.planes
    }

    fn apply(&self, particles: &mut [Particle]) {
        for (index, plane) in &self.planes {
            let particle = &mut particles[*index];
            particle.velocity = particle.velocity.component_mul(&plane.mask());
            particle.force = NVec3::zeros();
        }
    }
}

/// Keeps the angle at a pivot particle within bounds (`post`)
///
/// A geometric projection, not force-based: when the angle between the two
/// arms leaves `[min_angle, max_angle]`, the correcting rotation is split
/// in half between the arms and both pair particles are repositioned about
/// the pivot. Applying it while the angle is in range is a no-op.
#[derive(Debug, Clone)]
pub struct AngularConstraint {
    pub pivot: usize,
    pub pair: (usize, usize),
    pub min_angle: f64,
    pub max_angle: f64,
}

impl AngularConstraint {
    pub fn new(pivot: usize, pair: (usize, usize), min_angle: f64, max_angle: f64) -> Self {
        Self {
            pivot,
            pair,
            min_angle,
            max_angle,
        }
    }

    fn apply(&self, particles: &mut [Particle]) {
        let pivot_loc = particles[self.pivot].location;
        let v1 = particles[self.pair.0].location - pivot_loc;
        let v2 = particles[self.pair.1].location - pivot_loc;

        let angle = v1.angle(&v2);
        if angle <= GEOM_EPS {
            // Arms are parallel, the rotation axis is undefined
            log::warn!(
                "angular constraint at pivot {} has ~zero angle, skipping",
                self.pivot
            );
            return;
        }

        let target = if angle < self.min_angle {
            self.min_angle
        } else if angle > self.max_angle {
            self.max_angle
        } else {
            return;
        };

        let rotation_axis = v1.cross(&v2);
        if rotation_axis.norm() <= GEOM_EPS {
            log::warn!(
                "angular constraint at pivot {} has degenerate rotation axis, skipping",
                self.pivot
            );
            return;
        }
        let rotation_axis = Unit::new_normalize(rotation_axis);

        // Rotating v2 by `correction` about the axis changes the pair angle
        // from `angle` to `target`; slerp from identity splits the
        // correction in half between the two arms
        let correction = target - angle;
        let full = UnitQuaternion::from_axis_angle(&rotation_axis, correction);
        let half = UnitQuaternion::identity().slerp(&full, 0.5);

        particles[self.pair.0].location = pivot_loc + half.inverse() * v1;
        particles[self.pair.1].location = pivot_loc + half * v2;
    }
}
