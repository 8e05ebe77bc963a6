//! Quantity aliases and angle helpers shared across the crate.
//!
//! All physical values are `uom` f64 quantities; raw `f64` only appears
//! for dimensionless factors and at trig call sites.

use core::marker::PhantomData;

pub use uom::si::f64::{Angle, AngularVelocity, Length, Ratio, Time, Velocity};

/// Positions closer than this are considered equal.
pub const POSITION_EPSILON: Length = Length {
    dimension: PhantomData,
    units: PhantomData,
    value: 1e-9,
};

/// Angles closer than this are considered equal.
pub const ANGLE_EPSILON: Angle = Angle {
    dimension: PhantomData,
    units: PhantomData,
    value: 1e-9,
};

/// Whether two angles are equal to within [`ANGLE_EPSILON`].
pub fn angles_equal(a: Angle, b: Angle) -> bool {
    (a - b).abs() < ANGLE_EPSILON
}

/// Normalize an angle to [-pi, pi].
pub fn normalize_angle(angle: Angle) -> Angle {
    use core::f64::consts::{PI, TAU};
    use uom::si::angle::radian;

    let raw_angle = angle.value.rem_euclid(TAU);

    Angle::new::<radian>(if raw_angle > PI {
        raw_angle - TAU
    } else {
        raw_angle
    })
}

/// Normalize an angle to [0, 2*pi).
pub fn zero_to_2pi(angle: Angle) -> Angle {
    use core::f64::consts::TAU;
    use uom::si::angle::radian;

    Angle::new::<radian>(angle.value.rem_euclid(TAU))
}
