//! A single wheel: geometry, speed state, and encoder readout.

use serde::{Deserialize, Serialize};
use uom::si::angle::revolution;
use uom::si::f64::{Angle, AngularVelocity, Length};

use crate::geometry::{Cartesian, Polygon};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EncoderType {
    Absolute,
    Relative,
}

#[derive(Clone, Debug)]
pub struct Wheel {
    initial_position: Cartesian,
    initial_direction: Angle,
    radius: Length,
    initial_polygon: Polygon,
    max_angular_velocity_magnitude: AngularVelocity,
    encoder_type: EncoderType,
    encoder_ticks_per_revolution: f64,
    angular_velocity: AngularVelocity,
    rotation: Angle,
    relative_zero: Angle,
}

impl Wheel {
    /// `position` and `direction` are in the world frame; the polygon is a
    /// `diameter x width` rectangle aligned with the rolling direction.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        position: Cartesian,
        direction: Angle,
        diameter: Length,
        width: Length,
        max_angular_velocity_magnitude: AngularVelocity,
        encoder_type: EncoderType,
        encoder_ticks_per_revolution: f64,
    ) -> Self {
        let half_length = diameter / 2.0;
        let half_width = width / 2.0;
        let initial_polygon = Polygon::new(vec![
            Cartesian::new(position.x - half_length, position.y - half_width),
            Cartesian::new(position.x + half_length, position.y - half_width),
            Cartesian::new(position.x + half_length, position.y + half_width),
            Cartesian::new(position.x - half_length, position.y + half_width),
        ])
        .rotate_around_point(direction, position);

        Self {
            initial_position: position,
            initial_direction: direction,
            radius: diameter / 2.0,
            initial_polygon,
            max_angular_velocity_magnitude,
            encoder_type,
            encoder_ticks_per_revolution,
            angular_velocity: AngularVelocity::default(),
            rotation: Angle::default(),
            relative_zero: Angle::default(),
        }
    }

    pub fn initial_position(&self) -> Cartesian {
        self.initial_position
    }

    pub fn initial_direction(&self) -> Angle {
        self.initial_direction
    }

    pub fn radius(&self) -> Length {
        self.radius
    }

    pub fn initial_polygon(&self) -> &Polygon {
        &self.initial_polygon
    }

    pub fn max_angular_velocity_magnitude(&self) -> AngularVelocity {
        self.max_angular_velocity_magnitude
    }

    pub fn encoder_type(&self) -> EncoderType {
        self.encoder_type
    }

    pub fn encoder_ticks_per_revolution(&self) -> f64 {
        self.encoder_ticks_per_revolution
    }

    pub fn angular_velocity(&self) -> AngularVelocity {
        self.angular_velocity
    }

    /// The magnitude must not exceed the wheel's maximum.
    pub fn set_angular_velocity(&mut self, angular_velocity: AngularVelocity) {
        debug_assert!(
            angular_velocity.abs() <= self.max_angular_velocity_magnitude,
            "wheel speed exceeds the maximum"
        );
        self.angular_velocity = angular_velocity;
    }

    pub fn update_rotation(&mut self, delta: Angle) {
        self.rotation += delta;
    }

    /// Total accumulated rotation within one revolution, in encoder ticks.
    pub fn read_absolute_encoder(&self) -> i32 {
        let revolutions = self.rotation.get::<revolution>().rem_euclid(1.0);
        (revolutions * self.encoder_ticks_per_revolution) as i32
    }

    /// Rotation since the last reset, in encoder ticks.
    pub fn read_relative_encoder(&self) -> i32 {
        let revolutions = (self.rotation - self.relative_zero).get::<revolution>();
        (revolutions * self.encoder_ticks_per_revolution) as i32
    }

    pub fn reset_relative_encoder(&mut self) {
        self.relative_zero = self.rotation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uom::si::angle::degree;
    use uom::si::angular_velocity::revolution_per_minute;
    use uom::si::length::meter;

    fn wheel() -> Wheel {
        Wheel::new(
            Cartesian::default(),
            Angle::new::<degree>(0.0),
            Length::new::<meter>(0.03),
            Length::new::<meter>(0.01),
            AngularVelocity::new::<revolution_per_minute>(300.0),
            EncoderType::Relative,
            360.0,
        )
    }

    #[test]
    fn test_absolute_encoder_wraps() {
        let mut wheel = wheel();
        wheel.update_rotation(Angle::new::<revolution>(1.25));
        assert_eq!(wheel.read_absolute_encoder(), 90);
        wheel.update_rotation(Angle::new::<revolution>(-1.5));
        assert_eq!(wheel.read_absolute_encoder(), 270);
    }

    #[test]
    fn test_relative_encoder_resets() {
        let mut wheel = wheel();
        wheel.update_rotation(Angle::new::<revolution>(2.5));
        assert_eq!(wheel.read_relative_encoder(), 900);
        wheel.reset_relative_encoder();
        assert_eq!(wheel.read_relative_encoder(), 0);
        wheel.update_rotation(Angle::new::<revolution>(0.5));
        assert_eq!(wheel.read_relative_encoder(), 180);
    }

    #[test]
    fn test_absolute_encoder_monotone_under_positive_speed() {
        let mut wheel = wheel();
        let mut previous = wheel.read_absolute_encoder();
        for _ in 0..100 {
            wheel.update_rotation(Angle::new::<degree>(7.0));
            let current = wheel.read_absolute_encoder();
            // monotone modulo wrap-around
            let delta = (current - previous).rem_euclid(360);
            assert!(delta > 0 && delta < 180);
            previous = current;
        }
    }

    #[test]
    fn test_wheel_polygon_aligned_with_direction() {
        let wheel = Wheel::new(
            Cartesian::default(),
            Angle::new::<degree>(90.0),
            Length::new::<meter>(0.03),
            Length::new::<meter>(0.01),
            AngularVelocity::new::<revolution_per_minute>(300.0),
            EncoderType::Absolute,
            1024.0,
        );
        // Rolling north: the long side now spans y.
        let ys: Vec<f64> = wheel
            .initial_polygon()
            .vertices()
            .iter()
            .map(|v| v.y.value)
            .collect();
        let spread = ys.iter().cloned().fold(f64::MIN, f64::max)
            - ys.iter().cloned().fold(f64::MAX, f64::min);
        approx::assert_relative_eq!(spread, 0.03, epsilon = 1e-12);
    }
}
