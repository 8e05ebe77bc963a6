//! The mouse: geometry aggregation, the kinematic integrator, and the
//! wheel-speed synthesizer.

use std::collections::BTreeMap;
use std::path::Path;

use uom::si::angle::degree;
use uom::si::angular_velocity::revolution_per_minute;
use uom::si::f64::{Angle, AngularVelocity, Length, Time, Velocity};
use uom::si::length::meter;
use uom::si::time::millisecond;

use crate::context::SimParams;
use crate::geometry::{rotate_vertex_around_point, Cartesian, Polygon};
use crate::maze::{Direction, Maze};
use crate::mouse_file::{MouseDescription, MouseError};
use crate::sensor::Sensor;
use crate::units::zero_to_2pi;
use crate::wheel::Wheel;

const CENTER_OF_MASS_RADIUS: f64 = 0.005;
const CENTER_OF_MASS_VERTICES: usize = 8;

#[derive(Clone, Debug)]
pub struct Mouse {
    initial_translation: Cartesian,
    initial_rotation: Angle,
    current_translation: Cartesian,
    current_rotation: Angle,
    current_gyro: AngularVelocity,
    elapsed_sim_time: Time,
    initial_body_polygon: Polygon,
    initial_collision_polygon: Polygon,
    initial_center_of_mass_polygon: Polygon,
    wheels: BTreeMap<String, Wheel>,
    sensors: BTreeMap<String, Sensor>,
    wheel_speed_adjustment_factors: BTreeMap<String, (f64, f64)>,
    curve_turn_factors: (f64, f64),
}

impl Mouse {
    pub fn from_file(
        path: &Path,
        initial_direction: Direction,
        params: &SimParams,
    ) -> Result<Self, MouseError> {
        let description = MouseDescription::from_file(path)?;
        Ok(Self::from_description(&description, initial_direction, params))
    }

    /// Place the described mouse at the center of tile `(0, 0)`, facing
    /// `initial_direction`.
    pub fn from_description(
        description: &MouseDescription,
        initial_direction: Direction,
        params: &SimParams,
    ) -> Self {
        let half_tile = params.tile_length() / 2.0;
        let initial_translation = Cartesian::new(half_tile, half_tile);
        let initial_rotation = initial_direction.angle();

        // Local coordinates have the mouse at the origin facing +x; rotate
        // into the initial heading, then move onto the starting tile.
        let place = |point: [f64; 2]| {
            initial_translation
                + rotate_vertex_around_point(
                    Cartesian::new(Length::new::<meter>(point[0]), Length::new::<meter>(point[1])),
                    initial_rotation,
                    Cartesian::default(),
                )
        };

        let initial_body_polygon = Polygon::new(
            description
                .body
                .vertices
                .iter()
                .map(|&vertex| place(vertex))
                .collect(),
        );

        let wheels: BTreeMap<String, Wheel> = description
            .wheels
            .iter()
            .map(|(name, wheel)| {
                (
                    name.clone(),
                    Wheel::new(
                        place(wheel.position),
                        Angle::new::<degree>(wheel.direction_deg) + initial_rotation,
                        Length::new::<meter>(wheel.diameter),
                        Length::new::<meter>(wheel.width),
                        AngularVelocity::new::<revolution_per_minute>(wheel.max_speed_rpm),
                        wheel.encoder_type,
                        wheel.encoder_ticks_per_rev,
                    ),
                )
            })
            .collect();

        let sensors: BTreeMap<String, Sensor> = description
            .sensors
            .iter()
            .map(|(name, sensor)| {
                (
                    name.clone(),
                    Sensor::new(
                        place(sensor.position),
                        Angle::new::<degree>(sensor.direction_deg) + initial_rotation,
                        Angle::new::<degree>(sensor.fov_deg / 2.0),
                        Length::new::<meter>(sensor.range),
                        Time::new::<millisecond>(sensor.read_duration_ms as f64),
                        Length::new::<meter>(sensor.radius),
                    ),
                )
            })
            .collect();

        // Convex hull in lieu of polygon union; a good approximation for
        // collision purposes even though union is the exact operation.
        let mut collision_parts = vec![initial_body_polygon.clone()];
        collision_parts.extend(wheels.values().map(|w| w.initial_polygon().clone()));
        collision_parts.extend(sensors.values().map(|s| s.initial_polygon().clone()));
        let initial_collision_polygon = Polygon::convex_hull(&collision_parts);

        let initial_center_of_mass_polygon = Polygon::circle(
            initial_translation,
            Length::new::<meter>(CENTER_OF_MASS_RADIUS),
            CENTER_OF_MASS_VERTICES,
        );

        let wheel_speed_adjustment_factors =
            Self::compute_wheel_speed_adjustment_factors(initial_translation, initial_rotation, &wheels);
        let curve_turn_factors = Self::compute_curve_turn_factors(
            initial_translation,
            initial_rotation,
            &wheels,
            &wheel_speed_adjustment_factors,
            params.wall_length / 2.0 * 0.5 * std::f64::consts::PI,
        );

        Self {
            initial_translation,
            initial_rotation,
            current_translation: initial_translation,
            current_rotation: initial_rotation,
            current_gyro: AngularVelocity::default(),
            elapsed_sim_time: Time::default(),
            initial_body_polygon,
            initial_collision_polygon,
            initial_center_of_mass_polygon,
            wheels,
            sensors,
            wheel_speed_adjustment_factors,
            curve_turn_factors,
        }
    }

    /// A wheel's contribution to the mouse's forward and rotational motion
    /// when rolling at `linear_velocity`.
    fn rates_of_change(
        initial_translation: Cartesian,
        initial_rotation: Angle,
        wheel_position: Cartesian,
        wheel_direction: Angle,
        linear_velocity: Velocity,
    ) -> (Velocity, AngularVelocity) {
        let forward = linear_velocity * (initial_rotation - wheel_direction).value.cos();

        let wheel_to_center = initial_translation - wheel_position;
        let rho = wheel_to_center.rho();
        let radial = if rho.value > 0.0 {
            AngularVelocity::from(
                linear_velocity * (wheel_to_center.theta() - wheel_direction).value.sin() / rho,
            )
        } else {
            // A wheel at the center has no lever arm.
            AngularVelocity::default()
        };

        (forward, radial)
    }

    /// Normalize each wheel's max-spin forward and radial contributions by
    /// the largest respective magnitude across all wheels.
    fn compute_wheel_speed_adjustment_factors(
        initial_translation: Cartesian,
        initial_rotation: Angle,
        wheels: &BTreeMap<String, Wheel>,
    ) -> BTreeMap<String, (f64, f64)> {
        let rates: BTreeMap<&String, (Velocity, AngularVelocity)> = wheels
            .iter()
            .map(|(name, wheel)| {
                (
                    name,
                    Self::rates_of_change(
                        initial_translation,
                        initial_rotation,
                        wheel.initial_position(),
                        wheel.initial_direction(),
                        Velocity::from(
                            wheel.max_angular_velocity_magnitude() * wheel.radius(),
                        ),
                    ),
                )
            })
            .collect();

        let mut max_forward = Velocity::default();
        let mut max_radial = AngularVelocity::default();
        for (forward, radial) in rates.values() {
            if forward.abs() > max_forward {
                max_forward = forward.abs();
            }
            if radial.abs() > max_radial {
                max_radial = radial.abs();
            }
        }

        rates
            .into_iter()
            .map(|(name, (forward, radial))| {
                let forward_factor = if max_forward.value > 0.0 {
                    (forward / max_forward).value
                } else {
                    0.0
                };
                let radial_factor = if max_radial.value > 0.0 {
                    (radial / max_radial).value
                } else {
                    0.0
                };
                debug_assert!((-1.0..=1.0).contains(&forward_factor));
                debug_assert!((-1.0..=1.0).contains(&radial_factor));
                (name.clone(), (forward_factor, radial_factor))
            })
            .collect()
    }

    /// Factors `(a, b)` scaling the forward and turn components so that the
    /// mouse travels `arc_length` while rotating 90 degrees.
    fn compute_curve_turn_factors(
        initial_translation: Cartesian,
        initial_rotation: Angle,
        wheels: &BTreeMap<String, Wheel>,
        adjustment_factors: &BTreeMap<String, (f64, f64)>,
        arc_length: Length,
    ) -> (f64, f64) {
        let mut total_forward = Velocity::default();
        let mut total_radial = AngularVelocity::default();
        for (name, wheel) in wheels {
            let max_linear =
                Velocity::from(wheel.max_angular_velocity_magnitude() * wheel.radius());
            let (forward_factor, turn_factor) = adjustment_factors[name];
            for factor in [forward_factor, turn_factor] {
                let (forward, radial) = Self::rates_of_change(
                    initial_translation,
                    initial_rotation,
                    wheel.initial_position(),
                    wheel.initial_direction(),
                    max_linear * factor,
                );
                total_forward += forward;
                total_radial += radial;
            }
        }

        if total_forward.value.abs() == 0.0 {
            return (0.0, 1.0);
        }
        let b = 1.0;
        let a = (arc_length.value / std::f64::consts::FRAC_PI_2)
            * (total_radial.value / total_forward.value);
        (a, b)
    }

    /// Advance the pose by `elapsed`, then refresh every sensor.
    ///
    /// Wheel rotation accumulates from the pre-tick speeds; the translation
    /// update uses the freshly updated rotation.
    pub fn update(&mut self, elapsed: Time, maze: &Maze, params: &SimParams) {
        let mut sum_forward = Velocity::default();
        let mut sum_radial = AngularVelocity::default();

        for wheel in self.wheels.values_mut() {
            wheel.update_rotation(Angle::from(wheel.angular_velocity() * elapsed));
            let linear = Velocity::from(wheel.angular_velocity() * wheel.radius());
            let (forward, radial) = Self::rates_of_change(
                self.initial_translation,
                self.initial_rotation,
                wheel.initial_position(),
                wheel.initial_direction(),
                linear,
            );
            sum_forward += forward;
            sum_radial += radial;
        }

        let count = self.wheels.len() as f64;
        let forward = sum_forward / count;
        let radial = sum_radial / count;

        self.current_rotation += Angle::from(radial * elapsed);
        let (sin_th, cos_th) = self.current_rotation.value.sin_cos();
        self.current_translation += Cartesian::new(
            forward * cos_th * elapsed,
            forward * sin_th * elapsed,
        );
        self.current_gyro = radial;
        self.elapsed_sim_time += elapsed;

        let translation_delta = self.current_translation - self.initial_translation;
        let rotation_delta = self.current_rotation - self.initial_rotation;
        let current_translation = self.current_translation;
        let tile_length = params.tile_length();
        for sensor in self.sensors.values_mut() {
            let position = rotate_vertex_around_point(
                sensor.initial_position() + translation_delta,
                rotation_delta,
                current_translation,
            );
            let direction = sensor.initial_direction() + rotation_delta;
            sensor.update_reading(position, direction, maze, tile_length);
        }
    }

    /// Set every wheel from a normalized linear combination of the forward
    /// and turn components. `|forward_factor| + |turn_factor|` is scaled to
    /// one, so no wheel can be commanded past its maximum.
    pub fn set_wheel_speeds_for_movement(
        &mut self,
        fraction_of_max_speed: f64,
        forward_factor: f64,
        turn_factor: f64,
    ) {
        debug_assert!((0.0..=1.0).contains(&fraction_of_max_speed));

        let factor_magnitude = forward_factor.abs() + turn_factor.abs();
        if factor_magnitude == 0.0 {
            self.stop_all_wheels();
            return;
        }
        let normalized_forward = forward_factor / factor_magnitude;
        let normalized_turn = turn_factor / factor_magnitude;
        debug_assert!(normalized_forward.abs() + normalized_turn.abs() <= 1.0 + 1e-12);

        for (name, wheel) in self.wheels.iter_mut() {
            let (forward_adjustment, turn_adjustment) = self.wheel_speed_adjustment_factors[name];
            let speed = wheel.max_angular_velocity_magnitude()
                * (fraction_of_max_speed
                    * (normalized_forward * forward_adjustment
                        + normalized_turn * turn_adjustment));
            // Guard against rounding pushing a wheel past its maximum.
            let max = wheel.max_angular_velocity_magnitude();
            let speed = if speed > max {
                max
            } else if speed < -max {
                -max
            } else {
                speed
            };
            wheel.set_angular_velocity(speed);
        }
    }

    pub fn set_wheel_speeds_for_move_forward(&mut self, fraction_of_max_speed: f64) {
        self.set_wheel_speeds_for_movement(fraction_of_max_speed, 1.0, 0.0);
    }

    pub fn set_wheel_speeds_for_turn_left(&mut self, fraction_of_max_speed: f64) {
        self.set_wheel_speeds_for_movement(fraction_of_max_speed, 0.0, 1.0);
    }

    pub fn set_wheel_speeds_for_turn_right(&mut self, fraction_of_max_speed: f64) {
        self.set_wheel_speeds_for_movement(fraction_of_max_speed, 0.0, -1.0);
    }

    pub fn set_wheel_speeds_for_curve_turn_left(&mut self, fraction_of_max_speed: f64) {
        let (a, b) = self.curve_turn_factors;
        self.set_wheel_speeds_for_movement(fraction_of_max_speed, a, b);
    }

    pub fn set_wheel_speeds_for_curve_turn_right(&mut self, fraction_of_max_speed: f64) {
        let (a, b) = self.curve_turn_factors;
        self.set_wheel_speeds_for_movement(fraction_of_max_speed, a, -b);
    }

    pub fn stop_all_wheels(&mut self) {
        for wheel in self.wheels.values_mut() {
            wheel.set_angular_velocity(AngularVelocity::default());
        }
    }

    pub fn has_wheel(&self, name: &str) -> bool {
        self.wheels.contains_key(name)
    }

    pub fn wheel(&self, name: &str) -> Option<&Wheel> {
        self.wheels.get(name)
    }

    pub fn wheel_mut(&mut self, name: &str) -> Option<&mut Wheel> {
        self.wheels.get_mut(name)
    }

    pub fn wheels(&self) -> &BTreeMap<String, Wheel> {
        &self.wheels
    }

    pub fn has_sensor(&self, name: &str) -> bool {
        self.sensors.contains_key(name)
    }

    pub fn sensor(&self, name: &str) -> Option<&Sensor> {
        self.sensors.get(name)
    }

    pub fn wheel_speed_adjustment_factors(&self) -> &BTreeMap<String, (f64, f64)> {
        &self.wheel_speed_adjustment_factors
    }

    pub fn curve_turn_factors(&self) -> (f64, f64) {
        self.curve_turn_factors
    }

    pub fn initial_translation(&self) -> Cartesian {
        self.initial_translation
    }

    pub fn initial_rotation(&self) -> Angle {
        self.initial_rotation
    }

    pub fn current_translation(&self) -> Cartesian {
        self.current_translation
    }

    pub fn current_rotation(&self) -> Angle {
        self.current_rotation
    }

    pub fn read_gyro(&self) -> AngularVelocity {
        self.current_gyro
    }

    pub fn elapsed_sim_time(&self) -> Time {
        self.elapsed_sim_time
    }

    pub fn teleport(&mut self, translation: Cartesian, rotation: Angle) {
        self.current_translation = translation;
        self.current_rotation = rotation;
    }

    pub fn reset_position(&mut self) {
        self.teleport(self.initial_translation, self.initial_rotation);
    }

    /// The tile currently containing the center of the mouse.
    pub fn current_discretized_translation(&self, params: &SimParams) -> (i32, i32) {
        let tile_length = params.tile_length();
        (
            (self.current_translation.x / tile_length).value.floor() as i32,
            (self.current_translation.y / tile_length).value.floor() as i32,
        )
    }

    /// The compass heading nearest the current rotation.
    pub fn current_discretized_rotation(&self) -> Direction {
        let quadrant = (zero_to_2pi(self.current_rotation + Angle::new::<degree>(45.0)).value
            / std::f64::consts::FRAC_PI_2)
            .floor() as i32;
        match quadrant {
            0 => Direction::East,
            1 => Direction::North,
            2 => Direction::West,
            _ => Direction::South,
        }
    }

    fn current_polygon(&self, initial: &Polygon) -> Polygon {
        initial
            .translate(self.current_translation - self.initial_translation)
            .rotate_around_point(
                self.current_rotation - self.initial_rotation,
                self.current_translation,
            )
    }

    pub fn current_body_polygon(&self) -> Polygon {
        self.current_polygon(&self.initial_body_polygon)
    }

    pub fn current_collision_polygon(&self) -> Polygon {
        self.current_polygon(&self.initial_collision_polygon)
    }

    pub fn current_center_of_mass_polygon(&self) -> Polygon {
        self.current_polygon(&self.initial_center_of_mass_polygon)
    }

    pub fn current_wheel_polygons(&self) -> Vec<Polygon> {
        self.wheels
            .values()
            .map(|wheel| self.current_polygon(wheel.initial_polygon()))
            .collect()
    }

    pub fn current_sensor_polygons(&self) -> Vec<Polygon> {
        self.sensors
            .values()
            .map(|sensor| self.current_polygon(sensor.initial_polygon()))
            .collect()
    }
}
