//! The dual discrete/continuous controller API.
//!
//! Every operation belongs to exactly one group: any-interface, continuous,
//! discrete, or omniscience. Calling an operation from the wrong group is a
//! controller programming error and surfaces as [`InterfaceError`]; clamping
//! and filtering problems only warn.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use typed_builder::TypedBuilder;
use uom::si::angle::degree;
use uom::si::angular_velocity::{degree_per_second, revolution_per_minute};
use uom::si::f64::AngularVelocity;
use uom::si::length::meter;
use uom::si::time::millisecond;

use crate::context::SimContext;
use crate::geometry::Cartesian;
use crate::maze::{Direction, Maze};
use crate::mouse::Mouse;
use crate::overlay::MazeOverlay;
use crate::units::zero_to_2pi;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterfaceType {
    Discrete,
    Continuous,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeripheralKind {
    Wheel,
    Sensor,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InterfaceError {
    #[error("\"{op}\" requires the {required:?} interface")]
    WrongInterfaceType {
        op: &'static str,
        required: InterfaceType,
    },
    #[error("\"{op}\" requires omniscience to be allowed")]
    OmniscienceForbidden { op: &'static str },
    #[error("no such {kind:?} \"{name}\"")]
    NoSuchPeripheral {
        kind: PeripheralKind,
        name: String,
    },
    #[error("cancelled by shutdown")]
    Cancelled,
}

fn default_tile_text_characters() -> BTreeSet<char> {
    (' '..='~').collect()
}

#[derive(Clone, Debug, TypedBuilder)]
pub struct InterfaceOptions {
    pub interface_type: InterfaceType,
    #[builder(default = false)]
    pub allow_omniscience: bool,
    #[builder(default = true)]
    pub declare_walls_on_read: bool,
    #[builder(default = default_tile_text_characters())]
    pub allowable_tile_text_characters: BTreeSet<char>,
}

/// The surface a controller drives the simulation through.
pub struct MouseInterface {
    maze: Arc<Maze>,
    mouse: Arc<Mutex<Mouse>>,
    overlay: Arc<Mutex<MazeOverlay>>,
    context: Arc<SimContext>,
    options: InterfaceOptions,
}

impl MouseInterface {
    pub fn new(
        maze: Arc<Maze>,
        mouse: Arc<Mutex<Mouse>>,
        overlay: Arc<Mutex<MazeOverlay>>,
        context: Arc<SimContext>,
        options: InterfaceOptions,
    ) -> Self {
        Self {
            maze,
            mouse,
            overlay,
            context,
            options,
        }
    }

    fn ensure_discrete(&self, op: &'static str) -> Result<(), InterfaceError> {
        if self.options.interface_type != InterfaceType::Discrete {
            return Err(InterfaceError::WrongInterfaceType {
                op,
                required: InterfaceType::Discrete,
            });
        }
        Ok(())
    }

    fn ensure_continuous(&self, op: &'static str) -> Result<(), InterfaceError> {
        if self.options.interface_type != InterfaceType::Continuous {
            return Err(InterfaceError::WrongInterfaceType {
                op,
                required: InterfaceType::Continuous,
            });
        }
        Ok(())
    }

    fn ensure_omniscience(&self, op: &'static str) -> Result<(), InterfaceError> {
        if !self.options.allow_omniscience {
            return Err(InterfaceError::OmniscienceForbidden { op });
        }
        Ok(())
    }

    // ----- Any-interface operations ----- //

    pub fn debug(&self, message: &str) {
        log::debug!("{}", message);
    }

    pub fn info(&self, message: &str) {
        log::info!("{}", message);
    }

    pub fn warn(&self, message: &str) {
        log::warn!("{}", message);
    }

    pub fn error(&self, message: &str) {
        log::error!("{}", message);
    }

    /// Uniform in [0, 1), reproducible for a fixed seed.
    pub fn get_random(&self) -> f64 {
        self.context.next_random()
    }

    /// Milliseconds of simulated time that have passed.
    pub fn millis(&self) -> u64 {
        self.mouse.lock().elapsed_sim_time().get::<millisecond>() as u64
    }

    /// Block until the simulated clock advances by `milliseconds`.
    pub fn delay(&self, milliseconds: u64) -> Result<(), InterfaceError> {
        let target = self.millis() + milliseconds;
        loop {
            if self.context.is_shutdown() {
                return Err(InterfaceError::Cancelled);
            }
            if self.millis() >= target {
                return Ok(());
            }
            self.context.wait_for_tick(Duration::from_millis(1));
        }
    }

    pub fn quit(&self) {
        self.context.request_shutdown();
    }

    pub fn set_tile_color(&self, x: i32, y: i32, color: char) {
        if !self.check_tile(x, y) {
            return;
        }
        self.overlay.lock().set_color(x, y, color);
    }

    pub fn clear_tile_color(&self, x: i32, y: i32) {
        if !self.check_tile(x, y) {
            return;
        }
        self.overlay.lock().clear_color(x, y);
    }

    pub fn clear_all_tile_color(&self) {
        self.overlay.lock().clear_all_color();
    }

    /// Characters outside the allowable set are dropped with a warning.
    pub fn set_tile_text(&self, x: i32, y: i32, text: &str) {
        if !self.check_tile(x, y) {
            return;
        }
        let mut filtered = String::new();
        for c in text.chars() {
            if self.options.allowable_tile_text_characters.contains(&c) {
                filtered.push(c);
            } else {
                log::warn!("tile text character {:?} is not allowed", c);
            }
        }
        self.overlay.lock().set_text(x, y, filtered);
    }

    pub fn clear_tile_text(&self, x: i32, y: i32) {
        if !self.check_tile(x, y) {
            return;
        }
        self.overlay.lock().clear_text(x, y);
    }

    pub fn clear_all_tile_text(&self) {
        self.overlay.lock().clear_all_text();
    }

    /// Record a wall belief; the opposing half, if it exists, mirrors it.
    pub fn declare_wall(&self, x: i32, y: i32, direction: char, wall_exists: bool) {
        let Some(direction) = self.check_wall(x, y, direction) else {
            return;
        };
        let mut overlay = self.overlay.lock();
        overlay.declare_wall(x, y, direction, wall_exists);
        if let Some((ox, oy, od)) = self.opposing_wall(x, y, direction) {
            overlay.declare_wall(ox, oy, od, wall_exists);
        }
    }

    pub fn undeclare_wall(&self, x: i32, y: i32, direction: char) {
        let Some(direction) = self.check_wall(x, y, direction) else {
            return;
        };
        let mut overlay = self.overlay.lock();
        overlay.undeclare_wall(x, y, direction);
        if let Some((ox, oy, od)) = self.opposing_wall(x, y, direction) {
            overlay.undeclare_wall(ox, oy, od);
        }
    }

    pub fn set_tile_fogginess(&self, x: i32, y: i32, foggy: bool) {
        if !self.check_tile(x, y) {
            return;
        }
        self.overlay.lock().set_fogginess(x, y, foggy);
    }

    /// A negative distance means infinity and is shown as "inf".
    pub fn declare_tile_distance(&self, x: i32, y: i32, distance: i32) {
        if !self.check_tile(x, y) {
            return;
        }
        let mut overlay = self.overlay.lock();
        overlay.set_distance(x, y, Some(distance));
        let text = if distance >= 0 {
            distance.to_string()
        } else {
            "inf".to_owned()
        };
        overlay.set_text(x, y, text);
    }

    pub fn undeclare_tile_distance(&self, x: i32, y: i32) {
        if !self.check_tile(x, y) {
            return;
        }
        let mut overlay = self.overlay.lock();
        overlay.set_distance(x, y, None);
        overlay.clear_text(x, y);
    }

    pub fn reset_position(&self) {
        self.mouse.lock().reset_position();
    }

    pub fn input_button_pressed(&self, button: i32) -> bool {
        self.context.input_button_pressed(button)
    }

    pub fn acknowledge_input_button_pressed(&self, button: i32) {
        self.context.acknowledge_input_button(button);
    }

    // ----- Continuous operations ----- //

    /// Max wheel speed magnitude, in rpm.
    pub fn get_wheel_max_speed(&self, name: &str) -> Result<f64, InterfaceError> {
        self.ensure_continuous("get_wheel_max_speed")?;
        let mouse = self.mouse.lock();
        let wheel = mouse.wheel(name).ok_or_else(|| no_such_wheel(name))?;
        Ok(wheel
            .max_angular_velocity_magnitude()
            .get::<revolution_per_minute>())
    }

    /// Set one wheel's speed, in rpm; values past the maximum are clamped
    /// with a warning.
    pub fn set_wheel_speed(&self, name: &str, rpm: f64) -> Result<(), InterfaceError> {
        self.ensure_continuous("set_wheel_speed")?;
        let mut mouse = self.mouse.lock();
        let wheel = mouse.wheel(name).ok_or_else(|| no_such_wheel(name))?;
        let max = wheel
            .max_angular_velocity_magnitude()
            .get::<revolution_per_minute>();
        let mut rpm = rpm;
        if rpm.abs() > max {
            log::warn!(
                "clamping wheel \"{}\" speed {} rpm to the maximum of {} rpm",
                name,
                rpm,
                max
            );
            rpm = rpm.clamp(-max, max);
        }
        mouse
            .wheel_mut(name)
            .expect("Should never fail: existence was just checked.")
            .set_angular_velocity(AngularVelocity::new::<revolution_per_minute>(rpm));
        Ok(())
    }

    pub fn get_wheel_encoder_ticks_per_revolution(
        &self,
        name: &str,
    ) -> Result<f64, InterfaceError> {
        self.ensure_continuous("get_wheel_encoder_ticks_per_revolution")?;
        let mouse = self.mouse.lock();
        let wheel = mouse.wheel(name).ok_or_else(|| no_such_wheel(name))?;
        Ok(wheel.encoder_ticks_per_revolution())
    }

    pub fn read_wheel_encoder(&self, name: &str) -> Result<i32, InterfaceError> {
        self.ensure_continuous("read_wheel_encoder")?;
        let mouse = self.mouse.lock();
        let wheel = mouse.wheel(name).ok_or_else(|| no_such_wheel(name))?;
        Ok(match wheel.encoder_type() {
            crate::wheel::EncoderType::Absolute => wheel.read_absolute_encoder(),
            crate::wheel::EncoderType::Relative => wheel.read_relative_encoder(),
        })
    }

    /// Reset a relative encoder to zero; absolute encoders only warn.
    pub fn reset_wheel_encoder(&self, name: &str) -> Result<(), InterfaceError> {
        self.ensure_continuous("reset_wheel_encoder")?;
        let mut mouse = self.mouse.lock();
        let wheel = mouse.wheel(name).ok_or_else(|| no_such_wheel(name))?;
        if wheel.encoder_type() != crate::wheel::EncoderType::Relative {
            log::warn!("wheel \"{}\" does not have a relative encoder", name);
            return Ok(());
        }
        mouse
            .wheel_mut(name)
            .expect("Should never fail: existence was just checked.")
            .reset_relative_encoder();
        Ok(())
    }

    /// Normalized reading in [0, 1], available after the sensor's read
    /// duration of simulated time.
    pub fn read_sensor(&self, name: &str) -> Result<f64, InterfaceError> {
        self.ensure_continuous("read_sensor")?;
        let read_duration = {
            let mouse = self.mouse.lock();
            let sensor = mouse.sensor(name).ok_or_else(|| no_such_sensor(name))?;
            sensor.read_duration()
        };
        let milliseconds = read_duration.get::<millisecond>();
        if milliseconds > 0.0 {
            self.delay(milliseconds as u64)?;
        }
        let mouse = self.mouse.lock();
        Ok(mouse.sensor(name).map(|sensor| sensor.read()).unwrap_or(0.0))
    }

    /// Rotation rate in degrees per second.
    pub fn read_gyro(&self) -> Result<f64, InterfaceError> {
        self.ensure_continuous("read_gyro")?;
        Ok(self.mouse.lock().read_gyro().get::<degree_per_second>())
    }

    // ----- Discrete operations ----- //

    pub fn wall_front(&self) -> Result<bool, InterfaceError> {
        self.ensure_discrete("wall_front")?;
        let ((x, y), direction) = self.discretized_pose();
        Ok(self.is_wall(x, y, direction))
    }

    pub fn wall_left(&self) -> Result<bool, InterfaceError> {
        self.ensure_discrete("wall_left")?;
        let ((x, y), direction) = self.discretized_pose();
        Ok(self.is_wall(x, y, direction.left()))
    }

    pub fn wall_right(&self) -> Result<bool, InterfaceError> {
        self.ensure_discrete("wall_right")?;
        let ((x, y), direction) = self.discretized_pose();
        Ok(self.is_wall(x, y, direction.right()))
    }

    /// Snap the mouse forward `count` tiles, stopping early at a wall.
    pub fn move_forward(&self, count: u32) -> Result<(), InterfaceError> {
        self.ensure_discrete("move_forward")?;
        for _ in 0..count {
            if self.context.is_shutdown() {
                return Err(InterfaceError::Cancelled);
            }
            let ((x, y), direction) = self.discretized_pose();
            if self.maze.has_wall(x, y, direction) {
                log::warn!("wall in front of tile ({}, {}), not moving", x, y);
                return Ok(());
            }
            let tile_length = self.context.params().tile_length();
            let (dx, dy) = direction.offset();
            let mut mouse = self.mouse.lock();
            let translation = mouse.current_translation()
                + Cartesian::new(tile_length * dx as f64, tile_length * dy as f64);
            mouse.teleport(translation, direction.angle());
        }
        Ok(())
    }

    pub fn turn_left(&self, count: u32) -> Result<(), InterfaceError> {
        self.ensure_discrete("turn_left")?;
        self.snap_turns(count, Direction::left)
    }

    pub fn turn_right(&self, count: u32) -> Result<(), InterfaceError> {
        self.ensure_discrete("turn_right")?;
        self.snap_turns(count, Direction::right)
    }

    pub fn turn_around(&self, count: u32) -> Result<(), InterfaceError> {
        self.ensure_discrete("turn_around")?;
        self.snap_turns(count, Direction::opposite)
    }

    // ----- Omniscience operations ----- //

    pub fn current_x_tile(&self) -> Result<i32, InterfaceError> {
        self.ensure_omniscience("current_x_tile")?;
        Ok(self.discretized_pose().0 .0)
    }

    pub fn current_y_tile(&self) -> Result<i32, InterfaceError> {
        self.ensure_omniscience("current_y_tile")?;
        Ok(self.discretized_pose().0 .1)
    }

    pub fn current_direction(&self) -> Result<char, InterfaceError> {
        self.ensure_omniscience("current_direction")?;
        Ok(self.discretized_pose().1.to_char())
    }

    pub fn current_x_pos_meters(&self) -> Result<f64, InterfaceError> {
        self.ensure_omniscience("current_x_pos_meters")?;
        Ok(self.mouse.lock().current_translation().x.get::<meter>())
    }

    pub fn current_y_pos_meters(&self) -> Result<f64, InterfaceError> {
        self.ensure_omniscience("current_y_pos_meters")?;
        Ok(self.mouse.lock().current_translation().y.get::<meter>())
    }

    pub fn current_rotation_degrees(&self) -> Result<f64, InterfaceError> {
        self.ensure_omniscience("current_rotation_degrees")?;
        Ok(zero_to_2pi(self.mouse.lock().current_rotation()).get::<degree>())
    }

    // ----- Helpers ----- //

    fn check_tile(&self, x: i32, y: i32) -> bool {
        if !self.maze.is_within(x, y) {
            log::warn!("tile ({}, {}) is outside the maze", x, y);
            return false;
        }
        true
    }

    fn check_wall(&self, x: i32, y: i32, direction: char) -> Option<Direction> {
        if !self.check_tile(x, y) {
            return None;
        }
        let parsed = Direction::from_char(direction);
        if parsed.is_none() {
            log::warn!("{:?} is not a direction", direction);
        }
        parsed
    }

    fn opposing_wall(&self, x: i32, y: i32, direction: Direction) -> Option<(i32, i32, Direction)> {
        let (dx, dy) = direction.offset();
        let (ox, oy) = (x + dx, y + dy);
        if self.maze.is_within(ox, oy) {
            Some((ox, oy, direction.opposite()))
        } else {
            None
        }
    }

    fn discretized_pose(&self) -> ((i32, i32), Direction) {
        let mouse = self.mouse.lock();
        (
            mouse.current_discretized_translation(self.context.params()),
            mouse.current_discretized_rotation(),
        )
    }

    fn is_wall(&self, x: i32, y: i32, direction: Direction) -> bool {
        let exists = self.maze.has_wall(x, y, direction);
        if self.options.declare_walls_on_read {
            let mut overlay = self.overlay.lock();
            overlay.declare_wall(x, y, direction, exists);
            if let Some((ox, oy, od)) = self.opposing_wall(x, y, direction) {
                overlay.declare_wall(ox, oy, od, exists);
            }
        }
        exists
    }

    fn snap_turns(
        &self,
        count: u32,
        next: impl Fn(Direction) -> Direction,
    ) -> Result<(), InterfaceError> {
        for _ in 0..count {
            if self.context.is_shutdown() {
                return Err(InterfaceError::Cancelled);
            }
            let (_, direction) = self.discretized_pose();
            let mut mouse = self.mouse.lock();
            let translation = mouse.current_translation();
            mouse.teleport(translation, next(direction).angle());
        }
        Ok(())
    }
}

fn no_such_wheel(name: &str) -> InterfaceError {
    InterfaceError::NoSuchPeripheral {
        kind: PeripheralKind::Wheel,
        name: name.to_owned(),
    }
}

fn no_such_sensor(name: &str) -> InterfaceError {
    InterfaceError::NoSuchPeripheral {
        kind: PeripheralKind::Sensor,
        name: name.to_owned(),
    }
}
