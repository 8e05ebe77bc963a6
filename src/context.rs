//! Simulation parameters, shared runtime state, and the tick thread.
//!
//! Parameters are an immutable record loaded at startup; runtime state
//! (paused, sim speed, shutdown, input buttons, the RNG) is a small shared
//! cell with its own lock, passed explicitly instead of living in globals.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde::Deserialize;
use thiserror::Error;
use typed_builder::TypedBuilder;
use uom::si::f64::{Length, Time};
use uom::si::length::meter;
use uom::si::time::second;

use crate::maze::Maze;
use crate::mouse::Mouse;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ParamsError {
    #[error("\"{0}\" is not a parameters file")]
    NoSuchParamsFile(PathBuf),
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
}

fn default_wall_length() -> Length {
    Length::new::<meter>(0.168)
}

fn default_wall_width() -> Length {
    Length::new::<meter>(0.012)
}

fn default_sim_tick_hz() -> f64 {
    1000.0
}

fn default_initial_sim_speed() -> f64 {
    1.0
}

/// Fixed parameters of one simulation run. Lengths are in meters.
#[derive(Clone, Debug, PartialEq, Deserialize, TypedBuilder)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct SimParams {
    #[builder(default = default_wall_length())]
    #[serde(default = "default_wall_length")]
    pub wall_length: Length,
    #[builder(default = default_wall_width())]
    #[serde(default = "default_wall_width")]
    pub wall_width: Length,
    #[builder(default = default_sim_tick_hz())]
    #[serde(default = "default_sim_tick_hz")]
    pub sim_tick_hz: f64,
    #[builder(default = default_initial_sim_speed())]
    #[serde(default = "default_initial_sim_speed")]
    pub initial_sim_speed: f64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SimParams {
    pub fn from_file(path: &Path) -> Result<Self, ParamsError> {
        let text = std::fs::read_to_string(path)
            .map_err(|_| ParamsError::NoSuchParamsFile(path.to_path_buf()))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ParamsError> {
        let params: SimParams =
            toml::from_str(text).map_err(|e| ParamsError::InvalidParams(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> Result<(), ParamsError> {
        if self.wall_length.value <= 0.0 {
            return Err(ParamsError::InvalidParams(
                "wall-length must be positive".to_owned(),
            ));
        }
        if self.wall_width.value < 0.0 {
            return Err(ParamsError::InvalidParams(
                "wall-width must not be negative".to_owned(),
            ));
        }
        if self.sim_tick_hz <= 0.0 {
            return Err(ParamsError::InvalidParams(
                "sim-tick-hz must be positive".to_owned(),
            ));
        }
        if self.initial_sim_speed <= 0.0 {
            return Err(ParamsError::InvalidParams(
                "initial-sim-speed must be positive".to_owned(),
            ));
        }
        Ok(())
    }

    /// Side length of one tile, wall included.
    pub fn tile_length(&self) -> Length {
        self.wall_length + self.wall_width
    }

    pub fn tick_period(&self) -> Time {
        Time::new::<second>(1.0 / self.sim_tick_hz)
    }
}

#[derive(Debug)]
struct SharedState {
    paused: bool,
    sim_speed: f64,
    shutdown: bool,
    pressed_buttons: BTreeSet<i32>,
    rng: Pcg64Mcg,
}

/// Shared runtime state for one simulation.
#[derive(Debug)]
pub struct SimContext {
    params: SimParams,
    shared: Mutex<SharedState>,
    tick_signal: Condvar,
}

impl SimContext {
    pub fn new(params: SimParams, seed: u64) -> Self {
        let sim_speed = params.initial_sim_speed;
        Self {
            params,
            shared: Mutex::new(SharedState {
                paused: false,
                sim_speed,
                shutdown: false,
                pressed_buttons: BTreeSet::new(),
                rng: Pcg64Mcg::seed_from_u64(seed),
            }),
            tick_signal: Condvar::new(),
        }
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn paused(&self) -> bool {
        self.shared.lock().paused
    }

    pub fn set_paused(&self, paused: bool) {
        self.shared.lock().paused = paused;
    }

    pub fn sim_speed(&self) -> f64 {
        self.shared.lock().sim_speed
    }

    pub fn set_sim_speed(&self, sim_speed: f64) {
        if sim_speed <= 0.0 {
            log::warn!("ignoring nonpositive sim speed {}", sim_speed);
            return;
        }
        self.shared.lock().sim_speed = sim_speed;
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.lock().shutdown
    }

    /// Request shutdown and wake every blocked waiter.
    pub fn request_shutdown(&self) {
        self.shared.lock().shutdown = true;
        self.tick_signal.notify_all();
    }

    /// Uniform in [0, 1), reproducible for a fixed seed.
    pub fn next_random(&self) -> f64 {
        self.shared.lock().rng.gen::<f64>()
    }

    pub fn press_input_button(&self, button: i32) {
        self.shared.lock().pressed_buttons.insert(button);
    }

    pub fn input_button_pressed(&self, button: i32) -> bool {
        self.shared.lock().pressed_buttons.contains(&button)
    }

    pub fn acknowledge_input_button(&self, button: i32) {
        self.shared.lock().pressed_buttons.remove(&button);
    }

    /// Wake everything blocked on the simulated clock.
    pub fn notify_tick(&self) {
        self.tick_signal.notify_all();
    }

    /// Block until the next tick notification or the timeout, whichever
    /// comes first.
    pub fn wait_for_tick(&self, timeout: Duration) {
        let mut shared = self.shared.lock();
        if shared.shutdown {
            return;
        }
        let _ = self.tick_signal.wait_for(&mut shared, timeout);
    }
}

/// Spawn the integrator tick thread.
///
/// The thread steps the mouse at the configured tick rate, paced in real
/// time by the sim-speed factor, and exits promptly after
/// [`SimContext::request_shutdown`].
pub fn spawn_ticker(
    context: Arc<SimContext>,
    mouse: Arc<Mutex<Mouse>>,
    maze: Arc<Maze>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let period = context.params().tick_period();
        loop {
            if context.is_shutdown() {
                break;
            }
            if !context.paused() {
                mouse.lock().update(period, &maze, context.params());
                context.notify_tick();
            }
            let speed = context.sim_speed();
            thread::sleep(Duration::from_secs_f64(
                period.get::<second>() / speed,
            ));
        }
    })
}
