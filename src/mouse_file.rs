//! Mouse description files.
//!
//! A description is TOML: a body polygon plus named wheels and sensors, all
//! in the mouse-local frame with the mouse centered at the origin facing
//! along the positive x axis.
//!
//! ```toml
//! [body]
//! vertices = [[-0.04, -0.03], [0.05, -0.03], [0.05, 0.03], [-0.04, 0.03]]
//!
//! [wheels.left]
//! position = [0.0, 0.035]
//! direction-deg = 0.0
//! diameter = 0.03
//! width = 0.01
//! max-speed-rpm = 300.0
//! encoder-type = "RELATIVE"
//! encoder-ticks-per-rev = 360.0
//!
//! [sensors.front]
//! position = [0.05, 0.0]
//! direction-deg = 0.0
//! radius = 0.003
//! fov-deg = 20.0
//! range = 0.12
//! read-duration-ms = 0
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MouseError {
    #[error("\"{0}\" is not a mouse file")]
    NoSuchMouseFile(std::path::PathBuf),
    #[error("malformed mouse: {0}")]
    MalformedMouse(String),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BodyDescription {
    pub vertices: Vec<[f64; 2]>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct WheelDescription {
    pub position: [f64; 2],
    pub direction_deg: f64,
    pub diameter: f64,
    pub width: f64,
    pub max_speed_rpm: f64,
    pub encoder_type: crate::wheel::EncoderType,
    pub encoder_ticks_per_rev: f64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct SensorDescription {
    pub position: [f64; 2],
    pub direction_deg: f64,
    pub radius: f64,
    pub fov_deg: f64,
    pub range: f64,
    pub read_duration_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MouseDescription {
    pub body: BodyDescription,
    #[serde(default)]
    pub wheels: BTreeMap<String, WheelDescription>,
    #[serde(default)]
    pub sensors: BTreeMap<String, SensorDescription>,
}

impl MouseDescription {
    pub fn from_file(path: &Path) -> Result<Self, MouseError> {
        if !path.is_file() {
            return Err(MouseError::NoSuchMouseFile(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)
            .map_err(|_| MouseError::NoSuchMouseFile(path.to_path_buf()))?;
        Self::from_str(&text)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Result<Self, MouseError> {
        let description: MouseDescription =
            toml::from_str(text).map_err(|e| MouseError::MalformedMouse(e.to_string()))?;
        description.validate()?;
        Ok(description)
    }

    fn validate(&self) -> Result<(), MouseError> {
        let malformed = |reason: String| Err(MouseError::MalformedMouse(reason));

        if self.body.vertices.len() < 3 {
            return malformed("body polygon needs at least three vertices".to_owned());
        }
        if self.wheels.is_empty() {
            return malformed("mouse needs at least one wheel".to_owned());
        }
        for (name, wheel) in &self.wheels {
            if wheel.diameter <= 0.0 || wheel.width <= 0.0 {
                return malformed(format!("wheel \"{}\" has nonpositive dimensions", name));
            }
            if wheel.max_speed_rpm < 0.0 {
                return malformed(format!("wheel \"{}\" has negative max speed", name));
            }
            if wheel.encoder_ticks_per_rev <= 0.0 {
                return malformed(format!(
                    "wheel \"{}\" has nonpositive encoder resolution",
                    name
                ));
            }
        }
        for (name, sensor) in &self.sensors {
            if sensor.radius <= 0.0 {
                return malformed(format!("sensor \"{}\" has nonpositive radius", name));
            }
            if sensor.range <= 0.0 {
                return malformed(format!("sensor \"{}\" has nonpositive range", name));
            }
            if sensor.fov_deg < 0.0 {
                return malformed(format!("sensor \"{}\" has negative field of view", name));
            }
        }
        Ok(())
    }
}
