//! Deterministic kinematic simulation of a micromouse in a grid maze.
//!
//! The crate is split into a continuous layer (pose integration, wheel
//! speeds, rangefinder sensors) and a discrete layer (tiles, headings,
//! walls) exposed to controllers through [`interface::MouseInterface`].

pub mod context;
pub mod geometry;
pub mod interface;
pub mod maze;
pub mod maze_file;
pub mod mouse;
pub mod mouse_file;
pub mod overlay;
pub mod sensor;
pub mod units;
pub mod wheel;
