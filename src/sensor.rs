//! Rangefinder sensors that read the maze by casting rays.

use uom::si::angle::radian;
use uom::si::f64::{Angle, Length, Time};
use uom::si::length::meter;

use crate::geometry::{Cartesian, Polygon};
use crate::maze::{Direction, Maze};

/// Rays sampled across the field of view; endpoints are included.
const NUM_RAYS: usize = 7;

const SENSOR_POLYGON_VERTICES: usize = 8;

/// Distance along a ray to the first wall crossing within `range`.
///
/// The ray walks the tile lattice; a wall is hit when either tile adjacent
/// to the crossed boundary claims it.
pub fn raycast(
    maze: &Maze,
    tile_length: Length,
    origin: Cartesian,
    direction: Angle,
    range: Length,
) -> Option<Length> {
    let tl = tile_length.get::<meter>();
    let (dy, dx) = direction.value.sin_cos();
    let ox = origin.x.get::<meter>();
    let oy = origin.y.get::<meter>();

    let mut tx = (ox / tl).floor() as i32;
    let mut ty = (oy / tl).floor() as i32;

    let (mut t_max_x, t_delta_x) = if dx > 0.0 {
        (((tx + 1) as f64 * tl - ox) / dx, tl / dx)
    } else if dx < 0.0 {
        ((tx as f64 * tl - ox) / dx, tl / -dx)
    } else {
        (f64::INFINITY, f64::INFINITY)
    };
    let (mut t_max_y, t_delta_y) = if dy > 0.0 {
        (((ty + 1) as f64 * tl - oy) / dy, tl / dy)
    } else if dy < 0.0 {
        ((ty as f64 * tl - oy) / dy, tl / -dy)
    } else {
        (f64::INFINITY, f64::INFINITY)
    };

    loop {
        let (t, crossed) = if t_max_x < t_max_y {
            (t_max_x, if dx > 0.0 { Direction::East } else { Direction::West })
        } else {
            (t_max_y, if dy > 0.0 { Direction::North } else { Direction::South })
        };
        if t > range.get::<meter>() {
            return None;
        }

        let (sx, sy) = crossed.offset();
        let (nx, ny) = (tx + sx, ty + sy);
        if maze.has_wall(tx, ty, crossed) || maze.has_wall(nx, ny, crossed.opposite()) {
            return Some(Length::new::<meter>(t));
        }

        if t_max_x < t_max_y {
            tx = nx;
            t_max_x += t_delta_x;
        } else {
            ty = ny;
            t_max_y += t_delta_y;
        }
    }
}

#[derive(Clone, Debug)]
pub struct Sensor {
    initial_position: Cartesian,
    initial_direction: Angle,
    half_width: Angle,
    range: Length,
    read_duration: Time,
    initial_polygon: Polygon,
    reading: f64,
}

impl Sensor {
    /// `position` and `direction` are in the world frame.
    pub fn new(
        position: Cartesian,
        direction: Angle,
        half_width: Angle,
        range: Length,
        read_duration: Time,
        radius: Length,
    ) -> Self {
        Self {
            initial_position: position,
            initial_direction: direction,
            half_width,
            range,
            read_duration,
            initial_polygon: Polygon::circle(position, radius, SENSOR_POLYGON_VERTICES),
            reading: 0.0,
        }
    }

    pub fn initial_position(&self) -> Cartesian {
        self.initial_position
    }

    pub fn initial_direction(&self) -> Angle {
        self.initial_direction
    }

    pub fn range(&self) -> Length {
        self.range
    }

    pub fn read_duration(&self) -> Time {
        self.read_duration
    }

    pub fn initial_polygon(&self) -> &Polygon {
        &self.initial_polygon
    }

    /// The last normalized reading: 0 means nothing within range, 1 means an
    /// obstacle at zero distance.
    pub fn read(&self) -> f64 {
        self.reading
    }

    /// Refresh the reading from `position` looking along `direction`.
    pub fn update_reading(
        &mut self,
        position: Cartesian,
        direction: Angle,
        maze: &Maze,
        tile_length: Length,
    ) {
        let mut nearest: Option<Length> = None;
        for ray in self.ray_directions(direction) {
            if let Some(distance) = raycast(maze, tile_length, position, ray, self.range) {
                nearest = Some(match nearest {
                    Some(previous) => previous.min(distance),
                    None => distance,
                });
            }
        }
        self.reading = match nearest {
            Some(distance) => (1.0 - (distance / self.range).value).clamp(0.0, 1.0),
            None => 0.0,
        };
    }

    fn ray_directions(&self, direction: Angle) -> Vec<Angle> {
        if self.half_width.value <= 0.0 {
            return vec![direction];
        }
        (0..NUM_RAYS)
            .map(|i| {
                let fraction = i as f64 / (NUM_RAYS - 1) as f64;
                direction - self.half_width
                    + Angle::new::<radian>(2.0 * self.half_width.value * fraction)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze_file::parse_num;
    use approx::assert_relative_eq;
    use uom::si::angle::degree;
    use uom::si::time::second;

    fn tile_length() -> Length {
        Length::new::<meter>(0.18)
    }

    fn center_of(x: f64, y: f64) -> Cartesian {
        Cartesian::new(
            tile_length() * (x + 0.5),
            tile_length() * (y + 0.5),
        )
    }

    #[test]
    fn test_raycast_hits_near_wall() {
        let maze = parse_num("0 0 1 1 1 1\n").unwrap();
        let distance = raycast(
            &maze,
            tile_length(),
            center_of(0.0, 0.0),
            Angle::new::<degree>(0.0),
            Length::new::<meter>(1.0),
        )
        .unwrap();
        assert_relative_eq!(distance.get::<meter>(), 0.09, epsilon = 1e-12);
    }

    #[test]
    fn test_raycast_passes_open_boundary() {
        // Two tiles with an open shared wall; the far east wall is two tiles out.
        let maze = parse_num("0 0 1 0 1 1\n1 0 1 1 1 0\n").unwrap();
        let distance = raycast(
            &maze,
            tile_length(),
            center_of(0.0, 0.0),
            Angle::new::<degree>(0.0),
            Length::new::<meter>(1.0),
        )
        .unwrap();
        assert_relative_eq!(distance.get::<meter>(), 0.27, epsilon = 1e-12);
    }

    #[test]
    fn test_raycast_respects_range() {
        let maze = parse_num("0 0 1 0 1 1\n1 0 1 1 1 0\n").unwrap();
        let hit = raycast(
            &maze,
            tile_length(),
            center_of(0.0, 0.0),
            Angle::new::<degree>(0.0),
            Length::new::<meter>(0.2),
        );
        assert_eq!(hit, None);
    }

    #[test]
    fn test_reading_normalization() {
        let maze = parse_num("0 0 1 1 1 1\n").unwrap();
        let mut sensor = Sensor::new(
            center_of(0.0, 0.0),
            Angle::new::<degree>(0.0),
            Angle::default(),
            Length::new::<meter>(0.12),
            Time::new::<second>(0.0),
            Length::new::<meter>(0.003),
        );
        sensor.update_reading(
            center_of(0.0, 0.0),
            Angle::new::<degree>(0.0),
            &maze,
            tile_length(),
        );
        assert_relative_eq!(sensor.read(), 0.25, epsilon = 1e-9);

        // Out of range leaves the reading at zero.
        let mut far = Sensor::new(
            center_of(0.0, 0.0),
            Angle::new::<degree>(0.0),
            Angle::default(),
            Length::new::<meter>(0.05),
            Time::new::<second>(0.0),
            Length::new::<meter>(0.003),
        );
        far.update_reading(
            center_of(0.0, 0.0),
            Angle::new::<degree>(0.0),
            &maze,
            tile_length(),
        );
        assert_relative_eq!(far.read(), 0.0);
    }

    #[test]
    fn test_fov_sees_side_wall_sooner() {
        let maze = parse_num("0 0 1 1 1 1\n").unwrap();
        // Near the north wall, looking east with a wide fan: a slanted ray
        // reaches the north wall before the straight ray reaches the east one.
        let position = Cartesian::new(tile_length() * 0.5, tile_length() - Length::new::<meter>(0.01));
        let mut wide = Sensor::new(
            position,
            Angle::new::<degree>(45.0),
            Angle::new::<degree>(45.0),
            Length::new::<meter>(0.12),
            Time::new::<second>(0.0),
            Length::new::<meter>(0.003),
        );
        wide.update_reading(position, Angle::new::<degree>(45.0), &maze, tile_length());
        assert!(wide.read() > 1.0 - 0.02 / 0.12);
    }
}
