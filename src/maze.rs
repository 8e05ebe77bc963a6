//! The true maze: a column-major tile grid with per-tile wall flags.

use thiserror::Error;
use uom::si::angle::degree;
use uom::si::f64::Angle;

/// A compass heading. `East` maps to 0 degrees, angles grow counterclockwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

pub const DIRECTIONS: [Direction; 4] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
];

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// The heading after a 90 degree counterclockwise turn.
    pub fn left(self) -> Direction {
        match self {
            Direction::North => Direction::West,
            Direction::West => Direction::South,
            Direction::South => Direction::East,
            Direction::East => Direction::North,
        }
    }

    /// The heading after a 90 degree clockwise turn.
    pub fn right(self) -> Direction {
        self.left().opposite()
    }

    pub fn angle(self) -> Angle {
        Angle::new::<degree>(match self {
            Direction::East => 0.0,
            Direction::North => 90.0,
            Direction::West => 180.0,
            Direction::South => 270.0,
        })
    }

    /// Tile-index offset of the adjacent tile in this direction.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }

    pub fn from_char(c: char) -> Option<Direction> {
        match c.to_ascii_lowercase() {
            'n' => Some(Direction::North),
            'e' => Some(Direction::East),
            's' => Some(Direction::South),
            'w' => Some(Direction::West),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Direction::North => 'n',
            Direction::East => 'e',
            Direction::South => 's',
            Direction::West => 'w',
        }
    }

    fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }
}

/// Wall flags of one tile, indexed by [`Direction`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BasicTile {
    walls: [bool; 4],
}

impl BasicTile {
    pub fn with_walls(north: bool, east: bool, south: bool, west: bool) -> Self {
        Self {
            walls: [north, east, south, west],
        }
    }

    pub fn wall(&self, direction: Direction) -> bool {
        self.walls[direction.index()]
    }

    pub fn set_wall(&mut self, direction: Direction, exists: bool) {
        self.walls[direction.index()] = exists;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MazeError {
    #[error("\"{0}\" is not a maze file")]
    NoSuchMazeFile(std::path::PathBuf),
    #[error("malformed maze: {reason}{}", display_line(.line))]
    MalformedMaze {
        reason: String,
        line: Option<usize>,
    },
    #[error("unable to save maze to \"{path}\": {reason}")]
    SaveFailed {
        path: std::path::PathBuf,
        reason: String,
    },
}

fn display_line(line: &Option<usize>) -> String {
    match line {
        Some(line) => format!(" (line {})", line),
        None => String::new(),
    }
}

impl MazeError {
    pub fn malformed(reason: impl Into<String>, line: impl Into<Option<usize>>) -> Self {
        Self::MalformedMaze {
            reason: reason.into(),
            line: line.into(),
        }
    }
}

/// A rectangular grid of tiles. Tile `(0, 0)` is the bottom-left; the outer
/// index is the column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Maze {
    tiles: Vec<Vec<BasicTile>>,
}

impl Maze {
    /// Build a maze from a column-major tile grid.
    ///
    /// Shared walls are symmetrized: a wall exists if either adjacent tile
    /// claims it. Columns of differing height are rejected.
    pub fn new(mut tiles: Vec<Vec<BasicTile>>) -> Result<Self, MazeError> {
        if tiles.is_empty() || tiles[0].is_empty() {
            return Err(MazeError::malformed("maze has no tiles", None));
        }
        let height = tiles[0].len();
        if tiles.iter().any(|column| column.len() != height) {
            return Err(MazeError::malformed("columns of differing height", None));
        }

        let width = tiles.len();
        for x in 0..width {
            for y in 0..height {
                if x + 1 < width {
                    let shared = tiles[x][y].wall(Direction::East)
                        || tiles[x + 1][y].wall(Direction::West);
                    tiles[x][y].set_wall(Direction::East, shared);
                    tiles[x + 1][y].set_wall(Direction::West, shared);
                }
                if y + 1 < height {
                    let shared = tiles[x][y].wall(Direction::North)
                        || tiles[x][y + 1].wall(Direction::South);
                    tiles[x][y].set_wall(Direction::North, shared);
                    tiles[x][y + 1].set_wall(Direction::South, shared);
                }
            }
        }

        Ok(Self { tiles })
    }

    pub fn width(&self) -> usize {
        self.tiles.len()
    }

    pub fn height(&self) -> usize {
        self.tiles[0].len()
    }

    pub fn tile_at(&self, x: usize, y: usize) -> Option<&BasicTile> {
        self.tiles.get(x).and_then(|column| column.get(y))
    }

    /// Whether the tile `(x, y)` has a wall in `direction`. Out-of-bounds
    /// tiles have no walls.
    pub fn has_wall(&self, x: i32, y: i32, direction: Direction) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        self.tile_at(x as usize, y as usize)
            .map(|tile| tile.wall(direction))
            .unwrap_or(false)
    }

    pub fn is_within(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width() && (y as usize) < self.height()
    }

    pub fn columns(&self) -> &[Vec<BasicTile>] {
        &self.tiles
    }
}
