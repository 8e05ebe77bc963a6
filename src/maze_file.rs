//! Maze file codec.
//!
//! Three wire formats are detected by content, never by extension:
//!
//! - the numeric form, one `x y n e s w` record per line, column-major;
//! - the map form, ASCII art with `+` at lattice corners;
//! - the binary form, detected but not loadable.
//!
//! The numeric form is authoritative and the only one enumerated here that
//! round-trips through [`save`].

use std::fs;
use std::path::Path;

use crate::maze::{BasicTile, Direction, Maze, MazeError, DIRECTIONS};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MazeFileFormat {
    Num,
    Map,
    Bin,
}

/// Sniff the format of a maze file, validating its content.
pub fn detect(path: &Path) -> Result<MazeFileFormat, MazeError> {
    let bytes = read_maze_file(path)?;
    match std::str::from_utf8(&bytes) {
        Err(_) => Ok(MazeFileFormat::Bin),
        Ok(text) => {
            if looks_like_map(text) {
                parse_map(text)?;
                Ok(MazeFileFormat::Map)
            } else {
                parse_num(text)?;
                Ok(MazeFileFormat::Num)
            }
        }
    }
}

/// Load a maze, sniffing the format first.
pub fn load(path: &Path) -> Result<Maze, MazeError> {
    let bytes = read_maze_file(path)?;
    match std::str::from_utf8(&bytes) {
        Err(_) => Err(MazeError::malformed(
            "binary maze files are not supported",
            None,
        )),
        Ok(text) => {
            if looks_like_map(text) {
                parse_map(text)
            } else {
                parse_num(text)
            }
        }
    }
}

/// Save a maze in the requested format. The binary form is write-unsupported.
pub fn save(maze: &Maze, path: &Path, format: MazeFileFormat) -> Result<(), MazeError> {
    let contents = match format {
        MazeFileFormat::Num => write_num(maze),
        MazeFileFormat::Map => write_map(maze),
        MazeFileFormat::Bin => {
            return Err(MazeError::SaveFailed {
                path: path.to_path_buf(),
                reason: "binary maze files are not supported".to_owned(),
            })
        }
    };
    fs::write(path, contents).map_err(|e| MazeError::SaveFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn read_maze_file(path: &Path) -> Result<Vec<u8>, MazeError> {
    if !path.is_file() {
        return Err(MazeError::NoSuchMazeFile(path.to_path_buf()));
    }
    let bytes =
        fs::read(path).map_err(|_| MazeError::NoSuchMazeFile(path.to_path_buf()))?;
    if bytes.is_empty() {
        return Err(MazeError::malformed("maze file is empty", None));
    }
    Ok(bytes)
}

fn looks_like_map(text: &str) -> bool {
    text.lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim_start().starts_with('+'))
        .unwrap_or(false)
}

/// Parse the numeric form.
///
/// Records must be sorted by x then y, starting at `(0, 0)`, with neither
/// coordinate ever skipping a value; every deviation is reported with its
/// line number.
pub fn parse_num(text: &str) -> Result<Maze, MazeError> {
    let mut columns: Vec<Vec<BasicTile>> = Vec::new();
    let mut expected_x: i64 = 0;
    let mut expected_y: i64 = 0;

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 6 {
            return Err(MazeError::malformed(
                format!("expected six entries but found {}", tokens.len()),
                line_number,
            ));
        }

        let mut values = [0i64; 6];
        for (position, token) in tokens.iter().enumerate() {
            values[position] = token.parse().map_err(|_| {
                MazeError::malformed(
                    format!(
                        "entry \"{}\" in position {} is not numeric",
                        token,
                        position + 1
                    ),
                    line_number,
                )
            })?;
        }

        for (position, &value) in values.iter().enumerate().skip(2) {
            if value != 0 && value != 1 {
                return Err(MazeError::malformed(
                    format!(
                        "invalid wall value {} in position {}, walls must be 0 or 1",
                        value,
                        position + 1
                    ),
                    line_number,
                ));
            }
        }

        let (x, y) = (values[0], values[1]);
        if x == expected_x && y == expected_y {
            expected_y += 1;
        } else if x == expected_x + 1 && y == 0 && expected_y != 0 {
            expected_x += 1;
            expected_y = 1;
        } else {
            return Err(MazeError::malformed(
                format!("unexpected x and y values of {} and {}", x, y),
                line_number,
            ));
        }

        if x as usize == columns.len() {
            columns.push(Vec::new());
        }
        columns[x as usize].push(BasicTile::with_walls(
            values[2] == 1,
            values[3] == 1,
            values[4] == 1,
            values[5] == 1,
        ));
    }

    if columns.is_empty() {
        return Err(MazeError::malformed("maze file is empty", None));
    }
    Maze::new(columns)
}

/// Parse the map form.
///
/// Corner lines alternate with cell lines; any non-space character in a wall
/// slot marks the wall present. Rows are read top-down and flipped so that
/// `y = 0` ends up at the bottom. Trailing whitespace is ignored.
pub fn parse_map(text: &str) -> Result<Maze, MazeError> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 3 || lines.len() % 2 == 0 {
        return Err(MazeError::malformed(
            "map maze must alternate corner and cell lines",
            lines.len(),
        ));
    }

    let first = lines[0].trim_end();
    if !first.starts_with('+') {
        return Err(MazeError::malformed("corner line must start with `+`", 1));
    }
    let width = first.len() / 4;
    if width == 0 || first.len() != 4 * width + 1 {
        return Err(MazeError::malformed(
            "corner line length must be one more than a multiple of four",
            1,
        ));
    }
    let height = lines.len() / 2;

    let at = |line: &str, index: usize| line.as_bytes().get(index).copied().unwrap_or(b' ');
    let horizontal_wall = |line: &str, x: usize| {
        (4 * x + 1..4 * x + 4).any(|index| at(line, index) != b' ')
    };

    let mut columns = vec![vec![BasicTile::default(); height]; width];
    for row in 0..height {
        let corner_above = lines[2 * row];
        let cell = lines[2 * row + 1];
        let corner_below = lines[2 * row + 2];
        let y = height - row - 1;
        for (x, column) in columns.iter_mut().enumerate() {
            let tile = &mut column[y];
            tile.set_wall(Direction::North, horizontal_wall(corner_above, x));
            tile.set_wall(Direction::South, horizontal_wall(corner_below, x));
            tile.set_wall(Direction::West, at(cell, 4 * x) != b' ');
            tile.set_wall(Direction::East, at(cell, 4 * x + 4) != b' ');
        }
    }

    Maze::new(columns)
}

/// Write the numeric form: column-major records, walls in N E S W order,
/// single-space separators.
pub fn write_num(maze: &Maze) -> String {
    let mut out = String::new();
    for (x, column) in maze.columns().iter().enumerate() {
        for (y, tile) in column.iter().enumerate() {
            out.push_str(&format!("{} {}", x, y));
            for direction in DIRECTIONS {
                out.push_str(if tile.wall(direction) { " 1" } else { " 0" });
            }
            out.push('\n');
        }
    }
    out
}

/// Write the map form.
pub fn write_map(maze: &Maze) -> String {
    let mut out = String::new();
    for y in (0..maze.height()).rev() {
        for x in 0..maze.width() {
            out.push_str(if maze.has_wall(x as i32, y as i32, Direction::North) {
                "+---"
            } else {
                "+   "
            });
        }
        out.push_str("+\n");

        let mut cell = String::new();
        cell.push(if maze.has_wall(0, y as i32, Direction::West) {
            '|'
        } else {
            ' '
        });
        for x in 0..maze.width() {
            cell.push_str("   ");
            cell.push(if maze.has_wall(x as i32, y as i32, Direction::East) {
                '|'
            } else {
                ' '
            });
        }
        out.push_str(cell.trim_end());
        out.push('\n');
    }
    for x in 0..maze.width() {
        out.push_str(if maze.has_wall(x as i32, 0, Direction::South) {
            "+---"
        } else {
            "+   "
        });
    }
    out.push_str("+\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const NUM_2X2: &str = include_str!("../mazes/maze2x2.num");
    const MAP_3X3: &str = include_str!("../mazes/maze3x3.map");

    #[test]
    fn test_parse_num_happy() {
        let maze = parse_num(NUM_2X2).unwrap();
        assert_eq!(maze.width(), 2);
        assert_eq!(maze.height(), 2);

        // Tile (1, 0) claims its west wall, so symmetrization raises the
        // shared wall on both sides.
        assert!(maze.has_wall(0, 0, Direction::North));
        assert!(maze.has_wall(0, 0, Direction::East));
        assert!(!maze.has_wall(0, 0, Direction::South));
        assert!(maze.has_wall(0, 0, Direction::West));
        assert!(maze.has_wall(1, 0, Direction::West));
        assert!(maze.has_wall(0, 1, Direction::South));
    }

    #[test]
    fn test_wall_symmetry_all_tiles() {
        for maze in [parse_num(NUM_2X2).unwrap(), parse_map(MAP_3X3).unwrap()] {
            for x in 0..maze.width() as i32 {
                for y in 0..maze.height() as i32 {
                    for direction in DIRECTIONS {
                        let (dx, dy) = direction.offset();
                        if maze.is_within(x + dx, y + dy) {
                            assert_eq!(
                                maze.has_wall(x, y, direction),
                                maze.has_wall(x + dx, y + dy, direction.opposite()),
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_parse_num_rejects_duplicate() {
        let result = parse_num("0 0 1 0 0 1\n0 0 1 0 0 1\n");
        assert_eq!(
            result,
            Err(MazeError::malformed("unexpected x and y values of 0 and 0", 2))
        );
    }

    #[test]
    fn test_parse_num_rejects_skipped_column() {
        let result = parse_num("0 0 1 0 0 1\n2 0 1 0 0 1\n");
        assert_eq!(
            result,
            Err(MazeError::malformed("unexpected x and y values of 2 and 0", 2))
        );
    }

    #[test]
    fn test_parse_num_rejects_wrong_token_count() {
        let result = parse_num("0 0 1 0 0\n");
        assert_eq!(
            result,
            Err(MazeError::malformed("expected six entries but found 5", 1))
        );
    }

    #[test]
    fn test_parse_num_rejects_non_numeric() {
        let result = parse_num("0 0 1 x 0 1\n");
        assert_eq!(
            result,
            Err(MazeError::malformed(
                "entry \"x\" in position 4 is not numeric",
                1
            ))
        );
    }

    #[test]
    fn test_parse_num_rejects_non_binary_wall() {
        let result = parse_num("0 0 1 0 0 2\n");
        assert_eq!(
            result,
            Err(MazeError::malformed(
                "invalid wall value 2 in position 6, walls must be 0 or 1",
                1
            ))
        );
    }

    #[test]
    fn test_parse_num_ragged_maze_rejected() {
        // Column 0 has two tiles, column 1 has one.
        let result = parse_num("0 0 0 0 0 0\n0 1 0 0 0 0\n1 0 0 0 0 0\n");
        assert_eq!(
            result,
            Err(MazeError::malformed("columns of differing height", None))
        );
    }

    #[test]
    fn test_num_round_trip() {
        let maze = parse_num(NUM_2X2).unwrap();
        let rewritten = write_num(&maze);
        assert_eq!(parse_num(&rewritten).unwrap(), maze);
    }

    #[test]
    fn test_parse_map() {
        let maze = parse_map(MAP_3X3).unwrap();
        assert_eq!(maze.width(), 3);
        assert_eq!(maze.height(), 3);

        // Perimeter walls.
        for i in 0..3 {
            assert!(maze.has_wall(i, 2, Direction::North));
            assert!(maze.has_wall(i, 0, Direction::South));
            assert!(maze.has_wall(0, i, Direction::West));
            assert!(maze.has_wall(2, i, Direction::East));
        }

        // Interior walls: y = 0 is the bottom row of the drawing.
        assert!(maze.has_wall(1, 2, Direction::South));
        assert!(maze.has_wall(0, 1, Direction::East));
        assert!(maze.has_wall(2, 1, Direction::South));
        assert!(maze.has_wall(0, 0, Direction::East));
        assert!(!maze.has_wall(1, 0, Direction::East));
        assert!(!maze.has_wall(1, 1, Direction::East));
    }

    #[test]
    fn test_map_round_trip() {
        let maze = parse_map(MAP_3X3).unwrap();
        let rewritten = write_map(&maze);
        assert_eq!(parse_map(&rewritten).unwrap(), maze);
    }

    #[test]
    fn test_parse_map_tolerates_trailing_whitespace() {
        let padded: String = MAP_3X3
            .lines()
            .map(|line| format!("{}   \n", line))
            .collect();
        assert_eq!(parse_map(&padded).unwrap(), parse_map(MAP_3X3).unwrap());
    }

    #[test]
    fn test_parse_map_rejects_truncated() {
        let truncated: String = MAP_3X3.lines().take(4).collect::<Vec<_>>().join("\n");
        assert!(matches!(
            parse_map(&truncated),
            Err(MazeError::MalformedMaze { .. })
        ));
    }

    #[test]
    fn test_looks_like_map() {
        assert!(looks_like_map(MAP_3X3));
        assert!(!looks_like_map(NUM_2X2));
    }
}
