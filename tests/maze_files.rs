//! Path-level codec behavior: sniffing, loading, saving, and failure modes.

use std::fs;
use std::path::PathBuf;

use mousesim::maze::MazeError;
use mousesim::maze_file::{detect, load, save, MazeFileFormat};

struct TempDir(PathBuf);

impl TempDir {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "mousesim-{}-{}",
            name,
            std::process::id()
        ));
        fs::create_dir_all(&path).unwrap();
        Self(path)
    }

    fn file(&self, name: &str) -> PathBuf {
        self.0.join(name)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

const NUM_2X2: &str = include_str!("../mazes/maze2x2.num");
const MAP_3X3: &str = include_str!("../mazes/maze3x3.map");

#[test]
fn test_detect_by_content_not_extension() {
    let dir = TempDir::new("detect");

    let num = dir.file("a.maze");
    fs::write(&num, NUM_2X2).unwrap();
    assert_eq!(detect(&num), Ok(MazeFileFormat::Num));

    let map = dir.file("b.maze");
    fs::write(&map, MAP_3X3).unwrap();
    assert_eq!(detect(&map), Ok(MazeFileFormat::Map));

    let bin = dir.file("c.maze");
    fs::write(&bin, [0u8, 159, 146, 150]).unwrap();
    assert_eq!(detect(&bin), Ok(MazeFileFormat::Bin));
}

#[test]
fn test_load_and_save_round_trip() {
    let dir = TempDir::new("roundtrip");
    let source = dir.file("source.num");
    fs::write(&source, NUM_2X2).unwrap();

    let maze = load(&source).unwrap();
    let copy = dir.file("copy.num");
    save(&maze, &copy, MazeFileFormat::Num).unwrap();
    assert_eq!(load(&copy).unwrap(), maze);

    let as_map = dir.file("copy.map");
    save(&maze, &as_map, MazeFileFormat::Map).unwrap();
    assert_eq!(detect(&as_map), Ok(MazeFileFormat::Map));
    assert_eq!(load(&as_map).unwrap(), maze);
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new("missing");
    let path = dir.file("nope.num");
    assert_eq!(load(&path), Err(MazeError::NoSuchMazeFile(path)));
}

#[test]
fn test_empty_file() {
    let dir = TempDir::new("empty");
    let path = dir.file("empty.num");
    fs::write(&path, "").unwrap();
    assert_eq!(
        load(&path),
        Err(MazeError::MalformedMaze {
            reason: "maze file is empty".to_owned(),
            line: None,
        })
    );
}

#[test]
fn test_binary_load_unsupported() {
    let dir = TempDir::new("binary");
    let path = dir.file("maze.bin");
    fs::write(&path, [0u8, 159, 146, 150]).unwrap();
    assert_eq!(
        load(&path),
        Err(MazeError::MalformedMaze {
            reason: "binary maze files are not supported".to_owned(),
            line: None,
        })
    );
}

#[test]
fn test_binary_save_unsupported() {
    let dir = TempDir::new("binsave");
    let source = dir.file("source.num");
    fs::write(&source, NUM_2X2).unwrap();
    let maze = load(&source).unwrap();
    assert!(matches!(
        save(&maze, &dir.file("out.bin"), MazeFileFormat::Bin),
        Err(MazeError::SaveFailed { .. })
    ));
}

#[test]
fn test_load_reports_diagnostics_with_line_numbers() {
    let dir = TempDir::new("diagnostics");
    let path = dir.file("bad.num");
    fs::write(&path, "0 0 1 0 0 1\n0 0 1 0 0 1\n").unwrap();
    assert_eq!(
        load(&path),
        Err(MazeError::MalformedMaze {
            reason: "unexpected x and y values of 0 and 0".to_owned(),
            line: Some(2),
        })
    );
}
