//! The controller's belief overlay: colors, text, fog, declared distances,
//! and declared walls. None of it touches the true maze.

use std::collections::{BTreeMap, BTreeSet};

use crate::maze::Direction;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TileOverlay {
    pub color: Option<char>,
    pub text: String,
    pub foggy: bool,
    pub distance: Option<i32>,
}

/// Per-tile overlay state for a `width x height` maze.
#[derive(Clone, Debug)]
pub struct MazeOverlay {
    tiles: Vec<Vec<TileOverlay>>,
    declared_walls: BTreeMap<(i32, i32, Direction), bool>,
    tiles_with_color: BTreeSet<(usize, usize)>,
    tiles_with_text: BTreeSet<(usize, usize)>,
}

impl MazeOverlay {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            tiles: vec![vec![TileOverlay::default(); height]; width],
            declared_walls: BTreeMap::new(),
            tiles_with_color: BTreeSet::new(),
            tiles_with_text: BTreeSet::new(),
        }
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<&TileOverlay> {
        if x < 0 || y < 0 {
            return None;
        }
        self.tiles.get(x as usize).and_then(|column| column.get(y as usize))
    }

    fn tile_mut(&mut self, x: i32, y: i32) -> Option<&mut TileOverlay> {
        if x < 0 || y < 0 {
            return None;
        }
        self.tiles
            .get_mut(x as usize)
            .and_then(|column| column.get_mut(y as usize))
    }

    pub fn set_color(&mut self, x: i32, y: i32, color: char) {
        if let Some(tile) = self.tile_mut(x, y) {
            tile.color = Some(color);
            self.tiles_with_color.insert((x as usize, y as usize));
        }
    }

    pub fn clear_color(&mut self, x: i32, y: i32) {
        if let Some(tile) = self.tile_mut(x, y) {
            tile.color = None;
            self.tiles_with_color.remove(&(x as usize, y as usize));
        }
    }

    pub fn clear_all_color(&mut self) {
        for (x, y) in std::mem::take(&mut self.tiles_with_color) {
            self.tiles[x][y].color = None;
        }
    }

    pub fn set_text(&mut self, x: i32, y: i32, text: String) {
        if let Some(tile) = self.tile_mut(x, y) {
            tile.text = text;
            self.tiles_with_text.insert((x as usize, y as usize));
        }
    }

    pub fn clear_text(&mut self, x: i32, y: i32) {
        if let Some(tile) = self.tile_mut(x, y) {
            tile.text.clear();
            self.tiles_with_text.remove(&(x as usize, y as usize));
        }
    }

    pub fn clear_all_text(&mut self) {
        for (x, y) in std::mem::take(&mut self.tiles_with_text) {
            self.tiles[x][y].text.clear();
        }
    }

    pub fn set_fogginess(&mut self, x: i32, y: i32, foggy: bool) {
        if let Some(tile) = self.tile_mut(x, y) {
            tile.foggy = foggy;
        }
    }

    pub fn set_distance(&mut self, x: i32, y: i32, distance: Option<i32>) {
        if let Some(tile) = self.tile_mut(x, y) {
            tile.distance = distance;
        }
    }

    /// Record the controller's belief about one wall half.
    pub fn declare_wall(&mut self, x: i32, y: i32, direction: Direction, exists: bool) {
        self.declared_walls.insert((x, y, direction), exists);
    }

    pub fn undeclare_wall(&mut self, x: i32, y: i32, direction: Direction) {
        self.declared_walls.remove(&(x, y, direction));
    }

    pub fn declared_wall(&self, x: i32, y: i32, direction: Direction) -> Option<bool> {
        self.declared_walls.get(&(x, y, direction)).copied()
    }
}
