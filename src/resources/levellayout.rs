//! Data-driven level layouts.
//!
//! A level is a character grid plus a legend mapping characters to what
//! should appear in that cell: a player spawn point or an entity of some
//! [`EntityKind`]. [`Session::load_level`](crate::session::Session::load_level)
//! turns the cells into spawn registrations and `create_entity` calls.
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "offset_x": 0.0,
//!   "offset_y": 0.0,
//!   "cell_width": 1.0,
//!   "cell_height": 1.0,
//!   "grid": [
//!     "S...g..c",
//!     "========"
//!   ],
//!   "legend": {
//!     "S": { "type": "spawn_point" },
//!     "=": { "type": "entity", "kind": "Static" },
//!     "g": { "type": "entity", "kind": { "Enemy": "Grunt" }, "flip_x": true },
//!     "c": { "type": "entity", "kind": { "Item": "Coin" } },
//!     ".": null
//!   }
//! }
//! ```
//!
//! Row 0 is the top of the level. Physics is y-up, so rows further down the
//! grid get smaller y coordinates.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::components::kind::EntityKind;
use crate::error::SimResult;
use crate::math::Vec2;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LevelCell {
    SpawnPoint,
    Entity {
        kind: EntityKind,
        #[serde(default)]
        flip_x: bool,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LevelLayout {
    #[serde(default)]
    pub offset_x: f32,
    #[serde(default)]
    pub offset_y: f32,
    pub cell_width: f32,
    pub cell_height: f32,
    pub grid: Vec<String>,
    pub legend: FxHashMap<char, Option<LevelCell>>,
}

impl LevelLayout {
    pub fn load_from_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let file_content = std::fs::read_to_string(path)?;
        Self::from_json(&file_content)
    }

    pub fn from_json(text: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Iterate over all defined cells with their world-space centres.
    pub fn iter_cells(&self) -> impl Iterator<Item = (Vec2, &LevelCell)> {
        let rows = self.grid.len();
        self.grid.iter().enumerate().flat_map(move |(row, line)| {
            line.chars().enumerate().filter_map(move |(col, ch)| {
                let Some(Some(cell)) = self.legend.get(&ch) else {
                    return None;
                };
                let x = self.offset_x + (col as f32 * self.cell_width) + (self.cell_width * 0.5);
                let y = self.offset_y
                    + ((rows - 1 - row) as f32 * self.cell_height)
                    + (self.cell_height * 0.5);
                Some((Vec2::new(x, y), cell))
            })
        })
    }

    pub fn spawn_points(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.iter_cells()
            .filter(|(_, cell)| matches!(cell, LevelCell::SpawnPoint))
            .map(|(pos, _)| pos)
    }
}
