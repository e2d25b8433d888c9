//! Level definitions and the built-in catalog.
//!
//! A level is pure data (`LevelDef`): dimensions, spawn, platform spans,
//! goal, doors, tutorial steps and branch options. `LevelDef::build()` turns
//! it into fresh runtime pieces every time, so reloading a level id always
//! gives the same geometry.
//!
//! ## Built-in levels
//!
//!   1. Training Grounds: tutorial + door leading to a two-way choice
//!   2. Lava Level
//!   3. Ice Level

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::entity::{MoveKey, PlayerState};
use crate::domain::grid::Grid;
use super::choice::LevelChoice;
use super::tutorial::{TutorialGate, TutorialStep};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelId(pub u32);

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Horizontal solid span: `length` cells on `row` starting at `start`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub row: i32,
    pub start: i32,
    pub length: i32,
}

const fn span(row: i32, start: i32, length: i32) -> Span {
    Span { row, start, length }
}

#[derive(Clone, Debug)]
pub struct LevelDef {
    pub id: LevelId,
    pub name: String,
    pub width: i32,
    pub height: i32,
    pub spawn: (i32, i32),
    pub floor: bool,
    pub walls: bool,
    pub platforms: Vec<Span>,
    pub goal: Option<(i32, i32)>,
    pub doors: Vec<(i32, i32)>,
    pub tutorial: Vec<TutorialStep>,
    pub choice: LevelChoice,
}

/// Runtime pieces of a freshly loaded level.
pub struct LoadedLevel {
    pub grid: Grid,
    pub player: PlayerState,
    pub tutorial: TutorialGate,
    pub choice: LevelChoice,
}

impl LevelDef {
    /// Blank level of the given size: no geometry, spawn at the origin.
    pub fn new(id: LevelId, name: impl Into<String>, width: i32, height: i32) -> Self {
        LevelDef {
            id,
            name: name.into(),
            width,
            height,
            spawn: (0, 0),
            floor: false,
            walls: false,
            platforms: vec![],
            goal: None,
            doors: vec![],
            tutorial: vec![],
            choice: LevelChoice::none(),
        }
    }

    pub fn build(&self) -> LoadedLevel {
        let mut grid = Grid::new(self.width, self.height);
        if self.floor {
            grid.add_floor();
        }
        if self.walls {
            grid.add_walls();
        }
        for s in &self.platforms {
            grid.add_platform(s.row, s.start, s.length);
        }
        if let Some((x, y)) = self.goal {
            grid.set_goal(x, y);
        }
        for &(x, y) in &self.doors {
            grid.add_door(x, y);
        }

        LoadedLevel {
            grid,
            player: PlayerState::spawn(self.spawn.0, self.spawn.1),
            tutorial: TutorialGate::new(self.tutorial.clone()),
            choice: self.choice.clone(),
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Catalog
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default)]
pub struct LevelCatalog {
    levels: BTreeMap<LevelId, LevelDef>,
}

impl LevelCatalog {
    pub fn new() -> Self {
        LevelCatalog::default()
    }

    /// Add or replace a level.
    pub fn insert(&mut self, def: LevelDef) {
        self.levels.insert(def.id, def);
    }

    pub fn with_level(mut self, def: LevelDef) -> Self {
        self.insert(def);
        self
    }

    pub fn get(&self, id: LevelId) -> Option<&LevelDef> {
        self.levels.get(&id)
    }

    pub fn contains(&self, id: LevelId) -> bool {
        self.levels.contains_key(&id)
    }

    pub fn builtin() -> Self {
        LevelCatalog::new()
            .with_level(training_grounds())
            .with_level(lava_level())
            .with_level(ice_level())
    }
}

// ══════════════════════════════════════════════════════════════
// Built-in levels
// ══════════════════════════════════════════════════════════════

const WIDTH: i32 = 50;
const HEIGHT: i32 = 20;
const SPAWN: (i32, i32) = (5, 15);
const FLOOR_ROW: i32 = 18;

pub const TRAINING_GROUNDS: LevelId = LevelId(1);
pub const LAVA_LEVEL: LevelId = LevelId(2);
pub const ICE_LEVEL: LevelId = LevelId(3);

fn base(id: LevelId, name: &str) -> LevelDef {
    let mut def = LevelDef::new(id, name, WIDTH, HEIGHT);
    def.spawn = SPAWN;
    def.platforms.push(span(FLOOR_ROW, 0, WIDTH));
    def
}

fn training_grounds() -> LevelDef {
    let mut def = base(TRAINING_GROUNDS, "Training Grounds");
    def.platforms.extend([span(14, 10, 10), span(11, 23, 12)]);
    def.goal = Some((45, 17));
    def.doors.push((40, 17));
    def.tutorial = vec![
        TutorialStep::new("Welcome! Press 'right' to move.", MoveKey::Right),
        TutorialStep::new("Great! Now press 'left' to move back.", MoveKey::Left),
        TutorialStep::new("Press 'up' to jump!", MoveKey::Up),
    ];
    def.choice = LevelChoice::new("Choose your path")
        .with_option(1, "Enter the Lava Level", LAVA_LEVEL)
        .with_option(2, "Enter the Ice Level", ICE_LEVEL);
    def
}

fn lava_level() -> LevelDef {
    let mut def = base(LAVA_LEVEL, "Lava Level");
    def.platforms.extend([span(15, 5, 5), span(12, 15, 5), span(9, 25, 5)]);
    def.goal = Some((48, 5));
    def
}

fn ice_level() -> LevelDef {
    let mut def = base(ICE_LEVEL, "Ice Level");
    def.platforms.extend([span(14, 20, 20), span(10, 5, 10)]);
    def.goal = Some((5, 5));
    def
}
