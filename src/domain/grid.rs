//! Tile grid for one level.
//!
//! ## Coordinates
//!
//! `(x, y)` with `x` growing right and `y` growing DOWN (row 0 is the top).
//! Queries take signed coordinates so that a step off any edge can be asked
//! about directly; anything out of bounds reads as `Tile::Solid`, which keeps
//! the player inside the map without extra checks at call sites.
//!
//! ## Lifecycle
//!
//! The builder methods (`reset`, `add_platform`, `add_floor`, `add_walls`,
//! `set_goal`, `add_door`) are only used while a level is being constructed.
//! After that the grid is read-only until the next level load replaces it.

use super::tile::Tile;

#[derive(Clone, Debug)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Vec<Tile>>,
    goal: Option<(i32, i32)>,
    doors: Vec<(i32, i32)>,
}

// ── Queries ──

impl Grid {
    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    /// Tile at (x, y). Out of bounds = wall.
    #[inline]
    pub fn tile_at(&self, x: i32, y: i32) -> Tile {
        if self.in_bounds(x, y) {
            self.cells[y as usize][x as usize]
        } else {
            Tile::Solid
        }
    }

    /// Can the player NOT occupy (x, y)?
    #[inline]
    pub fn is_blocked(&self, x: i32, y: i32) -> bool {
        self.tile_at(x, y).is_solid()
    }

    pub fn is_door(&self, x: i32, y: i32) -> bool {
        self.doors.iter().any(|&(dx, dy)| dx == x && dy == y)
    }

    pub fn goal(&self) -> Option<(i32, i32)> {
        self.goal
    }

    /// Render rows with single-character tile codes. The goal position is
    /// always drawn as `G`; `player` (if given and in bounds) overrides as `P`.
    pub fn render_rows(&self, player: Option<(i32, i32)>) -> Vec<String> {
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| {
                        if player == Some((x, y)) {
                            'P'
                        } else if self.goal == Some((x, y)) {
                            Tile::Goal.glyph()
                        } else {
                            self.tile_at(x, y).glyph()
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

// ── Construction ──

impl Grid {
    /// Empty grid. Non-positive dimensions produce a 0×0 grid where every
    /// cell is out of bounds (and therefore blocked).
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Grid {
            width,
            height,
            cells: vec![vec![Tile::Empty; width as usize]; height as usize],
            goal: None,
            doors: vec![],
        }
    }

    /// Build from row strings using tile glyphs. Rows shorter than the first
    /// are padded with empty cells. `G` and `D` register goal/door positions.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as i32;
        let width = rows.first().map_or(0, |r| r.chars().count()) as i32;
        let mut grid = Grid::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate().take(width as usize) {
                let (x, y) = (x as i32, y as i32);
                match Tile::from_glyph(ch) {
                    Tile::Goal => grid.set_goal(x, y),
                    Tile::Door => grid.add_door(x, y),
                    tile => grid.set(x, y, tile),
                }
            }
        }
        grid
    }

    #[inline]
    fn set(&mut self, x: i32, y: i32, tile: Tile) {
        if self.in_bounds(x, y) {
            self.cells[y as usize][x as usize] = tile;
        }
    }

    /// Clear every cell, the goal and all doors. Dimensions are kept.
    pub fn reset(&mut self) {
        for row in &mut self.cells {
            row.fill(Tile::Empty);
        }
        self.goal = None;
        self.doors.clear();
    }

    /// Horizontal solid span on `row` starting at `start` for `length` cells.
    /// Cells past the right edge are dropped.
    pub fn add_platform(&mut self, row: i32, start: i32, length: i32) {
        for x in start..start.saturating_add(length.max(0)) {
            self.set(x, row, Tile::Solid);
        }
    }

    /// Solid bottom row.
    pub fn add_floor(&mut self) {
        self.add_platform(self.height - 1, 0, self.width);
    }

    /// Solid left and right columns.
    pub fn add_walls(&mut self) {
        for y in 0..self.height {
            self.set(0, y, Tile::Solid);
            self.set(self.width - 1, y, Tile::Solid);
        }
    }

    /// Place the single goal tile. A previous goal is cleared.
    /// The position is remembered even when out of bounds (it is then
    /// unreachable, never drawn).
    pub fn set_goal(&mut self, x: i32, y: i32) {
        if let Some((gx, gy)) = self.goal.take() {
            if self.tile_at(gx, gy) == Tile::Goal {
                self.set(gx, gy, Tile::Empty);
            }
        }
        self.goal = Some((x, y));
        self.set(x, y, Tile::Goal);
    }

    pub fn add_door(&mut self, x: i32, y: i32) {
        if !self.is_door(x, y) {
            self.doors.push((x, y));
        }
        self.set(x, y, Tile::Door);
    }
}
