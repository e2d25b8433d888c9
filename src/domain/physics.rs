//! Player physics against a tile grid. Single source of truth for movement.
//!
//! ## Vertical step (once per tick)
//!
//!   1. Airborne → `vy += gravity`, then clamp to ±`max_fall`.
//!   2. `steps = round(|vy|)`, `dir = sign(vy)`.
//!   3. Move one tile at a time. The first blocked tile zeroes `vy`, grounds
//!      the player if moving down, and ends the loop. A tick can cover up to
//!      `round(max_fall)` tiles, but never passes through a solid tile.
//!   4. Support re-check, authoritative: solid below → grounded with `vy = 0`,
//!      otherwise airborne. Runs every tick, moving or not.
//!
//! ## Horizontal moves and jumps
//!
//! Not part of the tick. A move command shifts one column if the target cell
//! is free; a jump command only works while grounded.

use super::entity::PlayerState;
use super::grid::Grid;

pub const GRAVITY: f64 = 0.4;
pub const JUMP_VELOCITY: f64 = -2.0;
pub const MAX_FALL: f64 = 2.0;

/// Tunable physics constants. Negative velocity is upward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsParams {
    pub gravity: f64,
    pub jump_velocity: f64,
    pub max_fall: f64,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        PhysicsParams {
            gravity: GRAVITY,
            jump_velocity: JUMP_VELOCITY,
            max_fall: MAX_FALL,
        }
    }
}

/// What happened during one vertical step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Airborne → grounded transition.
    pub landed: bool,
    /// Hit a solid tile mid-step (ceiling or floor).
    pub bumped: bool,
}

// ══════════════════════════════════════════════════════════════
// Tick
// ══════════════════════════════════════════════════════════════

pub fn step(player: &mut PlayerState, grid: &Grid, params: &PhysicsParams) -> StepReport {
    let was_grounded = player.grounded;
    let limit = fall_limit(params);
    let mut report = StepReport::default();

    // Corrupted velocity (restored from a bad snapshot) is treated as rest
    if !player.vy.is_finite() {
        player.vy = 0.0;
    }

    if !player.grounded {
        let vy = player.vy + params.gravity;
        player.vy = if vy.is_finite() { vy.clamp(-limit, limit) } else { 0.0 };
    }

    let steps = player.vy.abs().round() as i32;
    let dir = if player.vy > 0.0 { 1 } else { -1 };

    for _ in 0..steps {
        let new_y = player.y.saturating_add(dir);
        if grid.is_blocked(player.x, new_y) {
            player.vy = 0.0;
            if dir > 0 {
                player.grounded = true;
            }
            report.bumped = true;
            break;
        }
        player.y = new_y;
    }

    // Standing check overrides whatever the substeps decided
    if grid.is_blocked(player.x, player.y.saturating_add(1)) {
        player.grounded = true;
        player.vy = 0.0;
    } else {
        player.grounded = false;
    }

    report.landed = !was_grounded && player.grounded;
    report
}

/// Speed cap in use. A NaN or negative `max_fall` reads as `MAX_FALL`.
fn fall_limit(params: &PhysicsParams) -> f64 {
    if params.max_fall.is_finite() && params.max_fall >= 0.0 {
        params.max_fall
    } else {
        MAX_FALL
    }
}

// ══════════════════════════════════════════════════════════════
// Commands
// ══════════════════════════════════════════════════════════════

/// Shift one column left (`dx < 0`) or right (`dx > 0`) if the target cell is
/// free. Returns whether the player moved.
pub fn try_move(player: &mut PlayerState, grid: &Grid, dx: i32) -> bool {
    let dx = dx.signum();
    let target = player.x.saturating_add(dx);
    if dx == 0 || grid.is_blocked(target, player.y) {
        return false;
    }
    player.x = target;
    true
}

/// Start a jump. Ignored (returns false) unless grounded.
pub fn try_jump(player: &mut PlayerState, params: &PhysicsParams) -> bool {
    if !player.grounded {
        return false;
    }
    player.vy = params.jump_velocity;
    player.grounded = false;
    true
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
