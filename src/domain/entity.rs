//! Player state and the logical commands that drive a session.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::SessionError;

/// Player physics state. `Copy` on purpose: every history container stores
/// its own value, never a reference to the live state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PlayerState {
    pub x: i32,
    pub y: i32,
    /// Vertical velocity in tiles per tick. Negative = up.
    pub vy: f64,
    pub grounded: bool,
}

impl PlayerState {
    /// Fresh player at a spawn point: at rest and grounded.
    /// The first tick re-checks support, so a spawn in mid-air just falls.
    pub fn spawn(x: i32, y: i32) -> Self {
        PlayerState { x, y, vy: 0.0, grounded: true }
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }
}

/// Movement-class inputs. These are the only inputs a tutorial gates.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveKey {
    Left,
    Right,
    Up,
}

impl MoveKey {
    pub fn as_str(self) -> &'static str {
        match self {
            MoveKey::Left  => "left",
            MoveKey::Right => "right",
            MoveKey::Up    => "up",
        }
    }

    /// Horizontal offset, or `None` for the jump key.
    pub fn dx(self) -> Option<i32> {
        match self {
            MoveKey::Left  => Some(-1),
            MoveKey::Right => Some(1),
            MoveKey::Up    => None,
        }
    }
}

/// A discrete logical command from the outside world.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Move(MoveKey),
    Save,
    Undo,
    StartReplay,
    Choose(u32),
    Reset,
    Quit,
}

impl Command {
    /// Parse a wire key plus the optional choice id that accompanies `choose`.
    ///
    /// Accepted keys: `left`, `right`, `up` (alias `jump`), `save`, `undo`,
    /// `replay` (aliases `start-replay`, `startReplay`), `choose`, `reset`,
    /// `quit`. Matching is ASCII case-insensitive.
    pub fn parse(key: &str, choice: Option<u32>) -> Result<Command, SessionError> {
        let key = key.trim();
        let cmd = match key.to_ascii_lowercase().as_str() {
            "left"  => Command::Move(MoveKey::Left),
            "right" => Command::Move(MoveKey::Right),
            "up" | "jump" => Command::Move(MoveKey::Up),
            "save"  => Command::Save,
            "undo"  => Command::Undo,
            "replay" | "start-replay" | "startreplay" => Command::StartReplay,
            "choose" => match choice {
                Some(id) => Command::Choose(id),
                None => return Err(SessionError::InvalidCommand(key.to_string())),
            },
            "reset" => Command::Reset,
            "quit" | "exit" => Command::Quit,
            _ => return Err(SessionError::InvalidCommand(key.to_string())),
        };
        Ok(cmd)
    }

    /// Is this a movement-class input (subject to tutorial gating)?
    pub fn move_key(self) -> Option<MoveKey> {
        match self {
            Command::Move(k) => Some(k),
            _ => None,
        }
    }
}

/// Line form: `<key> [choice-id]`, e.g. `right` or `choose 2`.
impl FromStr for Command {
    type Err = SessionError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let key = parts.next().unwrap_or("");
        let choice = match parts.next() {
            Some(raw) => Some(
                raw.parse::<u32>()
                    .map_err(|_| SessionError::InvalidCommand(line.trim().to_string()))?,
            ),
            None => None,
        };
        if parts.next().is_some() {
            return Err(SessionError::InvalidCommand(line.trim().to_string()));
        }
        Command::parse(key, choice)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Move(k)     => f.write_str(k.as_str()),
            Command::Save        => f.write_str("save"),
            Command::Undo        => f.write_str("undo"),
            Command::StartReplay => f.write_str("replay"),
            Command::Choose(id)  => write!(f, "choose {id}"),
            Command::Reset       => f.write_str("reset"),
            Command::Quit        => f.write_str("quit"),
        }
    }
}
