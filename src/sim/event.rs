//! Events emitted during command and tick processing.
//! The outer layer drains these for logging, sound or UI feedback.

use crate::domain::entity::MoveKey;
use super::level::LevelId;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Moved { x: i32, y: i32 },
    Jumped,
    Landed { x: i32, y: i32 },
    Saved { depth: usize },
    Undone { depth: usize },
    ReplayStarted { frames: usize },
    ReplayFinished,
    TutorialAdvanced { step: MoveKey },
    TutorialCompleted,
    LevelLoaded { id: LevelId },
    GoalReached { id: LevelId },
    Aborted,
}
