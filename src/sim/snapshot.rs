//! Read-only view of a session, handed to whatever renders or transmits it.
//!
//! Serialized field names are camelCase. `gridRows` uses one character per
//! cell: `P` player, `G` goal, `D` door, `#` solid, space for empty.

use std::fmt::Write as _;

use serde::Serialize;

use super::choice::ChoiceOption;
use super::level::LevelId;
use super::session::SessionStatus;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub level: LevelId,
    pub level_name: String,
    pub status: SessionStatus,
    pub tick: u64,
    pub player_x: i32,
    pub player_y: i32,
    pub vy: f64,
    pub grounded: bool,
    pub replaying: bool,
    pub tutorial_message: String,
    pub goal_reached: bool,
    /// Present only while the player stands on a door.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_choices: Option<Vec<ChoiceOption>>,
    pub grid_rows: Vec<String>,
}

impl SessionSnapshot {
    /// Plain-text frame: header, bordered grid, then tutorial and choice lines.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let width = self.grid_rows.first().map_or(0, |r| r.chars().count());

        let _ = writeln!(
            out,
            "Level {} - {}  tick {}  pos ({}, {})  vy {:.1}{}{}",
            self.level,
            self.level_name,
            self.tick,
            self.player_x,
            self.player_y,
            self.vy,
            if self.grounded { "  grounded" } else { "" },
            if self.replaying { "  [REPLAY]" } else { "" },
        );

        let border = format!("+{}+", "-".repeat(width));
        let _ = writeln!(out, "{border}");
        for row in &self.grid_rows {
            let _ = writeln!(out, "|{row}|");
        }
        let _ = writeln!(out, "{border}");

        if !self.tutorial_message.is_empty() {
            let _ = writeln!(out, "Tutorial: {}", self.tutorial_message);
        }
        if let Some(choices) = &self.pending_choices {
            for c in choices {
                let _ = writeln!(out, "  [{}] {}", c.id, c.text);
            }
        }
        match self.status {
            SessionStatus::InProgress => {}
            SessionStatus::LevelComplete => { let _ = writeln!(out, "*** Goal reached! ***"); }
            SessionStatus::Aborted => { let _ = writeln!(out, "Session aborted."); }
        }
        out
    }
}
