//! Session: one running game, advanced by commands and ticks.
//!
//! ## Command processing (`apply_command`)
//!
//!   1. `quit` / `reset` are always honoured. `reset` goes back to the
//!      level the session started on.
//!   2. Anything else needs `InProgress` status and no running playback.
//!   3. Movement keys pass through the tutorial gate.
//!   4. The command runs. Moving commands re-check the goal.
//!
//! An `Err` means the command had no effect on any part of the session.
//!
//! ## Tick processing (`tick`)
//!
//!   - Playback running: the next recorded frame becomes the live player.
//!     When no frame is left, playback ends and the same tick falls
//!     through to normal processing.
//!   - Normal: physics step, record one frame, goal check.

use serde::Serialize;
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::domain::entity::{Command, MoveKey, PlayerState};
use crate::domain::grid::Grid;
use crate::domain::physics::{self, PhysicsParams};
use crate::error::SessionError;
use super::choice::LevelChoice;
use super::event::GameEvent;
use super::level::{LevelCatalog, LevelId, LoadedLevel};
use super::replay::{Playback, ReplayRecorder};
use super::save::SaveStack;
use super::snapshot::SessionSnapshot;
use super::tutorial::{GateResult, TutorialGate};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    InProgress,
    LevelComplete,
    Aborted,
}

#[derive(Clone, Debug)]
pub struct Session {
    params: PhysicsParams,
    catalog: LevelCatalog,
    start: LevelId,

    level: LevelId,
    level_name: String,
    grid: Grid,
    player: PlayerState,

    saves: SaveStack,
    recorder: ReplayRecorder,
    playback: Option<Playback>,
    tutorial: TutorialGate,
    choice: LevelChoice,

    status: SessionStatus,
    ticks: u64,
    events: Vec<GameEvent>,
}

impl Session {
    /// Start a session on level `start` of `catalog`.
    pub fn new(
        catalog: LevelCatalog,
        params: PhysicsParams,
        start: LevelId,
    ) -> Result<Self, SessionError> {
        let def = catalog.get(start).ok_or(SessionError::UnknownLevel(start))?;
        let level_name = def.name.clone();
        let LoadedLevel { grid, player, tutorial, choice } = def.build();
        info!(level = %start, name = %level_name, "level loaded");

        Ok(Session {
            params,
            catalog,
            start,
            level: start,
            level_name,
            grid,
            player,
            saves: SaveStack::new(),
            recorder: ReplayRecorder::new(),
            playback: None,
            tutorial,
            choice,
            status: SessionStatus::InProgress,
            ticks: 0,
            events: vec![GameEvent::LevelLoaded { id: start }],
        })
    }

    /// Built-in levels with the configured physics, start level and replay cap.
    pub fn from_config(config: &GameConfig) -> Result<Self, SessionError> {
        Ok(Session::new(LevelCatalog::builtin(), config.physics, config.session.start_level)?
            .with_replay_limit(config.session.replay_max_frames))
    }

    /// Cap the replay history at `max_frames` (0 = unbounded). Drops what was
    /// recorded so far.
    pub fn with_replay_limit(mut self, max_frames: usize) -> Self {
        self.recorder = ReplayRecorder::with_capacity_limit(max_frames);
        self
    }

    // ── Queries ──

    pub fn status(&self) -> SessionStatus { self.status }
    pub fn level(&self) -> LevelId { self.level }
    pub fn level_name(&self) -> &str { &self.level_name }
    pub fn player(&self) -> &PlayerState { &self.player }
    pub fn grid(&self) -> &Grid { &self.grid }
    pub fn ticks(&self) -> u64 { self.ticks }
    pub fn is_replaying(&self) -> bool { self.playback.is_some() }
    pub fn save_depth(&self) -> usize { self.saves.len() }
    pub fn recorded_frames(&self) -> usize { self.recorder.len() }
    pub fn tutorial_message(&self) -> &str { self.tutorial.current_message() }
    pub fn params(&self) -> &PhysicsParams { &self.params }

    /// Choices on offer right now: the level's options while the player
    /// stands on a door, `None` elsewhere.
    pub fn pending_choices(&self) -> Option<&LevelChoice> {
        let (x, y) = self.player.position();
        (self.grid.is_door(x, y) && !self.choice.is_empty()).then_some(&self.choice)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            level: self.level,
            level_name: self.level_name.clone(),
            status: self.status,
            tick: self.ticks,
            player_x: self.player.x,
            player_y: self.player.y,
            vy: self.player.vy,
            grounded: self.player.grounded,
            replaying: self.is_replaying(),
            tutorial_message: self.tutorial.current_message().to_string(),
            goal_reached: self.status == SessionStatus::LevelComplete,
            pending_choices: self.pending_choices().map(|c| c.options().to_vec()),
            grid_rows: self.grid.render_rows(Some(self.player.position())),
        }
    }

    /// Take all events queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // ══════════════════════════════════════════════════════════
    // Commands
    // ══════════════════════════════════════════════════════════

    pub fn apply_command(&mut self, cmd: Command) -> Result<SessionStatus, SessionError> {
        debug!(%cmd, "command");
        match cmd {
            Command::Quit => {
                if self.status != SessionStatus::Aborted {
                    self.status = SessionStatus::Aborted;
                    self.events.push(GameEvent::Aborted);
                    info!(level = %self.level, "session aborted");
                }
                return Ok(self.status);
            }
            Command::Reset => {
                self.load_level(self.start)?;
                return Ok(self.status);
            }
            _ => {}
        }

        if self.status != SessionStatus::InProgress {
            return Err(SessionError::NotInProgress(self.status));
        }
        if self.playback.is_some() {
            return Err(SessionError::PlaybackActive);
        }

        if let Some(key) = cmd.move_key() {
            self.pass_tutorial(key)?;
        }

        match cmd {
            Command::Move(MoveKey::Up) => {
                if physics::try_jump(&mut self.player, &self.params) {
                    self.events.push(GameEvent::Jumped);
                }
            }
            Command::Move(key) => {
                let dx = key.dx().unwrap_or(0);
                if physics::try_move(&mut self.player, &self.grid, dx) {
                    let (x, y) = self.player.position();
                    self.events.push(GameEvent::Moved { x, y });
                    self.check_goal();
                }
            }
            Command::Save => {
                self.saves.save(&self.player);
                self.events.push(GameEvent::Saved { depth: self.saves.len() });
            }
            Command::Undo => {
                self.player = self.saves.undo().ok_or(SessionError::EmptyHistory)?;
                self.events.push(GameEvent::Undone { depth: self.saves.len() });
                self.check_goal();
            }
            Command::StartReplay => {
                let playback = self.recorder.start_playback();
                info!(frames = playback.total(), "replay started");
                self.events.push(GameEvent::ReplayStarted { frames: playback.total() });
                self.playback = Some(playback);
            }
            Command::Choose(id) => {
                let target = self.choice.target_level(id).ok_or(SessionError::UnknownChoice(id))?;
                debug!(choice = id, target = %target, "choice taken");
                self.load_level(target)?;
            }
            Command::Reset | Command::Quit => {}
        }
        Ok(self.status)
    }

    /// Run `key` through the tutorial. Rejection leaves the gate untouched.
    fn pass_tutorial(&mut self, key: MoveKey) -> Result<(), SessionError> {
        match self.tutorial.check_progress(key) {
            GateResult::Open => {}
            GateResult::Advanced => {
                self.events.push(GameEvent::TutorialAdvanced { step: key });
            }
            GateResult::Completed => {
                self.events.push(GameEvent::TutorialAdvanced { step: key });
                self.events.push(GameEvent::TutorialCompleted);
                info!(level = %self.level, "tutorial completed");
            }
            GateResult::Rejected { expected } => {
                debug!(got = key.as_str(), expected = expected.as_str(), "tutorial gated");
                return Err(SessionError::TutorialGated { expected });
            }
        }
        Ok(())
    }

    // ══════════════════════════════════════════════════════════
    // Tick
    // ══════════════════════════════════════════════════════════

    pub fn tick(&mut self) -> SessionStatus {
        if self.status != SessionStatus::InProgress {
            return self.status;
        }
        self.ticks += 1;

        if let Some(playback) = self.playback.as_mut() {
            match playback.next_frame() {
                Some(frame) => {
                    self.player = frame;
                    return self.status;
                }
                None => {
                    self.playback = None;
                    self.events.push(GameEvent::ReplayFinished);
                    info!(tick = self.ticks, "replay finished");
                }
            }
        }

        let report = physics::step(&mut self.player, &self.grid, &self.params);
        if report.landed {
            let (x, y) = self.player.position();
            self.events.push(GameEvent::Landed { x, y });
        }
        self.recorder.record(&self.player);
        self.check_goal();
        self.status
    }

    // ══════════════════════════════════════════════════════════
    // Level transitions
    // ══════════════════════════════════════════════════════════

    /// Rebuild everything level-scoped from the catalog. Nothing changes
    /// if `id` is not in the catalog.
    fn load_level(&mut self, id: LevelId) -> Result<(), SessionError> {
        let def = self.catalog.get(id).ok_or(SessionError::UnknownLevel(id))?;
        let name = def.name.clone();
        let LoadedLevel { grid, player, tutorial, choice } = def.build();

        self.level = id;
        self.level_name = name;
        self.grid = grid;
        self.player = player;
        self.tutorial = tutorial;
        self.choice = choice;
        self.saves.clear();
        self.recorder.clear();
        self.playback = None;
        self.status = SessionStatus::InProgress;

        self.events.push(GameEvent::LevelLoaded { id });
        info!(level = %id, name = %self.level_name, "level loaded");
        Ok(())
    }

    fn check_goal(&mut self) {
        if self.grid.goal() == Some(self.player.position()) {
            self.status = SessionStatus::LevelComplete;
            self.events.push(GameEvent::GoalReached { id: self.level });
            info!(level = %self.level, tick = self.ticks, "goal reached");
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::{LevelDef, LAVA_LEVEL, TRAINING_GROUNDS};
    use crate::sim::tutorial::TutorialStep;

    const EPS: f64 = 1e-9;

    /// 10×5, solid bottom row, spawn (2,3).
    fn flat(id: u32) -> LevelDef {
        let mut def = LevelDef::new(LevelId(id), "flat", 10, 5);
        def.floor = true;
        def.spawn = (2, 3);
        def
    }

    fn session_on(def: LevelDef) -> Session {
        let id = def.id;
        Session::new(LevelCatalog::new().with_level(def), PhysicsParams::default(), id).unwrap()
    }

    fn builtin() -> Session {
        Session::new(LevelCatalog::builtin(), PhysicsParams::default(), TRAINING_GROUNDS).unwrap()
    }

    fn right() -> Command { Command::Move(MoveKey::Right) }
    fn left() -> Command { Command::Move(MoveKey::Left) }
    fn up() -> Command { Command::Move(MoveKey::Up) }

    // ── Physics through the session ──

    #[test]
    fn jump_scenario() {
        let mut s = session_on(flat(1));
        s.apply_command(up()).unwrap();
        assert_eq!(s.player().vy, -2.0);
        assert!(!s.player().grounded);

        s.tick();
        assert!((s.player().vy + 1.6).abs() < EPS);
        assert_eq!(s.player().y, 1);

        s.tick();
        assert!((s.player().vy + 1.2).abs() < EPS);
        assert_eq!(s.player().y, 0);
        assert!(!s.player().grounded);
    }

    #[test]
    fn jump_lands_back_on_floor() {
        let mut s = session_on(flat(1));
        s.apply_command(up()).unwrap();
        for _ in 0..20 {
            s.tick();
        }
        assert_eq!(s.player().position(), (2, 3));
        assert!(s.player().grounded);
        assert!(s.drain_events().contains(&GameEvent::Landed { x: 2, y: 3 }));
    }

    #[test]
    fn move_into_wall_is_silent() {
        let mut def = flat(1);
        def.walls = true;
        def.spawn = (1, 3);
        let mut s = session_on(def);
        s.drain_events();
        assert_eq!(s.apply_command(left()), Ok(SessionStatus::InProgress));
        assert_eq!(s.player().x, 1);
        assert!(s.drain_events().is_empty());
    }

    // ── Save / undo ──

    #[test]
    fn undo_on_empty_history() {
        let mut s = session_on(flat(1));
        let before = *s.player();
        assert_eq!(s.apply_command(Command::Undo), Err(SessionError::EmptyHistory));
        assert_eq!(*s.player(), before);
    }

    #[test]
    fn save_then_undo_restores() {
        let mut s = session_on(flat(1));
        s.apply_command(Command::Save).unwrap();
        let saved = *s.player();
        s.apply_command(right()).unwrap();
        s.apply_command(up()).unwrap();
        s.tick();
        s.apply_command(Command::Undo).unwrap();
        assert_eq!(*s.player(), saved);
        assert_eq!(s.apply_command(Command::Undo), Err(SessionError::EmptyHistory));
    }

    #[test]
    fn duplicate_saves_need_two_undos() {
        let mut s = session_on(flat(1));
        s.apply_command(Command::Save).unwrap();
        s.apply_command(Command::Save).unwrap();
        assert_eq!(s.save_depth(), 2);
        s.apply_command(Command::Undo).unwrap();
        s.apply_command(Command::Undo).unwrap();
        assert_eq!(s.save_depth(), 0);
    }

    // ── Replay ──

    #[test]
    fn replay_plays_recorded_ticks_in_order() {
        let mut s = session_on(flat(1));
        let mut recorded = vec![];
        for cmd in [right(), up(), right()] {
            let _ = s.apply_command(cmd);
            s.tick();
            recorded.push(*s.player());
        }
        assert_eq!(s.recorded_frames(), 3);

        s.apply_command(Command::StartReplay).unwrap();
        assert!(s.is_replaying());
        for frame in &recorded {
            s.tick();
            assert_eq!(s.player(), frame);
        }
        // Nothing new was recorded while playing back
        assert_eq!(s.recorded_frames(), 3);

        s.tick();
        assert!(!s.is_replaying());
        assert_eq!(s.recorded_frames(), 4);
        assert!(s.drain_events().contains(&GameEvent::ReplayFinished));
    }

    #[test]
    fn commands_refused_during_playback() {
        let mut s = session_on(flat(1));
        s.tick();
        s.apply_command(Command::StartReplay).unwrap();
        let before = *s.player();
        assert_eq!(s.apply_command(right()), Err(SessionError::PlaybackActive));
        assert_eq!(s.apply_command(Command::Save), Err(SessionError::PlaybackActive));
        assert_eq!(*s.player(), before);
        assert_eq!(s.save_depth(), 0);
    }

    #[test]
    fn empty_replay_ends_on_next_tick() {
        let mut s = session_on(flat(1));
        s.apply_command(Command::StartReplay).unwrap();
        s.tick();
        assert!(!s.is_replaying());
        assert_eq!(s.recorded_frames(), 1);
    }

    #[test]
    fn replay_limit_applies() {
        let mut s = session_on(flat(1)).with_replay_limit(2);
        for _ in 0..5 {
            s.tick();
        }
        assert_eq!(s.recorded_frames(), 2);
    }

    // ── Tutorial ──

    #[test]
    fn tutorial_gates_movement_only() {
        let mut s = builtin();
        assert_eq!(s.tutorial_message(), "Welcome! Press 'right' to move.");
        let before = *s.player();

        assert_eq!(
            s.apply_command(up()),
            Err(SessionError::TutorialGated { expected: MoveKey::Right })
        );
        assert_eq!(*s.player(), before);

        // Non-movement commands are never gated
        s.apply_command(Command::Save).unwrap();

        s.apply_command(right()).unwrap();
        assert_eq!(s.player().x, before.x + 1);
        assert_eq!(s.tutorial_message(), "Great! Now press 'left' to move back.");
        s.apply_command(left()).unwrap();
        s.apply_command(up()).unwrap();
        assert_eq!(s.tutorial_message(), "");
        assert!(s.drain_events().contains(&GameEvent::TutorialCompleted));

        // Gate is off for the rest of the level
        s.apply_command(left()).unwrap();
        s.apply_command(left()).unwrap();
    }

    #[test]
    fn custom_tutorial_rebuilt_on_reset() {
        let mut def = flat(1);
        def.tutorial = vec![TutorialStep::new("go left", MoveKey::Left)];
        let mut s = session_on(def);
        s.apply_command(left()).unwrap();
        assert_eq!(s.tutorial_message(), "");
        s.apply_command(Command::Reset).unwrap();
        assert_eq!(s.tutorial_message(), "go left");
    }

    #[test]
    fn reset_returns_to_start_level() {
        let mut s = builtin();
        s.apply_command(Command::Choose(1)).unwrap();
        assert_eq!(s.level(), LAVA_LEVEL);
        s.apply_command(right()).unwrap();

        assert_eq!(s.apply_command(Command::Reset), Ok(SessionStatus::InProgress));
        assert_eq!(s.level(), TRAINING_GROUNDS);
        assert_eq!(s.level_name(), "Training Grounds");
        assert_eq!(*s.player(), PlayerState::spawn(5, 15));
        assert_eq!(s.tutorial_message(), "Welcome! Press 'right' to move.");
    }

    #[test]
    fn reset_during_playback_drops_replay() {
        let mut s = session_on(flat(1));
        for _ in 0..3 {
            s.tick();
        }
        s.apply_command(Command::StartReplay).unwrap();
        s.tick();
        assert!(s.is_replaying());

        s.apply_command(Command::Reset).unwrap();
        assert!(!s.is_replaying());
        assert_eq!(s.recorded_frames(), 0);
        assert_eq!(s.apply_command(right()), Ok(SessionStatus::InProgress));
    }

    // ── Choices and level transitions ──

    #[test]
    fn unknown_choice_changes_nothing() {
        let mut s = builtin();
        s.apply_command(Command::Save).unwrap();
        let before = *s.player();
        assert_eq!(s.apply_command(Command::Choose(7)), Err(SessionError::UnknownChoice(7)));
        assert_eq!(s.level(), TRAINING_GROUNDS);
        assert_eq!(*s.player(), before);
        assert_eq!(s.save_depth(), 1);
    }

    #[test]
    fn choice_loads_target_and_resets_level_state() {
        let mut s = builtin();
        s.apply_command(Command::Save).unwrap();
        s.tick();
        s.drain_events();

        s.apply_command(Command::Choose(1)).unwrap();
        assert_eq!(s.level(), LAVA_LEVEL);
        assert_eq!(s.level_name(), "Lava Level");
        assert_eq!(*s.player(), PlayerState::spawn(5, 15));
        assert_eq!(s.save_depth(), 0);
        assert_eq!(s.recorded_frames(), 0);
        assert_eq!(s.tutorial_message(), "");
        assert_eq!(s.grid().goal(), Some((48, 5)));
        assert_eq!(s.drain_events(), vec![GameEvent::LevelLoaded { id: LAVA_LEVEL }]);

        // Lava level has no options of its own
        assert_eq!(s.apply_command(Command::Choose(2)), Err(SessionError::UnknownChoice(2)));
    }

    #[test]
    fn choice_target_missing_from_catalog() {
        let mut def = flat(1);
        def.choice = LevelChoice::new("where").with_option(1, "nowhere", LevelId(99));
        let mut s = session_on(def);
        assert_eq!(
            s.apply_command(Command::Choose(1)),
            Err(SessionError::UnknownLevel(LevelId(99)))
        );
        assert_eq!(s.level(), LevelId(1));
    }

    #[test]
    fn pending_choices_only_on_door() {
        let mut def = flat(1);
        def.doors.push((3, 3));
        def.choice = LevelChoice::new("pick").with_option(4, "back", LevelId(1));
        let mut s = session_on(def);
        assert!(s.pending_choices().is_none());
        s.apply_command(right()).unwrap();
        let ids: Vec<u32> = s.pending_choices().unwrap().options().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![4]);
        s.apply_command(right()).unwrap();
        assert!(s.pending_choices().is_none());
    }

    // ── Status ──

    #[test]
    fn reaching_goal_completes_level() {
        let mut def = flat(1);
        def.goal = Some((3, 3));
        let mut s = session_on(def);
        assert_eq!(s.apply_command(right()), Ok(SessionStatus::LevelComplete));
        assert!(s.snapshot().goal_reached);
        assert_eq!(
            s.apply_command(left()),
            Err(SessionError::NotInProgress(SessionStatus::LevelComplete))
        );
        let ticks = s.ticks();
        assert_eq!(s.tick(), SessionStatus::LevelComplete);
        assert_eq!(s.ticks(), ticks);

        assert_eq!(s.apply_command(Command::Reset), Ok(SessionStatus::InProgress));
        assert_eq!(s.player().position(), (2, 3));
    }

    #[test]
    fn falling_onto_goal_completes_level() {
        let mut def = flat(1);
        def.spawn = (2, 0);
        def.goal = Some((2, 3));
        let mut s = session_on(def);
        let mut status = SessionStatus::InProgress;
        for _ in 0..10 {
            status = s.tick();
        }
        assert_eq!(status, SessionStatus::LevelComplete);
    }

    #[test]
    fn quit_aborts_once() {
        let mut s = session_on(flat(1));
        s.drain_events();
        assert_eq!(s.apply_command(Command::Quit), Ok(SessionStatus::Aborted));
        assert_eq!(s.apply_command(Command::Quit), Ok(SessionStatus::Aborted));
        assert_eq!(s.drain_events(), vec![GameEvent::Aborted]);
        assert_eq!(
            s.apply_command(Command::Save),
            Err(SessionError::NotInProgress(SessionStatus::Aborted))
        );
    }

    #[test]
    fn unknown_start_level() {
        let err = Session::new(LevelCatalog::new(), PhysicsParams::default(), LevelId(1)).unwrap_err();
        assert_eq!(err, SessionError::UnknownLevel(LevelId(1)));
    }

    // ══════════════════════════════════════════════════════════
    // Property tests
    // ══════════════════════════════════════════════════════════

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn any_command() -> impl Strategy<Value = Command> {
            prop_oneof![
                Just(Command::Move(MoveKey::Left)),
                Just(Command::Move(MoveKey::Right)),
                Just(Command::Move(MoveKey::Up)),
                Just(Command::Save),
                Just(Command::Undo),
                Just(Command::StartReplay),
                (0u32..4).prop_map(Command::Choose),
            ]
        }

        proptest! {
            #[test]
            fn rejected_commands_leave_session_untouched(
                script in prop::collection::vec((any_command(), any::<bool>()), 1..80)
            ) {
                let mut s = builtin();
                for (cmd, tick) in script {
                    let before = s.snapshot();
                    let depth = s.save_depth();
                    let frames = s.recorded_frames();
                    if s.apply_command(cmd).is_err() {
                        prop_assert_eq!(s.snapshot(), before);
                        prop_assert_eq!(s.save_depth(), depth);
                        prop_assert_eq!(s.recorded_frames(), frames);
                    }
                    if tick {
                        s.tick();
                    }
                    prop_assert!(s.player().vy.abs() <= s.params().max_fall + EPS);
                }
            }

            #[test]
            fn save_undo_round_trip(
                moves in prop::collection::vec(0u8..3, 0..20),
                ticks in 0usize..10,
            ) {
                let mut s = session_on(flat(1));
                for _ in 0..ticks {
                    s.tick();
                }
                s.apply_command(Command::Save).unwrap();
                let saved = *s.player();
                for m in moves {
                    let key = match m { 0 => MoveKey::Left, 1 => MoveKey::Right, _ => MoveKey::Up };
                    s.apply_command(Command::Move(key)).unwrap();
                    s.tick();
                }
                s.apply_command(Command::Undo).unwrap();
                prop_assert_eq!(*s.player(), saved);
            }
        }
    }
}
