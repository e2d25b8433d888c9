//! Thread-safe handle to one session.
//!
//! A single mutex covers the whole session. Every operation below, including
//! the compound ones, runs under one lock acquisition, so a command can never
//! observe a half-applied tick and vice versa.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use crate::domain::entity::Command;
use crate::error::SessionError;
use super::event::GameEvent;
use super::session::{Session, SessionStatus};
use super::snapshot::SessionSnapshot;

static SESSION_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_session_lock_poison_once(operation: &'static str) {
    if SESSION_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "session lock poisoned; recovered inner value");
    }
}

#[derive(Clone, Debug)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        SharedSession { inner: Arc::new(Mutex::new(session)) }
    }

    fn lock(&self, operation: &'static str) -> MutexGuard<'_, Session> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn_session_lock_poison_once(operation);
                poisoned.into_inner()
            }
        }
    }

    pub fn apply_command(&self, cmd: Command) -> Result<SessionStatus, SessionError> {
        self.lock("apply_command").apply_command(cmd)
    }

    pub fn tick(&self) -> SessionStatus {
        self.lock("tick").tick()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock("snapshot").snapshot()
    }

    /// Advance one tick and capture the result without letting anything in
    /// between. Suits a "tick per state request" transport.
    pub fn tick_and_snapshot(&self) -> SessionSnapshot {
        let mut session = self.lock("tick_and_snapshot");
        session.tick();
        session.snapshot()
    }

    pub fn status(&self) -> SessionStatus {
        self.lock("status").status()
    }

    pub fn drain_events(&self) -> Vec<GameEvent> {
        self.lock("drain_events").drain_events()
    }

    /// Run `f` with exclusive access to the session.
    pub fn with<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        f(&mut self.lock("with"))
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::domain::entity::MoveKey;
    use crate::domain::physics::PhysicsParams;
    use crate::sim::level::{LevelCatalog, LevelDef, LevelId};

    fn shared() -> SharedSession {
        let mut def = LevelDef::new(LevelId(1), "arena", 12, 6);
        def.floor = true;
        def.walls = true;
        def.spawn = (5, 4);
        let catalog = LevelCatalog::new().with_level(def);
        SharedSession::new(Session::new(catalog, PhysicsParams::default(), LevelId(1)).unwrap())
    }

    #[test]
    fn clones_share_one_session() {
        let a = shared();
        let b = a.clone();
        a.apply_command(Command::Move(MoveKey::Right)).unwrap();
        assert_eq!(b.snapshot().player_x, 6);
    }

    #[test]
    fn tick_and_snapshot_advances_once() {
        let s = shared();
        assert_eq!(s.tick_and_snapshot().tick, 1);
        assert_eq!(s.snapshot().tick, 1);
    }

    #[test]
    fn concurrent_ticks_and_saves_stay_consistent() {
        let s = shared();
        let ticker = {
            let s = s.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    s.tick();
                }
            })
        };
        let saver = {
            let s = s.clone();
            thread::spawn(move || {
                for i in 0..200 {
                    let _ = s.apply_command(if i % 2 == 0 {
                        Command::Save
                    } else {
                        Command::Move(MoveKey::Up)
                    });
                }
            })
        };
        ticker.join().unwrap();
        saver.join().unwrap();

        s.with(|session| {
            assert_eq!(session.ticks(), 200);
            assert_eq!(session.save_depth(), 100);
            assert_eq!(session.recorded_frames(), 200);
            assert!(session.player().vy.abs() <= session.params().max_fall);
        });
    }

    #[test]
    fn recovers_from_poisoned_lock() {
        let s = shared();
        let poisoner = s.clone();
        let _ = thread::spawn(move || {
            poisoner.with(|_| panic!("poison the lock"));
        })
        .join();
        assert_eq!(s.tick(), SessionStatus::InProgress);
        assert_eq!(s.snapshot().tick, 1);
    }
}
