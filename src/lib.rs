//! Gridhop: a tile-grid platformer simulation core.
//!
//! The crate has no rendering and no input devices. A caller drives a
//! [`Session`] with [`Command`]s and ticks and reads back a
//! [`SessionSnapshot`]; [`SharedSession`] wraps the same thing behind a
//! single lock for multi-threaded callers.

pub mod config;
pub mod domain;
pub mod error;
pub mod sim;

pub use config::GameConfig;
pub use domain::entity::{Command, MoveKey, PlayerState};
pub use error::{ConfigError, SessionError};
pub use sim::event::GameEvent;
pub use sim::level::{LevelCatalog, LevelDef, LevelId};
pub use sim::session::{Session, SessionStatus};
pub use sim::shared::SharedSession;
pub use sim::snapshot::SessionSnapshot;
