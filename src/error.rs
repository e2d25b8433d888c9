//! Error taxonomy for session command processing and configuration.
//!
//! Every session error is local: the command that produced it had no effect.

use thiserror::Error;

use crate::domain::entity::MoveKey;
use crate::sim::level::LevelId;
use crate::sim::session::SessionStatus;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("unrecognized command `{0}`")]
    InvalidCommand(String),
    #[error("nothing to undo")]
    EmptyHistory,
    #[error("no choice with id {0} in this level")]
    UnknownChoice(u32),
    #[error("level {0} does not exist")]
    UnknownLevel(LevelId),
    #[error("tutorial expects `{}`", .expected.as_str())]
    TutorialGated { expected: MoveKey },
    #[error("replay playback in progress")]
    PlaybackActive,
    #[error("level is not in progress ({0:?})")]
    NotInProgress(SessionStatus),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}
