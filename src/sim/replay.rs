//! Per-tick history and replay playback.
//!
//! ## Recording
//!
//! `ReplayRecorder` is an append-only FIFO of player snapshots. The session
//! appends one frame per normal tick and stops appending while a playback is
//! running. An optional cap evicts the oldest frame once full.
//!
//! ## Playback
//!
//! `start_playback()` hands out a `Playback` that owns its OWN copy of the
//! frames. The recorder is not touched: anything recorded afterwards lands in
//! the recorder only, never in a playback already handed out.

use std::collections::VecDeque;

use crate::domain::entity::PlayerState;

#[derive(Clone, Debug, Default)]
pub struct ReplayRecorder {
    frames: VecDeque<PlayerState>,
    /// `None` = unbounded.
    max_frames: Option<usize>,
}

impl ReplayRecorder {
    pub fn new() -> Self {
        ReplayRecorder::default()
    }

    /// Recorder keeping at most `max_frames` frames. `0` means unbounded.
    pub fn with_capacity_limit(max_frames: usize) -> Self {
        ReplayRecorder {
            frames: VecDeque::new(),
            max_frames: (max_frames > 0).then_some(max_frames),
        }
    }

    /// Append a copy of `state`, evicting the oldest frame if at the cap.
    pub fn record(&mut self, state: &PlayerState) {
        if let Some(max) = self.max_frames {
            while self.frames.len() >= max {
                self.frames.pop_front();
            }
        }
        self.frames.push_back(*state);
    }

    /// Independent copy of everything recorded so far, oldest first.
    pub fn start_playback(&self) -> Playback {
        Playback {
            frames: self.frames.clone(),
            total: self.frames.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

/// A replay being consumed frame by frame.
#[derive(Clone, Debug)]
pub struct Playback {
    frames: VecDeque<PlayerState>,
    total: usize,
}

impl Playback {
    /// Next frame (oldest first). `None` = playback complete.
    pub fn next_frame(&mut self) -> Option<PlayerState> {
        self.frames.pop_front()
    }

    pub fn total(&self) -> usize {
        self.total
    }
}
