//! Linear tutorial: an ordered list of (message, required key) steps.
//!
//! While active, movement-class input must match the current step's key to
//! be accepted. A match advances the cursor; passing the last step turns the
//! gate off for the rest of the level. Non-movement commands never reach the
//! gate.

use crate::domain::entity::MoveKey;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TutorialStep {
    pub message: String,
    pub required: MoveKey,
}

impl TutorialStep {
    pub fn new(message: impl Into<String>, required: MoveKey) -> Self {
        TutorialStep { message: message.into(), required }
    }
}

/// What `check_progress` did with an input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateResult {
    /// Gate inactive or exhausted: input passes untouched.
    Open,
    /// Input matched; cursor moved to the next step.
    Advanced,
    /// Input matched the last step; the gate is now off.
    Completed,
    /// Input did not match the current step.
    Rejected { expected: MoveKey },
}

impl GateResult {
    pub fn accepted(self) -> bool {
        !matches!(self, GateResult::Rejected { .. })
    }
}

#[derive(Clone, Debug, Default)]
pub struct TutorialGate {
    steps: Vec<TutorialStep>,
    cursor: usize,
    active: bool,
}

impl TutorialGate {
    /// Gate over `steps`. An empty list produces an inactive gate.
    pub fn new(steps: Vec<TutorialStep>) -> Self {
        let active = !steps.is_empty();
        TutorialGate { steps, cursor: 0, active }
    }

    /// Gate that accepts everything.
    pub fn inactive() -> Self {
        TutorialGate::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn current_step(&self) -> Option<&TutorialStep> {
        if self.active { self.steps.get(self.cursor) } else { None }
    }

    /// Current prompt, empty when the gate is off.
    pub fn current_message(&self) -> &str {
        self.current_step().map_or("", |s| s.message.as_str())
    }

    pub fn check_progress(&mut self, key: MoveKey) -> GateResult {
        let expected = match self.current_step() {
            Some(step) => step.required,
            None => return GateResult::Open,
        };
        if key != expected {
            return GateResult::Rejected { expected };
        }
        self.cursor += 1;
        if self.cursor >= self.steps.len() {
            self.active = false;
            GateResult::Completed
        } else {
            GateResult::Advanced
        }
    }
}
