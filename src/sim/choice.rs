//! Branching level choice: one decision point with a fixed set of options.
//!
//! Stored flat. Each option maps a choice id to the level it leads to.

use serde::Serialize;

use super::level::LevelId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChoiceOption {
    pub id: u32,
    pub text: String,
    #[serde(skip)]
    pub target: LevelId,
}

#[derive(Clone, Debug, Default)]
pub struct LevelChoice {
    prompt: String,
    options: Vec<ChoiceOption>,
}

impl LevelChoice {
    pub fn new(prompt: impl Into<String>) -> Self {
        LevelChoice { prompt: prompt.into(), options: vec![] }
    }

    /// A level with nothing to choose.
    pub fn none() -> Self {
        LevelChoice::default()
    }

    /// Add an option. A later option with the same id replaces the earlier one.
    pub fn with_option(mut self, id: u32, text: impl Into<String>, target: LevelId) -> Self {
        let option = ChoiceOption { id, text: text.into(), target };
        match self.options.iter_mut().find(|o| o.id == id) {
            Some(existing) => *existing = option,
            None => self.options.push(option),
        }
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn options(&self) -> &[ChoiceOption] {
        &self.options
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Level reached by choice `id`, if it is one of the options.
    pub fn target_level(&self, id: u32) -> Option<LevelId> {
        self.options.iter().find(|o| o.id == id).map(|o| o.target)
    }
}
