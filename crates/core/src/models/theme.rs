//! Theme model

use serde::{Deserialize, Serialize};

/// A round prompt picked when the chairperson starts the game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    /// Short heading shown above the prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub prompt: String,
}

impl Theme {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            title: None,
            prompt: prompt.into(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}
