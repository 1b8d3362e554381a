//! Game lifecycle
//!
//! One-way `NotStarted` -> `Started(theme)` transition. Starting a round
//! clears every live participant's opinion.

use rand::Rng;

use crate::error::{Error, Result};
use crate::models::{Opinion, Theme};
use crate::registry::Registry;
use crate::themes::ThemeCatalog;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GamePhase {
    #[default]
    NotStarted,
    Started(Theme),
}

#[derive(Debug, Clone, Default)]
pub struct Game {
    phase: GamePhase,
}

impl Game {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &GamePhase {
        &self.phase
    }

    pub fn is_started(&self) -> bool {
        matches!(self.phase, GamePhase::Started(_))
    }

    pub fn theme(&self) -> Option<&Theme> {
        match &self.phase {
            GamePhase::Started(theme) => Some(theme),
            GamePhase::NotStarted => None,
        }
    }

    /// Start the game with a random theme
    ///
    /// Authorization (seated chairperson) is checked by the caller.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        registry: &mut Registry,
        themes: &ThemeCatalog,
        rng: &mut R,
    ) -> Result<Theme> {
        if self.is_started() {
            return Err(Error::GameAlreadyStarted);
        }

        let theme = themes.choose(rng).cloned().ok_or(Error::NoThemes)?;

        for participant in registry.live_mut() {
            participant.opinion = Opinion::Pending;
        }

        self.phase = GamePhase::Started(theme.clone());
        tracing::info!(prompt = %theme.prompt, "Game started");
        Ok(theme)
    }
}
