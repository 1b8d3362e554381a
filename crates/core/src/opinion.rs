//! Opinion collection
//!
//! Quorum is always computed over the players live at query time, so a
//! departure mid-round can complete it.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::game::Game;
use crate::models::{truncate_chars, ConnectionId, Opinion, MAX_OPINION_CHARS};
use crate::registry::Registry;

/// Submission progress for the current round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpinionStatus {
    pub all_submitted: bool,
    pub submitted_count: usize,
    pub total: usize,
}

/// One entry of the chairperson's reveal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedOpinion {
    pub id: ConnectionId,
    pub name: String,
    pub number: u32,
    pub opinion: String,
}

/// Store (or overwrite) a participant's opinion
pub fn submit(registry: &mut Registry, game: &Game, id: ConnectionId, text: &str) -> Result<()> {
    if !game.is_started() {
        return Err(Error::GameNotStarted);
    }

    let participant = registry
        .get_mut(id)
        .filter(|p| p.is_player())
        .ok_or(Error::NotNumbered)?;

    let text = truncate_chars(text, MAX_OPINION_CHARS).trim();
    if text.is_empty() {
        return Err(Error::EmptyOpinion);
    }

    participant.opinion = Opinion::Submitted(text.to_string());
    Ok(())
}

pub fn status(registry: &Registry) -> OpinionStatus {
    let (total, submitted_count) = registry.players().fold((0, 0), |(total, done), p| {
        (total + 1, done + usize::from(p.opinion.is_submitted()))
    });

    OpinionStatus {
        all_submitted: total > 0 && submitted_count == total,
        submitted_count,
        total,
    }
}

/// Snapshot of every submitted opinion, in join order
pub fn collect(registry: &Registry) -> Vec<CollectedOpinion> {
    registry
        .players()
        .filter_map(|p| match (&p.opinion, p.number) {
            (Opinion::Submitted(text), Some(number)) => Some(CollectedOpinion {
                id: p.id,
                name: p.name.clone(),
                number,
                opinion: text.clone(),
            }),
            _ => None,
        })
        .collect()
}
