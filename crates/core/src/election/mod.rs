//! Chairperson election
//!
//! Candidates are polled strictly one at a time, in join order. The first
//! one to accept is seated and the poll stops for the life of the room.
//! Nobody is asked twice.

use crate::models::{ChairPhase, ConnectionId};
use crate::registry::Registry;

/// Election protocol state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElectionState {
    /// No outstanding question and no chairperson
    #[default]
    Idle,
    /// Waiting for this candidate to answer
    Polling(ConnectionId),
    /// Chairperson seated
    Resolved(ConnectionId),
}

/// Result of a chair answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Not from the outstanding candidate (stale or duplicate)
    Ignored,
    /// Candidate took the chair
    Accepted,
    /// Candidate declined; `next` is the newly asked candidate, if any
    Declined { next: Option<ConnectionId> },
}

/// How a disconnect affected the election
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectOutcome {
    Unaffected,
    /// The outstanding candidate left
    CandidateLeft { next: Option<ConnectionId> },
    /// The seated chairperson left
    ChairLeft { next: Option<ConnectionId> },
}

#[derive(Debug, Clone, Default)]
pub struct Election {
    state: ElectionState,
}

impl Election {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ElectionState {
        self.state
    }

    pub fn candidate(&self) -> Option<ConnectionId> {
        match self.state {
            ElectionState::Polling(id) => Some(id),
            _ => None,
        }
    }

    pub fn chairperson(&self) -> Option<ConnectionId> {
        match self.state {
            ElectionState::Resolved(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_chair(&self, id: ConnectionId) -> bool {
        self.chairperson() == Some(id)
    }

    /// Offer the chair to the first untried player, if the poll may advance
    ///
    /// Returns the candidate that was asked.
    pub fn ask_next(&mut self, registry: &mut Registry, game_started: bool) -> Option<ConnectionId> {
        if game_started || self.state != ElectionState::Idle {
            return None;
        }

        let next = registry
            .players()
            .find(|p| !p.chair.was_asked())
            .map(|p| p.id)?;

        if let Some(p) = registry.get_mut(next) {
            p.chair = ChairPhase::Asked;
        }
        self.state = ElectionState::Polling(next);
        tracing::debug!(candidate = %next, "Asking next chair candidate");
        Some(next)
    }

    /// Handle a candidate's answer
    pub fn answer(
        &mut self,
        registry: &mut Registry,
        id: ConnectionId,
        accepted: bool,
        game_started: bool,
    ) -> AnswerOutcome {
        if self.candidate() != Some(id) {
            return AnswerOutcome::Ignored;
        }

        if accepted {
            if let Some(p) = registry.get_mut(id) {
                p.chair = ChairPhase::Chair;
            }
            self.state = ElectionState::Resolved(id);
            AnswerOutcome::Accepted
        } else {
            if let Some(p) = registry.get_mut(id) {
                p.chair = ChairPhase::Declined;
            }
            self.state = ElectionState::Idle;
            let next = self.ask_next(registry, game_started);
            AnswerOutcome::Declined { next }
        }
    }

    /// Clean up after a participant left
    ///
    /// The participant must already be removed from the registry so the
    /// follow-up poll cannot pick it again.
    pub fn on_disconnect(
        &mut self,
        registry: &mut Registry,
        id: ConnectionId,
        game_started: bool,
    ) -> DisconnectOutcome {
        match self.state {
            ElectionState::Polling(candidate) if candidate == id => {
                self.state = ElectionState::Idle;
                let next = self.ask_next(registry, game_started);
                DisconnectOutcome::CandidateLeft { next }
            }
            ElectionState::Resolved(chair) if chair == id => {
                self.state = ElectionState::Idle;
                let next = self.ask_next(registry, game_started);
                DisconnectOutcome::ChairLeft { next }
            }
            _ => DisconnectOutcome::Unaffected,
        }
    }
}
