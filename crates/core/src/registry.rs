//! Participant registry
//!
//! Central store of per-connection session state. Keeps the join order
//! used to queue chairperson candidates.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::models::{ConnectionId, Participant};

/// Result of a login against the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Login {
    /// First login from this connection
    New,
    /// Repeat login (reload); the record was kept and only the name changed
    Returning,
}

/// Participant registry - session state by connection
#[derive(Debug, Default)]
pub struct Registry {
    participants: HashMap<ConnectionId, Participant>,
    /// Connection IDs in join order
    order: Vec<ConnectionId>,
    next_join_order: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or refresh the record for a logging-in connection
    pub fn upsert_on_login(&mut self, id: ConnectionId, name: String) -> (Login, &mut Participant) {
        let (login, participant) = match self.participants.entry(id) {
            Entry::Occupied(entry) => (Login::Returning, entry.into_mut()),
            Entry::Vacant(entry) => {
                let join_order = self.next_join_order;
                self.next_join_order += 1;
                self.order.push(id);
                let participant = Participant::new(id, name.clone(), join_order);
                (Login::New, entry.insert(participant))
            }
        };
        participant.name = name;
        participant.joined = true;
        (login, participant)
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Participant> {
        self.participants.get(&id)
    }

    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut Participant> {
        self.participants.get_mut(&id)
    }

    /// Live participants in join order
    pub fn list_live(&self) -> impl Iterator<Item = &Participant> {
        self.order
            .iter()
            .filter_map(|id| self.participants.get(id))
            .filter(|p| p.joined)
    }

    /// Live participants holding a number, in join order
    pub fn players(&self) -> impl Iterator<Item = &Participant> {
        self.list_live().filter(|p| p.is_player())
    }

    /// Mutable access to every live participant, in no particular order
    pub fn live_mut(&mut self) -> impl Iterator<Item = &mut Participant> {
        self.participants.values_mut().filter(|p| p.joined)
    }

    /// Drop a participant record, returning it so the caller can release its number
    pub fn remove(&mut self, id: ConnectionId) -> Option<Participant> {
        let mut participant = self.participants.remove(&id)?;
        participant.joined = false;
        self.order.retain(|o| *o != id);
        Some(participant)
    }

    pub fn live_count(&self) -> usize {
        self.list_live().count()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
