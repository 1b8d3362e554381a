//! Participant model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum display name length, in characters
pub const MAX_NAME_CHARS: usize = 32;

/// Maximum opinion length, in characters
pub const MAX_OPINION_CHARS: usize = 400;

/// Maximum scratch note length, in characters
pub const MAX_NOTE_CHARS: usize = 200;

/// Name used when a login carries none
pub const DEFAULT_NAME: &str = "guest";

/// Transport-assigned identity of one live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Where a participant stands in the chairperson election
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChairPhase {
    /// Not yet offered the role
    #[default]
    NotAsked,
    /// Currently holding the outstanding question
    Asked,
    /// Offered the role and said no
    Declined,
    /// Seated chairperson
    Chair,
}

impl ChairPhase {
    /// Has this participant ever been offered the role?
    pub fn was_asked(self) -> bool {
        !matches!(self, ChairPhase::NotAsked)
    }
}

/// Opinion state for the current round
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Opinion {
    #[default]
    Pending,
    Submitted(String),
}

impl Opinion {
    pub fn is_submitted(&self) -> bool {
        matches!(self, Opinion::Submitted(_))
    }

    /// Submitted text, or empty while pending
    pub fn text(&self) -> &str {
        match self {
            Opinion::Pending => "",
            Opinion::Submitted(text) => text,
        }
    }
}

/// Per-connection session state
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: ConnectionId,
    pub name: String,
    /// Position in the election queue
    pub join_order: u64,
    /// `None` for observers (late joiners, or a full room)
    pub number: Option<u32>,
    pub chair: ChairPhase,
    pub opinion: Opinion,
    pub note: String,
    pub joined: bool,
}

impl Participant {
    pub fn new(id: ConnectionId, name: String, join_order: u64) -> Self {
        Self {
            id,
            name,
            join_order,
            number: None,
            chair: ChairPhase::NotAsked,
            opinion: Opinion::Pending,
            note: String::new(),
            joined: true,
        }
    }

    /// Live and holding a number: counts for the election and the opinion quorum
    pub fn is_player(&self) -> bool {
        self.joined && self.number.is_some()
    }
}

/// Truncate to at most `max` characters without splitting a code point
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Normalize a login name: truncated, falling back to the default when empty
pub fn normalize_name(name: Option<&str>) -> String {
    match name {
        Some(n) if !n.is_empty() => truncate_chars(n, MAX_NAME_CHARS).to_string(),
        _ => DEFAULT_NAME.to_string(),
    }
}
