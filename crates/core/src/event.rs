//! Room events and notifications
//!
//! `Event` is what the transport feeds into the room; `Notification` is
//! what comes back out, addressed by `Target`. Notifications serialize as
//! `{"event": "<name>", "data": {...}}`.

use serde::{Deserialize, Serialize};

use crate::models::{ConnectionId, Theme};
use crate::opinion::{CollectedOpinion, OpinionStatus};

/// Inbound event from one connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connected,
    Login { name: Option<String> },
    ChairAnswer { accepted: bool },
    ChairStart,
    OpinionSubmit { text: String },
    OpinionCollect,
    NoteUpdate { text: String },
    Disconnected,
}

/// Seated chairperson as shown to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChairInfo {
    pub id: ConnectionId,
    pub name: String,
}

/// Outbound notification payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum Notification {
    #[serde(rename = "roll")]
    Roll {
        number: u32,
        username: String,
        /// Milliseconds since the Unix epoch
        ts: i64,
    },

    #[serde(rename = "roll:error")]
    RollError { message: String },

    #[serde(rename = "chair:ask")]
    ChairAsk { question: String },

    #[serde(rename = "chair:assigned")]
    ChairAssigned { ok: bool },

    #[serde(rename = "chair:ack")]
    ChairAck { ok: bool },

    #[serde(rename = "chair:status")]
    ChairStatus { chairperson: Option<ChairInfo> },

    #[serde(rename = "chair:start:error")]
    ChairStartError { message: String },

    #[serde(rename = "room:stats")]
    RoomStats { participants: usize },

    #[serde(rename = "game:started")]
    GameStarted { theme: Theme },

    #[serde(rename = "opinion:state")]
    OpinionState { submitted: bool, text: String },

    #[serde(rename = "opinion:submitted")]
    OpinionSubmitted {
        ok: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        submitted: Option<bool>,
    },

    #[serde(rename = "opinion:status")]
    OpinionStatus(OpinionStatus),

    #[serde(rename = "opinion:collected")]
    OpinionCollected { opinions: Vec<CollectedOpinion> },

    #[serde(rename = "note:updated")]
    NoteUpdated { ok: bool },
}

impl Notification {
    /// Wire name of this notification
    pub fn name(&self) -> &'static str {
        match self {
            Notification::Roll { .. } => "roll",
            Notification::RollError { .. } => "roll:error",
            Notification::ChairAsk { .. } => "chair:ask",
            Notification::ChairAssigned { .. } => "chair:assigned",
            Notification::ChairAck { .. } => "chair:ack",
            Notification::ChairStatus { .. } => "chair:status",
            Notification::ChairStartError { .. } => "chair:start:error",
            Notification::RoomStats { .. } => "room:stats",
            Notification::GameStarted { .. } => "game:started",
            Notification::OpinionState { .. } => "opinion:state",
            Notification::OpinionSubmitted { .. } => "opinion:submitted",
            Notification::OpinionStatus(_) => "opinion:status",
            Notification::OpinionCollected { .. } => "opinion:collected",
            Notification::NoteUpdated { .. } => "note:updated",
        }
    }
}

/// Delivery address of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Exactly one connection
    Direct(ConnectionId),
    /// Every connection
    Broadcast,
}

/// A notification together with its address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub target: Target,
    pub notification: Notification,
}

impl Outbound {
    pub fn direct(id: ConnectionId, notification: Notification) -> Self {
        Self {
            target: Target::Direct(id),
            notification,
        }
    }

    pub fn broadcast(notification: Notification) -> Self {
        Self {
            target: Target::Broadcast,
            notification,
        }
    }

    /// Would this reach `id`?
    pub fn reaches(&self, id: ConnectionId) -> bool {
        match self.target {
            Target::Direct(to) => to == id,
            Target::Broadcast => true,
        }
    }
}
