//! Roundtable Core Library
//!
//! Session state for one shared room: number pool, participant registry,
//! chairperson election, game lifecycle and opinion collection, all owned
//! by a single [`Room`] that turns inbound events into notifications.

pub mod election;
pub mod error;
pub mod event;
pub mod game;
pub mod invariants;
pub mod models;
pub mod opinion;
pub mod pool;
pub mod registry;
pub mod room;
pub mod themes;

pub use election::{AnswerOutcome, DisconnectOutcome, Election, ElectionState};
pub use error::{Error, Result};
pub use event::{ChairInfo, Event, Notification, Outbound, Target};
pub use game::{Game, GamePhase};
pub use models::*;
pub use opinion::{CollectedOpinion, OpinionStatus};
pub use pool::NumberPool;
pub use registry::{Login, Registry};
pub use room::{Room, RoomConfig};
pub use themes::ThemeCatalog;
