//! Room coordinator
//!
//! `Room` is the single owner of all session state: the number pool,
//! the participant registry, the election and the game. Each inbound
//! event is applied in full by [`Room::dispatch`], which returns the
//! notifications to deliver. The room never talks to the transport.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::election::{AnswerOutcome, DisconnectOutcome, Election};
use crate::error::Error;
use crate::event::{ChairInfo, Event, Notification, Outbound};
use crate::game::Game;
use crate::models::{normalize_name, truncate_chars, ConnectionId, Participant, MAX_NOTE_CHARS};
use crate::opinion;
use crate::pool::{NumberPool, DEFAULT_MAX_NUMBER};
use crate::registry::{Login, Registry};
use crate::themes::ThemeCatalog;

/// Question sent to chairperson candidates unless configured otherwise
pub const DEFAULT_CHAIR_QUESTION: &str = "Will you be the chairperson?";

/// Tunables for a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Numbers are handed out from `1..=max_number`
    pub max_number: u32,
    /// Text of the `chair:ask` question
    pub chair_question: String,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_number: DEFAULT_MAX_NUMBER,
            chair_question: DEFAULT_CHAIR_QUESTION.to_string(),
        }
    }
}

/// The shared session
#[derive(Debug)]
pub struct Room {
    config: RoomConfig,
    pool: NumberPool,
    registry: Registry,
    election: Election,
    game: Game,
    themes: ThemeCatalog,
    rng: StdRng,
}

impl Room {
    pub fn new(config: RoomConfig, themes: ThemeCatalog) -> Self {
        Self::with_rng(config, themes, StdRng::from_entropy())
    }

    /// Create a room with a caller-provided RNG (seeded in tests)
    pub fn with_rng(config: RoomConfig, themes: ThemeCatalog, rng: StdRng) -> Self {
        Self {
            pool: NumberPool::new(config.max_number),
            config,
            registry: Registry::new(),
            election: Election::new(),
            game: Game::new(),
            themes,
            rng,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn pool(&self) -> &NumberPool {
        &self.pool
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn election(&self) -> &Election {
        &self.election
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn themes(&self) -> &ThemeCatalog {
        &self.themes
    }

    /// Apply one inbound event and return the notifications it produced
    pub fn dispatch(&mut self, id: ConnectionId, event: Event) -> Vec<Outbound> {
        let mut out = Vec::new();

        match event {
            Event::Connected => {
                tracing::debug!(connection_id = %id, "Connection opened");
            }
            Event::Login { name } => self.handle_login(id, name.as_deref(), &mut out),
            Event::ChairAnswer { accepted } => self.handle_chair_answer(id, accepted, &mut out),
            Event::ChairStart => self.handle_chair_start(id, &mut out),
            Event::OpinionSubmit { text } => self.handle_opinion_submit(id, &text, &mut out),
            Event::OpinionCollect => self.handle_opinion_collect(id, &mut out),
            Event::NoteUpdate { text } => self.handle_note_update(id, &text, &mut out),
            Event::Disconnected => self.handle_disconnect(id, &mut out),
        }

        #[cfg(debug_assertions)]
        crate::invariants::assert_room_invariants(self);

        out
    }

    fn handle_login(&mut self, id: ConnectionId, name: Option<&str>, out: &mut Vec<Outbound>) {
        let game_started = self.game.is_started();
        let (login, participant) = self.registry.upsert_on_login(id, normalize_name(name));

        match participant.number {
            Some(number) => {
                out.push(Outbound::direct(id, roll(number, &participant.name)));
            }
            None if game_started => {
                tracing::info!(connection_id = %id, "Late joiner admitted as observer");
                out.push(Outbound::direct(id, roll_error(&Error::GameAlreadyStarted)));
            }
            None => match self.pool.allocate(&mut self.rng) {
                Ok(number) => {
                    participant.number = Some(number);
                    tracing::info!(connection_id = %id, number, name = %participant.name, "Number allocated");
                    out.push(Outbound::direct(id, roll(number, &participant.name)));
                }
                Err(e) => {
                    tracing::warn!(connection_id = %id, "Number pool exhausted");
                    out.push(Outbound::direct(id, roll_error(&e)));
                }
            },
        }

        let own_opinion = opinion_state(participant);
        let stats = Notification::RoomStats {
            participants: self.registry.live_count(),
        };
        match login {
            Login::New => out.push(Outbound::broadcast(stats)),
            Login::Returning => out.push(Outbound::direct(id, stats)),
        }

        out.push(Outbound::direct(id, self.chair_status()));
        if let Some(theme) = self.game.theme() {
            out.push(Outbound::direct(
                id,
                Notification::GameStarted {
                    theme: theme.clone(),
                },
            ));
        }
        out.push(Outbound::direct(id, own_opinion));

        if self.election.is_chair(id) {
            self.push_status_to_chair(out);
        }
        // A reloaded client has lost the pending question
        if self.election.candidate() == Some(id) {
            out.push(self.chair_ask(id));
        }
        self.ask_next(out);
    }

    fn handle_chair_answer(&mut self, id: ConnectionId, accepted: bool, out: &mut Vec<Outbound>) {
        let outcome =
            self.election
                .answer(&mut self.registry, id, accepted, self.game.is_started());

        match outcome {
            AnswerOutcome::Ignored => {
                tracing::debug!(connection_id = %id, "Ignoring chair answer from non-candidate");
            }
            AnswerOutcome::Accepted => {
                tracing::info!(connection_id = %id, "Chairperson seated");
                out.push(Outbound::direct(id, Notification::ChairAssigned { ok: true }));
                out.push(Outbound::broadcast(self.chair_status()));
            }
            AnswerOutcome::Declined { next } => {
                tracing::info!(connection_id = %id, "Chair declined");
                out.push(Outbound::direct(id, Notification::ChairAck { ok: true }));
                if let Some(next) = next {
                    out.push(self.chair_ask(next));
                }
            }
        }
    }

    fn handle_chair_start(&mut self, id: ConnectionId, out: &mut Vec<Outbound>) {
        if !self.election.is_chair(id) {
            tracing::debug!(connection_id = %id, "Ignoring start from non-chairperson");
            return;
        }

        match self.game.start(&mut self.registry, &self.themes, &mut self.rng) {
            Ok(theme) => {
                out.push(Outbound::broadcast(Notification::GameStarted { theme }));
                for participant in self.registry.list_live() {
                    out.push(Outbound::direct(participant.id, opinion_state(participant)));
                }
                self.push_status_to_chair(out);
            }
            Err(Error::GameAlreadyStarted) => {
                tracing::debug!(connection_id = %id, "Ignoring repeated start");
            }
            Err(e) => {
                tracing::warn!(connection_id = %id, error = %e, "Cannot start game");
                out.push(Outbound::direct(
                    id,
                    Notification::ChairStartError {
                        message: e.to_string(),
                    },
                ));
            }
        }
    }

    fn handle_opinion_submit(&mut self, id: ConnectionId, text: &str, out: &mut Vec<Outbound>) {
        match opinion::submit(&mut self.registry, &self.game, id, text) {
            Ok(()) => {
                tracing::debug!(connection_id = %id, "Opinion submitted");
                out.push(Outbound::direct(
                    id,
                    Notification::OpinionSubmitted {
                        ok: true,
                        message: None,
                        submitted: Some(true),
                    },
                ));
                if let Some(participant) = self.registry.get(id) {
                    out.push(Outbound::direct(id, opinion_state(participant)));
                }
                self.push_status_to_chair(out);
            }
            Err(e) => {
                out.push(Outbound::direct(
                    id,
                    Notification::OpinionSubmitted {
                        ok: false,
                        message: Some(e.to_string()),
                        submitted: None,
                    },
                ));
            }
        }
    }

    fn handle_opinion_collect(&mut self, id: ConnectionId, out: &mut Vec<Outbound>) {
        if !self.election.is_chair(id) {
            tracing::debug!(connection_id = %id, "Ignoring collect from non-chairperson");
            return;
        }

        out.push(Outbound::direct(
            id,
            Notification::OpinionCollected {
                opinions: opinion::collect(&self.registry),
            },
        ));
    }

    fn handle_note_update(&mut self, id: ConnectionId, text: &str, out: &mut Vec<Outbound>) {
        if let Some(participant) = self.registry.get_mut(id) {
            participant.note = truncate_chars(text, MAX_NOTE_CHARS).to_string();
        }
        out.push(Outbound::direct(id, Notification::NoteUpdated { ok: true }));
    }

    fn handle_disconnect(&mut self, id: ConnectionId, out: &mut Vec<Outbound>) {
        let Some(participant) = self.registry.remove(id) else {
            tracing::debug!(connection_id = %id, "Connection closed before login");
            return;
        };

        if let Some(number) = participant.number {
            let released = self.pool.release(number);
            debug_assert!(released, "number {} was not allocated by the pool", number);
        }

        let outcome =
            self.election
                .on_disconnect(&mut self.registry, id, self.game.is_started());

        tracing::info!(connection_id = %id, name = %participant.name, "Participant left");
        out.push(Outbound::broadcast(Notification::RoomStats {
            participants: self.registry.live_count(),
        }));

        match outcome {
            DisconnectOutcome::Unaffected => {}
            DisconnectOutcome::CandidateLeft { next } => {
                if let Some(next) = next {
                    out.push(self.chair_ask(next));
                }
            }
            DisconnectOutcome::ChairLeft { next } => {
                tracing::info!(connection_id = %id, "Chairperson left");
                out.push(Outbound::broadcast(self.chair_status()));
                if let Some(next) = next {
                    out.push(self.chair_ask(next));
                }
            }
        }

        if participant.number.is_some() {
            self.push_status_to_chair(out);
        }
    }

    fn ask_next(&mut self, out: &mut Vec<Outbound>) {
        if let Some(next) = self
            .election
            .ask_next(&mut self.registry, self.game.is_started())
        {
            out.push(self.chair_ask(next));
        }
    }

    fn chair_ask(&self, candidate: ConnectionId) -> Outbound {
        Outbound::direct(
            candidate,
            Notification::ChairAsk {
                question: self.config.chair_question.clone(),
            },
        )
    }

    fn chair_status(&self) -> Notification {
        let chairperson = self.election.chairperson().and_then(|id| {
            self.registry.get(id).map(|p| ChairInfo {
                id,
                name: p.name.clone(),
            })
        });
        Notification::ChairStatus { chairperson }
    }

    /// Send the quorum to the seated chairperson while a round is running
    fn push_status_to_chair(&self, out: &mut Vec<Outbound>) {
        if !self.game.is_started() {
            return;
        }
        if let Some(chair) = self.election.chairperson() {
            out.push(Outbound::direct(
                chair,
                Notification::OpinionStatus(opinion::status(&self.registry)),
            ));
        }
    }
}

fn roll(number: u32, username: &str) -> Notification {
    Notification::Roll {
        number,
        username: username.to_string(),
        ts: chrono::Utc::now().timestamp_millis(),
    }
}

fn roll_error(error: &Error) -> Notification {
    Notification::RollError {
        message: error.to_string(),
    }
}

fn opinion_state(participant: &Participant) -> Notification {
    Notification::OpinionState {
        submitted: participant.opinion.is_submitted(),
        text: participant.opinion.text().to_string(),
    }
}
