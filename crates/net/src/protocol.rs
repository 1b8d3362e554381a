//! Network protocol message types
//!
//! All messages are JSON-serialized and length-prefixed on the wire, shaped
//! as `{"event": "<name>", "data": {...}}`. Server-to-client messages are
//! [`roundtable_core::Notification`]s; this module defines the
//! client-to-server side.
//!
//! Decoding is lenient: `data` may be missing or `null`, and so may any
//! field inside it.

use roundtable_core::Event;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages a client may send
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientMessage {
    #[serde(rename = "login")]
    Login { name: Option<String> },

    /// `answer` is loosely typed: `"yes"`, `"y"` or `true` accept
    #[serde(rename = "chair:answer")]
    ChairAnswer { answer: Value },

    #[serde(rename = "chair:start")]
    ChairStart {},

    #[serde(rename = "opinion:submit")]
    OpinionSubmit { text: String },

    #[serde(rename = "opinion:collect")]
    OpinionCollect {},

    #[serde(rename = "note:update")]
    NoteUpdate { text: String },
}

/// Raw shape of an inbound message
#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

impl<'de> Deserialize<'de> for ClientMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Envelope { event, data } = Envelope::deserialize(deserializer)?;
        let msg = match event.as_str() {
            "login" => ClientMessage::Login {
                name: string_field(&data, "name"),
            },
            "chair:answer" => ClientMessage::ChairAnswer {
                answer: data.get("answer").cloned().unwrap_or(Value::Null),
            },
            "chair:start" => ClientMessage::ChairStart {},
            "opinion:submit" => ClientMessage::OpinionSubmit {
                text: string_field(&data, "text").unwrap_or_default(),
            },
            "opinion:collect" => ClientMessage::OpinionCollect {},
            "note:update" => ClientMessage::NoteUpdate {
                text: string_field(&data, "text").unwrap_or_default(),
            },
            other => return Err(de::Error::custom(format!("unknown event `{}`", other))),
        };
        Ok(msg)
    }
}

/// String field of a payload; absent, `null` and non-string values are all `None`
fn string_field(data: &Value, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string)
}

impl ClientMessage {
    /// Serialize message to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize message from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Convenience constructor for a yes/no chair answer
    pub fn chair_answer(accept: bool) -> Self {
        ClientMessage::ChairAnswer {
            answer: Value::Bool(accept),
        }
    }
}

/// Does a chair answer count as acceptance?
pub fn is_acceptance(answer: &Value) -> bool {
    match answer {
        Value::Bool(b) => *b,
        Value::String(s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("yes") || s.eq_ignore_ascii_case("y")
        }
        _ => false,
    }
}

impl From<ClientMessage> for Event {
    fn from(msg: ClientMessage) -> Self {
        match msg {
            ClientMessage::Login { name } => Event::Login { name },
            ClientMessage::ChairAnswer { answer } => Event::ChairAnswer {
                accepted: is_acceptance(&answer),
            },
            ClientMessage::ChairStart {} => Event::ChairStart,
            ClientMessage::OpinionSubmit { text } => Event::OpinionSubmit { text },
            ClientMessage::OpinionCollect {} => Event::OpinionCollect,
            ClientMessage::NoteUpdate { text } => Event::NoteUpdate { text },
        }
    }
}
