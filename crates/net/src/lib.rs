//! Roundtable Network Library
//!
//! Provides TCP-based transport for a shared Room.
//!
//! # Architecture
//!
//! - **Server**: accepts connections and feeds their events to the room
//! - **Client**: connects to a server, sends messages, reads notifications
//! - **Protocol**: Length-prefixed JSON messages
//!
//! # Usage
//!
//! ```ignore
//! // Host starts a server
//! let room = Room::new(RoomConfig::default(), themes);
//! let server = Server::start(addr, room).await?;
//!
//! // Client connects
//! let mut client = Client::connect(server.addr()).await?;
//! client.login("alice").await?;
//!
//! // Process notifications
//! while let Ok(notification) = client.next_notification().await {
//!     match notification {
//!         Notification::Roll { number, .. } => { /* handle */ }
//!         _ => {}
//!     }
//! }
//! ```

pub mod client;
pub mod error;
mod frame;
pub mod protocol;
pub mod server;

pub use client::Client;
pub use error::{Error, Result};
pub use protocol::ClientMessage;
pub use server::Server;

/// Default port for Roundtable servers
pub const DEFAULT_PORT: u16 = 3001;
