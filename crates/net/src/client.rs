//! TCP client for connecting to a Room server

use std::net::SocketAddr;

use roundtable_core::Notification;
use tokio::io::{AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::error::Result;
use crate::frame::{read_frame, write_frame};
use crate::protocol::ClientMessage;

/// Client handle for one room connection
pub struct Client {
    reader: ReadHalf<TcpStream>,
    writer: WriteHalf<TcpStream>,
}

impl Client {
    /// Connect to a Room server
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        info!(addr = %addr, "Connecting to server");

        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = tokio::io::split(stream);

        Ok(Client { reader, writer })
    }

    /// Send a message to the server
    pub async fn send(&mut self, msg: &ClientMessage) -> Result<()> {
        write_frame(&mut self.writer, msg).await
    }

    /// Send an arbitrary JSON message, valid or not
    pub async fn send_json(&mut self, value: &serde_json::Value) -> Result<()> {
        write_frame(&mut self.writer, value).await
    }

    /// Log in under a display name
    pub async fn login(&mut self, name: &str) -> Result<()> {
        self.send(&ClientMessage::Login {
            name: Some(name.to_string()),
        })
        .await
    }

    /// Read the next notification from the server
    pub async fn next_notification(&mut self) -> Result<Notification> {
        read_frame(&mut self.reader).await
    }

    /// Read notifications until one named `name` arrives
    pub async fn wait_for(&mut self, name: &str) -> Result<Notification> {
        loop {
            let notification = self.next_notification().await?;
            if notification.name() == name {
                return Ok(notification);
            }
            debug!(event = notification.name(), "Skipping notification");
        }
    }

    /// Close the connection
    pub async fn disconnect(mut self) {
        let _ = self.writer.shutdown().await;
    }
}
