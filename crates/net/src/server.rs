//! TCP server for hosting a Room
//!
//! Every connection gets a reader task and a writer task. All room state
//! lives in one coordinator task: connection tasks forward their events to
//! it over a channel, and it handles them strictly one at a time.

use std::collections::HashMap;
use std::net::SocketAddr;

use roundtable_core::{ConnectionId, Event, Notification, Outbound, Room, Target};
use tokio::io::{AsyncWriteExt, WriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame};
use crate::protocol::ClientMessage;

/// Per-connection outbound queue depth
const OUTBOX_CAPACITY: usize = 64;

/// Coordinator inbound queue depth
const INBOX_CAPACITY: usize = 256;

/// Message from a connection task to the coordinator
enum Inbound {
    Opened {
        id: ConnectionId,
        outbox: mpsc::Sender<Notification>,
    },
    Event {
        id: ConnectionId,
        event: Event,
    },
}

/// Room server handle
pub struct Server {
    addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Start a new server bound to `addr`, taking ownership of the room
    pub async fn start(addr: SocketAddr, room: Room) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let bound_addr = listener.local_addr()?;

        info!(addr = %bound_addr, themes = room.themes().len(), "Server started");

        let (shutdown_tx, _) = broadcast::channel(1);
        let (inbox_tx, inbox_rx) = mpsc::channel(INBOX_CAPACITY);

        tokio::spawn(coordinator(room, inbox_rx, shutdown_tx.subscribe()));
        tokio::spawn(accept_loop(listener, inbox_tx, shutdown_tx.subscribe()));

        Ok(Server {
            addr: bound_addr,
            shutdown_tx,
        })
    }

    /// Get the server's bound address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        info!("Server shutdown initiated");
    }
}

/// Accept incoming connections
async fn accept_loop(
    listener: TcpListener,
    inbox: mpsc::Sender<Inbound>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, addr)) => {
                        debug!(addr = %addr, "New connection");
                        tokio::spawn(handle_connection(stream, addr, inbox.clone()));
                    }
                    Err(e) => {
                        error!(error = %e, "Accept failed");
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Accept loop shutting down");
                break;
            }
        }
    }
}

/// Handle a single client connection
async fn handle_connection(stream: TcpStream, addr: SocketAddr, inbox: mpsc::Sender<Inbound>) {
    let id = ConnectionId::new();
    let (mut reader, writer) = tokio::io::split(stream);
    let (outbox_tx, outbox_rx) = mpsc::channel(OUTBOX_CAPACITY);

    if inbox
        .send(Inbound::Opened {
            id,
            outbox: outbox_tx,
        })
        .await
        .is_err()
    {
        debug!(addr = %addr, "Coordinator gone, dropping connection");
        return;
    }

    // Ends once the coordinator drops the outbox
    tokio::spawn(writer_task(writer, outbox_rx, id));

    info!(addr = %addr, connection_id = %id, "Connection opened");

    // Read loop
    loop {
        match read_frame::<_, ClientMessage>(&mut reader).await {
            Ok(msg) => {
                let event = Event::from(msg);
                if inbox.send(Inbound::Event { id, event }).await.is_err() {
                    break;
                }
            }
            Err(Error::InvalidMessage(e)) => {
                warn!(connection_id = %id, error = %e, "Ignoring undecodable message");
            }
            Err(Error::ConnectionClosed) => {
                debug!(connection_id = %id, "Connection closed");
                break;
            }
            Err(e) => {
                warn!(connection_id = %id, error = %e, "Read error");
                break;
            }
        }
    }

    // Cleanup
    let _ = inbox
        .send(Inbound::Event {
            id,
            event: Event::Disconnected,
        })
        .await;

    info!(connection_id = %id, "Connection closed");
}

/// Writer task - sends notifications to the client
async fn writer_task(
    mut writer: WriteHalf<TcpStream>,
    mut rx: mpsc::Receiver<Notification>,
    id: ConnectionId,
) {
    while let Some(notification) = rx.recv().await {
        if let Err(e) = write_frame(&mut writer, &notification).await {
            debug!(connection_id = %id, error = %e, "Write failed");
            break;
        }
    }
    // Evicted or closed; let the peer see EOF
    let _ = writer.shutdown().await;
}

type Outboxes = HashMap<ConnectionId, mpsc::Sender<Notification>>;

/// Single owner of the room; applies events one at a time
async fn coordinator(
    mut room: Room,
    mut inbox: mpsc::Receiver<Inbound>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut outboxes = Outboxes::new();

    loop {
        tokio::select! {
            msg = inbox.recv() => {
                match msg {
                    Some(Inbound::Opened { id, outbox }) => {
                        outboxes.insert(id, outbox);
                        let out = room.dispatch(id, Event::Connected);
                        deliver(&mut room, &mut outboxes, out);
                    }
                    Some(Inbound::Event { id, event }) => {
                        // Evicted connections have already left the room
                        if !outboxes.contains_key(&id) {
                            debug!(connection_id = %id, "Ignoring event from evicted connection");
                            continue;
                        }
                        if event == Event::Disconnected {
                            outboxes.remove(&id);
                        }
                        let out = room.dispatch(id, event);
                        deliver(&mut room, &mut outboxes, out);
                    }
                    None => break,
                }
            }
            _ = shutdown_rx.recv() => {
                debug!("Coordinator shutting down");
                break;
            }
        }
    }
}

/// Queue notifications without ever waiting on a slow client
///
/// A connection whose outbox is full or closed is evicted: it leaves the
/// room as if it had disconnected, and the notifications that departure
/// produces are delivered in turn.
fn deliver(room: &mut Room, outboxes: &mut Outboxes, mut out: Vec<Outbound>) {
    while !out.is_empty() {
        let stalled = queue_all(outboxes, out);
        out = Vec::new();
        for id in stalled {
            if outboxes.remove(&id).is_some() {
                out.extend(room.dispatch(id, Event::Disconnected));
            }
        }
    }
}

/// Queue every notification, returning the connections that could not take one
fn queue_all(outboxes: &Outboxes, out: Vec<Outbound>) -> Vec<ConnectionId> {
    let mut stalled = Vec::new();
    for Outbound {
        target,
        notification,
    } in out
    {
        match target {
            Target::Direct(id) => {
                if let Some(tx) = outboxes.get(&id) {
                    queue(tx, id, notification, &mut stalled);
                }
            }
            Target::Broadcast => {
                for (id, tx) in outboxes {
                    queue(tx, *id, notification.clone(), &mut stalled);
                }
            }
        }
    }
    stalled
}

fn queue(
    tx: &mpsc::Sender<Notification>,
    id: ConnectionId,
    notification: Notification,
    stalled: &mut Vec<ConnectionId>,
) {
    if stalled.contains(&id) {
        return;
    }
    let name = notification.name();
    match tx.try_send(notification) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            warn!(connection_id = %id, event = name, "Outbox full, evicting connection");
            stalled.push(id);
        }
        Err(TrySendError::Closed(_)) => {
            debug!(connection_id = %id, event = name, "Outbox closed, evicting connection");
            stalled.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Client;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use roundtable_core::{RoomConfig, Theme, ThemeCatalog};
    use std::time::Duration;

    async fn start(max_number: u32) -> Server {
        let config = RoomConfig {
            max_number,
            ..RoomConfig::default()
        };
        let themes = ThemeCatalog::new(vec![Theme::new("T")]);
        let room = Room::with_rng(config, themes, StdRng::seed_from_u64(1));
        Server::start(SocketAddr::from(([127, 0, 0, 1], 0)), room)
            .await
            .unwrap()
    }

    async fn expect(client: &mut Client, name: &str) -> Notification {
        tokio::time::timeout(Duration::from_secs(5), client.wait_for(name))
            .await
            .expect("timed out waiting for notification")
            .unwrap()
    }

    #[tokio::test]
    async fn test_server_start() {
        let server = start(100).await;
        assert!(server.addr().port() > 0);
        server.shutdown();
    }

    #[tokio::test]
    async fn test_last_slot_over_tcp() {
        let server = start(1).await;

        let mut first = Client::connect(server.addr()).await.unwrap();
        first.login("first").await.unwrap();
        match expect(&mut first, "roll").await {
            Notification::Roll {
                number, username, ..
            } => {
                assert_eq!(number, 1);
                assert_eq!(username, "first");
            }
            other => panic!("unexpected {:?}", other),
        }

        let mut second = Client::connect(server.addr()).await.unwrap();
        second.login("second").await.unwrap();
        assert!(matches!(
            expect(&mut second, "roll:error").await,
            Notification::RollError { .. }
        ));

        server.shutdown();
    }

    #[tokio::test]
    async fn test_bad_messages_keep_connection() {
        let server = start(100).await;

        let mut chair = Client::connect(server.addr()).await.unwrap();
        chair.login("chair").await.unwrap();
        expect(&mut chair, "chair:ask").await;
        chair.send(&ClientMessage::chair_answer(true)).await.unwrap();
        expect(&mut chair, "chair:assigned").await;

        chair
            .send_json(&serde_json::json!({"event": "nope", "data": {}}))
            .await
            .unwrap();
        chair.send_json(&serde_json::json!([1, 2, 3])).await.unwrap();

        // Payload-less start from the same, still seated, chair
        chair
            .send_json(&serde_json::json!({"event": "chair:start"}))
            .await
            .unwrap();
        match expect(&mut chair, "game:started").await {
            Notification::GameStarted { theme } => assert_eq!(theme.prompt, "T"),
            other => panic!("unexpected {:?}", other),
        }

        server.shutdown();
    }

    #[test]
    fn test_full_outbox_evicts_connection() {
        let mut room = Room::with_rng(
            RoomConfig::default(),
            ThemeCatalog::new(vec![Theme::new("T")]),
            StdRng::seed_from_u64(1),
        );
        let mut outboxes = Outboxes::new();
        let (a, b) = (ConnectionId::new(), ConnectionId::new());
        let (a_tx, mut a_rx) = mpsc::channel(OUTBOX_CAPACITY);
        let (b_tx, _b_rx) = mpsc::channel(1);
        outboxes.insert(a, a_tx);
        outboxes.insert(b, b_tx);

        // A's room:stats broadcast fills B's single slot
        let out = room.dispatch(a, Event::Login { name: Some("a".into()) });
        deliver(&mut room, &mut outboxes, out);
        assert!(outboxes.contains_key(&b));

        let out = room.dispatch(b, Event::Login { name: Some("b".into()) });
        deliver(&mut room, &mut outboxes, out);

        assert!(!outboxes.contains_key(&b));
        assert!(room.registry().get(b).is_none());
        assert_eq!(room.pool().allocated_count(), 1);

        let mut last_stats = None;
        while let Ok(notification) = a_rx.try_recv() {
            if let Notification::RoomStats { participants } = notification {
                last_stats = Some(participants);
            }
        }
        assert_eq!(last_stats, Some(1));
    }

    #[test]
    fn test_eviction_reasks_next_candidate() {
        let mut room = Room::with_rng(
            RoomConfig::default(),
            ThemeCatalog::new(vec![Theme::new("T")]),
            StdRng::seed_from_u64(1),
        );
        let mut outboxes = Outboxes::new();
        let (a, b) = (ConnectionId::new(), ConnectionId::new());
        let (a_tx, a_rx) = mpsc::channel(OUTBOX_CAPACITY);
        let (b_tx, mut b_rx) = mpsc::channel(OUTBOX_CAPACITY);
        outboxes.insert(a, a_tx);
        outboxes.insert(b, b_tx);

        let out = room.dispatch(a, Event::Login { name: Some("a".into()) });
        deliver(&mut room, &mut outboxes, out);
        assert_eq!(room.election().candidate(), Some(a));

        // A's writer is gone, so B's room:stats broadcast cannot reach it
        drop(a_rx);
        let out = room.dispatch(b, Event::Login { name: Some("b".into()) });
        deliver(&mut room, &mut outboxes, out);
        assert!(!outboxes.contains_key(&a));
        assert_eq!(room.election().candidate(), Some(b));

        let mut asked = false;
        while let Ok(notification) = b_rx.try_recv() {
            asked |= matches!(notification, Notification::ChairAsk { .. });
        }
        assert!(asked);
    }

    #[tokio::test]
    async fn test_round_over_tcp() {
        let server = start(100).await;

        let mut chair = Client::connect(server.addr()).await.unwrap();
        chair.login("chair").await.unwrap();
        expect(&mut chair, "chair:ask").await;
        chair.send(&ClientMessage::chair_answer(true)).await.unwrap();
        expect(&mut chair, "chair:assigned").await;

        let mut player = Client::connect(server.addr()).await.unwrap();
        player.login("player").await.unwrap();
        match expect(&mut player, "chair:status").await {
            Notification::ChairStatus {
                chairperson: Some(info),
            } => assert_eq!(info.name, "chair"),
            other => panic!("unexpected {:?}", other),
        }

        chair.send(&ClientMessage::ChairStart {}).await.unwrap();
        expect(&mut player, "game:started").await;

        player
            .send(&ClientMessage::OpinionSubmit { text: "mine".into() })
            .await
            .unwrap();
        expect(&mut player, "opinion:submitted").await;

        // Departure of the only other player leaves the chair alone in the quorum
        player.disconnect().await;
        loop {
            if let Notification::OpinionStatus(status) = expect(&mut chair, "opinion:status").await {
                if status.total == 1 {
                    assert_eq!(status.submitted_count, 0);
                    break;
                }
            }
        }

        chair.send(&ClientMessage::OpinionCollect {}).await.unwrap();
        match expect(&mut chair, "opinion:collected").await {
            Notification::OpinionCollected { opinions } => assert!(opinions.is_empty()),
            other => panic!("unexpected {:?}", other),
        }

        server.shutdown();
    }
}
