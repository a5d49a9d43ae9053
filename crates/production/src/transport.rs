//! TCP peer transport: unicast fan-out to a fixed set of peers.
//!
//! One writer task per peer holds a lazily-established, reconnecting TCP
//! connection. `broadcast` enqueues the encoded frame on every writer
//! without waiting on any of them, so a slow or dead peer never delays
//! delivery to the others. Delivery is at most once: send failures and
//! timeouts are logged and the frame is dropped — the quorum logic upstream
//! is the sole correctness mechanism, so there is no retransmission and no
//! acknowledgment.

use crate::codec::{self, CodecError, MAX_FRAME_BYTES};
use dashmap::DashMap;
use pbft_core::Event;
use pbft_types::{ConsensusMessage, NodeId};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Configuration for outbound peer connections.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Bound on connect and per-frame write time. Expiry is treated like a
    /// silent drop.
    pub send_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_secs(1),
        }
    }
}

/// Outbound side of the peer transport.
///
/// Holds one frame queue per peer; each queue is drained by a dedicated
/// writer task that owns the TCP connection to that peer.
#[derive(Debug)]
pub struct PeerTransport {
    local: NodeId,
    senders: DashMap<NodeId, mpsc::UnboundedSender<Vec<u8>>>,
}

impl PeerTransport {
    /// Create the transport and spawn one writer task per peer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        local: NodeId,
        peer_addrs: HashMap<NodeId, SocketAddr>,
        config: TransportConfig,
    ) -> Arc<Self> {
        let senders = DashMap::new();
        for (peer, addr) in peer_addrs {
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(peer_writer(peer.clone(), addr, rx, config.clone()));
            senders.insert(peer, tx);
        }
        Arc::new(Self { local, senders })
    }

    /// Queue a message for one peer.
    pub fn send(&self, peer: &NodeId, message: &ConsensusMessage) -> Result<(), CodecError> {
        let frame = codec::encode_message(message)?;
        self.send_frame(peer, frame);
        Ok(())
    }

    /// Queue a message for every peer. The frame is encoded once.
    pub fn broadcast(&self, message: &ConsensusMessage) -> Result<(), CodecError> {
        let frame = codec::encode_message(message)?;
        for entry in self.senders.iter() {
            self.send_frame(entry.key(), frame.clone());
        }
        debug!(
            node = %self.local,
            msg = message.type_name(),
            peers = self.senders.len(),
            "broadcast queued"
        );
        Ok(())
    }

    fn send_frame(&self, peer: &NodeId, frame: Vec<u8>) {
        match self.senders.get(peer) {
            Some(tx) => {
                if tx.send(frame).is_err() {
                    warn!(node = %self.local, %peer, "peer writer task gone; frame dropped");
                }
            }
            None => warn!(node = %self.local, %peer, "unknown peer; frame dropped"),
        }
    }
}

/// Writer task for a single peer. Connects on demand, drops frames on any
/// failure, and reconnects on the next frame.
async fn peer_writer(
    peer: NodeId,
    addr: SocketAddr,
    mut rx: mpsc::UnboundedReceiver<Vec<u8>>,
    config: TransportConfig,
) {
    let mut stream: Option<TcpStream> = None;

    while let Some(frame) = rx.recv().await {
        if stream.is_none() {
            match timeout(config.send_timeout, TcpStream::connect(addr)).await {
                Ok(Ok(s)) => {
                    debug!(%peer, %addr, "peer connection established");
                    stream = Some(s);
                }
                Ok(Err(err)) => {
                    warn!(%peer, %addr, %err, "peer connect failed; frame dropped");
                    continue;
                }
                Err(_) => {
                    warn!(%peer, %addr, "peer connect timed out; frame dropped");
                    continue;
                }
            }
        }

        let Some(s) = stream.as_mut() else { continue };
        let write = async {
            s.write_u32(frame.len() as u32).await?;
            s.write_all(&frame).await?;
            s.flush().await
        };
        match timeout(config.send_timeout, write).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(%peer, %err, "send failed; frame dropped");
                stream = None;
            }
            Err(_) => {
                warn!(%peer, "send timed out; frame dropped");
                stream = None;
            }
        }
    }
}

/// Bind the inbound peer listener and start accepting connections.
///
/// Every decoded frame is forwarded into `event_tx` for the node loop.
/// Returns the bound address (useful with port 0) and the accept-loop task.
pub async fn spawn_peer_listener(
    listen_addr: SocketAddr,
    event_tx: mpsc::UnboundedSender<Event>,
) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind(listen_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "peer listener started");

    let task = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, remote)) => {
                    debug!(%remote, "inbound peer connection");
                    tokio::spawn(read_frames(stream, event_tx.clone()));
                }
                Err(err) => warn!(%err, "accept failed"),
            }
        }
    });

    Ok((local_addr, task))
}

/// Read length-prefixed frames from one inbound connection until it closes.
async fn read_frames(mut stream: TcpStream, event_tx: mpsc::UnboundedSender<Event>) {
    loop {
        let len = match stream.read_u32().await {
            Ok(len) => len as usize,
            // Peer closed the connection; normal end of stream.
            Err(_) => break,
        };
        if len > MAX_FRAME_BYTES {
            warn!(len, "oversized frame; closing connection");
            break;
        }

        let mut buf = vec![0u8; len];
        if stream.read_exact(&mut buf).await.is_err() {
            break;
        }

        match codec::decode_message(&buf) {
            Ok(event) => {
                if event_tx.send(event).is_err() {
                    // Node loop is gone; stop reading.
                    break;
                }
            }
            Err(err) => warn!(%err, "undecodable frame dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbft_types::{Hash, PrepareMsg, SequenceNumber, ViewNumber};

    fn prepare(seq: u64) -> ConsensusMessage {
        ConsensusMessage::Prepare(PrepareMsg {
            view: ViewNumber(0),
            sequence: SequenceNumber(seq),
            digest: Hash::from_bytes(b"digest"),
            sender: NodeId::from("node1"),
        })
    }

    #[tokio::test]
    async fn test_broadcast_reaches_listener() {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (addr, _listener) = spawn_peer_listener("127.0.0.1:0".parse().unwrap(), event_tx)
            .await
            .unwrap();

        let transport = PeerTransport::new(
            NodeId::from("node1"),
            HashMap::from([(NodeId::from("node2"), addr)]),
            TransportConfig::default(),
        );

        transport.broadcast(&prepare(1)).unwrap();
        transport.broadcast(&prepare(2)).unwrap();

        for expected in [1u64, 2] {
            let event = event_rx.recv().await.expect("event delivered");
            match event {
                Event::PrepareReceived { vote } => {
                    assert_eq!(vote.sequence, SequenceNumber(expected));
                }
                other => panic!("unexpected event {}", other.type_name()),
            }
        }
    }

    #[tokio::test]
    async fn test_send_to_unknown_peer_is_a_logged_drop() {
        let transport = PeerTransport::new(
            NodeId::from("node1"),
            HashMap::new(),
            TransportConfig::default(),
        );
        // No peers registered: nothing to deliver to, nothing to panic on.
        transport.send(&NodeId::from("node9"), &prepare(1)).unwrap();
        transport.broadcast(&prepare(1)).unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_peer_does_not_block_others() {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (addr, _listener) = spawn_peer_listener("127.0.0.1:0".parse().unwrap(), event_tx)
            .await
            .unwrap();

        // One live peer, one black hole.
        let transport = PeerTransport::new(
            NodeId::from("node1"),
            HashMap::from([
                (NodeId::from("node2"), addr),
                (NodeId::from("node3"), "127.0.0.1:1".parse().unwrap()),
            ]),
            TransportConfig {
                send_timeout: Duration::from_millis(200),
            },
        );

        transport.broadcast(&prepare(7)).unwrap();
        let event = event_rx.recv().await.expect("live peer still served");
        assert!(matches!(event, Event::PrepareReceived { .. }));
    }
}
