// Copyright 2025 RisingWave Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Mesh transport between store nodes.
//!
//! Each node owns one listening socket plus one connection per peer. A
//! connection is served by two tasks: a writer draining an unbounded channel
//! of encoded frames, and a reader that reassembles newline-delimited frames
//! and hands decoded messages to the node. Any transport fault (EOF, recv or
//! send error, malformed frame) shuts the whole node down; there is no
//! reconnection.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use eddy_common::config::StoreConfig;
use eddy_common::util::addr::{node_addr, node_ip};
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::message::Message;
use crate::node::KvNode;

/// Handle for queueing frames onto one connection's writer task.
#[derive(Clone)]
pub(crate) struct PeerSender {
    tx: mpsc::UnboundedSender<bytes::Bytes>,
}

impl PeerSender {
    pub(crate) fn send(&self, msg: &Message) -> Result<()> {
        self.tx.send(msg.encode()).map_err(|_| Error::Shutdown)
    }
}

pub(crate) struct Network {
    idx: usize,
    config: StoreConfig,
    /// Connections by peer node index. `None` until the peer has registered
    /// (or been connected to).
    peers: Mutex<Vec<Option<PeerSender>>>,
    peers_changed: Notify,
    /// Registered `(ip, node index)` pairs. Maintained by the seed only.
    directory: Mutex<Vec<(String, usize)>>,
    cancel: CancellationToken,
}

impl Network {
    pub(crate) fn new(
        idx: usize,
        num_nodes: usize,
        config: StoreConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            idx,
            config,
            peers: Mutex::new(vec![None; num_nodes]),
            peers_changed: Notify::new(),
            directory: Mutex::new(Vec::new()),
            cancel,
        }
    }

    pub(crate) fn local_ip(&self) -> String {
        node_ip(self.idx).to_string()
    }

    /// Binds the listener and, on non-seed nodes, registers with the seed.
    pub(crate) async fn start(&self, node: &Arc<KvNode>) -> Result<()> {
        let listen_addr = node_addr(self.idx, self.config.listen_port);
        let listener = TcpListener::bind(listen_addr).await?;
        info!(node = self.idx, addr = %listen_addr, "listening for peers");
        tokio::spawn(accept_loop(node.clone(), listener));

        if self.idx != 0 {
            let seed_addr = node_addr(0, self.config.listen_port);
            let stream = self.connect_with_retry(seed_addr, "lead node").await?;
            let sender = adopt_connection(node, stream);
            self.set_peer(0, sender.clone());
            sender.send(&Message::Register {
                ip: self.local_ip(),
                sender: self.idx,
            })?;
        }
        Ok(())
    }

    /// Records a registration on the seed and returns the updated directory
    /// to send back.
    pub(crate) fn add_to_directory(&self, ip: &str, idx: usize) -> Message {
        let mut directory = self.directory.lock();
        directory.push((ip.to_owned(), idx));
        Message::Directory {
            addresses: directory.iter().map(|(ip, _)| ip.clone()).collect(),
            indices: directory.iter().map(|(_, idx)| *idx).collect(),
        }
    }

    pub(crate) fn set_peer(&self, idx: usize, sender: PeerSender) {
        self.peers.lock()[idx] = Some(sender);
        self.peers_changed.notify_waiters();
    }

    /// Waits until a connection to `dst` is known, then returns its sender.
    async fn sender_to(&self, dst: usize) -> Result<PeerSender> {
        loop {
            let notified = self.peers_changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if let Some(sender) = self.peers.lock()[dst].clone() {
                return Ok(sender);
            }
            debug!(node = self.idx, dst, "peer connection not yet known, waiting");
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(Error::Shutdown),
                _ = &mut notified => {}
            }
        }
    }

    pub(crate) async fn send_to_node(&self, dst: usize, msg: &Message) -> Result<()> {
        self.sender_to(dst).await?.send(msg)
    }

    pub(crate) fn peer_addr(&self, ip: Ipv4Addr) -> SocketAddr {
        SocketAddr::from((ip, self.config.listen_port))
    }

    pub(crate) async fn connect_with_retry(
        &self,
        addr: SocketAddr,
        what: &str,
    ) -> Result<TcpStream> {
        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::Shutdown);
            }
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    info!(node = self.idx, peer = %addr, "connected to {}", what);
                    return Ok(stream);
                }
                Err(e) => {
                    info!(
                        node = self.idx,
                        peer = %addr,
                        error = %e,
                        "connection to {} failed, retrying",
                        what
                    );
                    tokio::select! {
                        _ = self.cancel.cancelled() => return Err(Error::Shutdown),
                        _ = tokio::time::sleep(Duration::from_millis(
                            self.config.connect_retry_millis,
                        )) => {}
                    }
                }
            }
        }
    }
}

/// Splits the stream and spawns its writer and reader tasks. The returned
/// sender is also handed to the reader so message handlers can answer on the
/// connection the request came in on.
pub(crate) fn adopt_connection(node: &Arc<KvNode>, stream: TcpStream) -> PeerSender {
    let (read_half, write_half) = stream.into_split();
    let (tx, rx) = mpsc::unbounded_channel();
    let sender = PeerSender { tx };
    tokio::spawn(write_loop(node.clone(), write_half, rx));
    tokio::spawn(read_loop(node.clone(), read_half, sender.clone()));
    sender
}

/// Connects to a peer learned from the directory and announces this node on
/// the fresh connection.
pub(crate) fn spawn_connect(node: &Arc<KvNode>, ip: String, peer_idx: usize) {
    let node = node.clone();
    tokio::spawn(async move {
        let net = node.net();
        let Ok(ip) = ip.parse::<Ipv4Addr>() else {
            error!(node = node.this_node(), %ip, "malformed peer address in directory");
            node.shutdown();
            return;
        };
        let Ok(stream) = net.connect_with_retry(net.peer_addr(ip), "peer").await else {
            return;
        };
        let sender = adopt_connection(&node, stream);
        net.set_peer(peer_idx, sender.clone());
        let register = Message::Register {
            ip: net.local_ip(),
            sender: node.this_node(),
        };
        if sender.send(&register).is_err() {
            node.shutdown();
        }
    });
}

async fn accept_loop(node: Arc<KvNode>, listener: TcpListener) {
    loop {
        tokio::select! {
            _ = node.cancellation().cancelled() => return,
            res = listener.accept() => match res {
                Ok((stream, peer_addr)) => {
                    debug!(node = node.this_node(), peer = %peer_addr, "accepted connection");
                    adopt_connection(&node, stream);
                }
                Err(e) => {
                    warn!(node = node.this_node(), error = %e, "accept failed, shutting down");
                    node.shutdown();
                    return;
                }
            }
        }
    }
}

async fn write_loop(
    node: Arc<KvNode>,
    mut write_half: OwnedWriteHalf,
    mut rx: mpsc::UnboundedReceiver<bytes::Bytes>,
) {
    loop {
        tokio::select! {
            _ = node.cancellation().cancelled() => return,
            frame = rx.recv() => {
                let Some(frame) = frame else { return };
                if let Err(e) = write_half.write_all(&frame).await {
                    warn!(node = node.this_node(), error = %e, "send failed, shutting down");
                    node.shutdown();
                    return;
                }
            }
        }
    }
}

async fn read_loop(node: Arc<KvNode>, read_half: OwnedReadHalf, conn: PeerSender) {
    let mut reader = BufReader::new(read_half);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = tokio::select! {
            _ = node.cancellation().cancelled() => return,
            res = reader.read_until(b'\n', &mut buf) => match res {
                Ok(n) => n,
                Err(e) => {
                    warn!(node = node.this_node(), error = %e, "recv failed, shutting down");
                    node.shutdown();
                    return;
                }
            },
        };
        // A clean close and a frame truncated by the peer both end the
        // cluster's life.
        if n == 0 || buf.last() != Some(&b'\n') {
            if !node.cancellation().is_cancelled() {
                warn!(node = node.this_node(), "peer closed connection, shutting down");
                node.shutdown();
            }
            return;
        }
        let msg = match Message::decode(&buf[..buf.len() - 1]) {
            Ok(msg) => msg,
            Err(e) => {
                error!(node = node.this_node(), error = %e, "malformed frame, shutting down");
                node.shutdown();
                return;
            }
        };
        if let Err(e) = node.dispatch(msg, &conn) {
            error!(node = node.this_node(), error = %e, "message handling failed, shutting down");
            node.shutdown();
            return;
        }
    }
}
