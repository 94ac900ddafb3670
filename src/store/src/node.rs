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

//! One node of the distributed key/value plane.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use eddy_common::catalog::Key;
use eddy_common::config::{StoreConfig, MAX_NODES};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::memory::MemoryBlobStore;
use crate::message::{Message, MsgKind};
use crate::net::{self, Network, PeerSender};

/// Single-occupancy mailbox for the answer to an in-flight remote request.
///
/// The application contract allows at most one outstanding remote `put`, one
/// `get`, and one `wait_and_get` per node, so each gets its own slot and a
/// double fill is an assertion failure.
#[derive(Default)]
struct Slot {
    value: Mutex<Option<Bytes>>,
    ready: Notify,
}

impl Slot {
    fn fill(&self, blob: Bytes) {
        let mut slot = self.value.lock();
        assert!(slot.is_none(), "reply slot already occupied");
        *slot = Some(blob);
        drop(slot);
        self.ready.notify_waiters();
    }

    async fn take(&self) -> Bytes {
        loop {
            let notified = self.ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if let Some(blob) = self.value.lock().take() {
                return blob;
            }
            notified.await;
        }
    }
}

/// A key/value store node plus its request/reply engine.
///
/// `put`, `get` and `wait_and_get` short-circuit to the local map when the
/// key is homed here, and otherwise forward a message to the home node and
/// block until the matching `Ack`/`Reply` arrives. Blocking calls observe
/// shutdown and fail with [`Error::Shutdown`].
pub struct KvNode {
    idx: usize,
    num_nodes: usize,
    map: MemoryBlobStore,
    net: Network,
    ack: Slot,
    reply_get: Slot,
    reply_wag: Slot,
    cancel: CancellationToken,
}

impl KvNode {
    /// Boots this node's transport and waits out the registration warmup.
    ///
    /// Node 0 is the seed: it starts with an empty directory and answers
    /// registrations. All other nodes derive the seed's address, register
    /// with it, and then connect to every peer the directory lists.
    pub async fn start(idx: usize, num_nodes: usize, config: StoreConfig) -> Result<Arc<Self>> {
        assert!(
            num_nodes >= 1 && num_nodes <= MAX_NODES,
            "cluster size {} out of range",
            num_nodes
        );
        assert!(idx < num_nodes, "node index {} out of range", idx);

        let cancel = CancellationToken::new();
        let warmup = Duration::from_millis(config.warmup_millis);
        let node = Arc::new(Self {
            idx,
            num_nodes,
            map: MemoryBlobStore::new(),
            net: Network::new(idx, num_nodes, config, cancel.clone()),
            ack: Slot::default(),
            reply_get: Slot::default(),
            reply_wag: Slot::default(),
            cancel,
        });
        node.net.start(&node).await?;
        tokio::time::sleep(warmup).await;
        Ok(node)
    }

    pub fn this_node(&self) -> usize {
        self.idx
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Stores `blob` under `key`, blocking until the home node acknowledged
    /// it.
    pub async fn put(&self, key: &Key, blob: Bytes) -> Result<()> {
        if key.home() == self.idx {
            self.map.insert(key.id().to_owned(), blob);
            return Ok(());
        }
        debug!(node = self.idx, key = ?key, "forwarding put");
        let msg = Message::Put {
            key: key.clone(),
            blob,
        };
        self.net.send_to_node(key.home(), &msg).await?;
        self.with_cancel(self.ack.take()).await?;
        Ok(())
    }

    /// Returns the value under `key`. A local key that is absent is an
    /// error; use [`KvNode::wait_and_get`] when the value may not have been
    /// produced yet.
    pub async fn get(&self, key: &Key) -> Result<Bytes> {
        if key.home() == self.idx {
            return self.local_get(key);
        }
        debug!(node = self.idx, key = ?key, "forwarding get");
        let msg = Message::Get { key: key.clone() };
        self.net.send_to_node(key.home(), &msg).await?;
        self.with_cancel(self.reply_get.take()).await
    }

    /// Blocks until a value exists under `key`, then returns it.
    pub async fn wait_and_get(&self, key: &Key) -> Result<Bytes> {
        if key.home() == self.idx {
            return self.with_cancel(self.map.wait_for(key.id())).await;
        }
        debug!(node = self.idx, key = ?key, "forwarding wait_and_get");
        let msg = Message::WaitAndGet { key: key.clone() };
        self.net.send_to_node(key.home(), &msg).await?;
        self.with_cancel(self.reply_wag.take()).await
    }

    pub fn shutdown(&self) {
        if !self.cancel.is_cancelled() {
            info!(node = self.idx, "shutting down");
            self.cancel.cancel();
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the node has shut down, whether locally via
    /// [`KvNode::shutdown`] or because a peer connection was lost.
    pub async fn closed(&self) {
        self.cancel.cancelled().await;
    }

    pub(crate) fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn net(&self) -> &Network {
        &self.net
    }

    fn local_get(&self, key: &Key) -> Result<Bytes> {
        self.map
            .get(key.id())
            .ok_or_else(|| Error::KeyNotFound(key.id().to_owned()))
    }

    async fn with_cancel<T>(&self, fut: impl Future<Output = T>) -> Result<T> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(Error::Shutdown),
            value = fut => Ok(value),
        }
    }

    /// Routes one inbound message.
    ///
    /// `Register`, `Directory`, `Ack` and `Reply` are cheap and handled
    /// inline. `Put`, `Get` and `WaitAndGet` issue blocking store calls of
    /// their own (a `Put` handler's reply may be the very `Ack` another call
    /// is waiting on), so each runs in a fresh task and the reader stays
    /// free to drain the connection.
    pub(crate) fn dispatch(self: &Arc<Self>, msg: Message, conn: &PeerSender) -> Result<()> {
        match msg {
            Message::Register { ip, sender } => {
                debug!(node = self.idx, from = sender, %ip, "peer registered");
                if self.idx == 0 {
                    let directory = self.net.add_to_directory(&ip, sender);
                    conn.send(&directory)?;
                }
                self.net.set_peer(sender, conn.clone());
                Ok(())
            }
            Message::Directory { addresses, indices } => {
                if addresses.len() != indices.len() {
                    return Err(Error::Protocol(
                        "directory address/index length mismatch".to_owned(),
                    ));
                }
                for (ip, peer_idx) in addresses.into_iter().zip(indices) {
                    if peer_idx != self.idx {
                        net::spawn_connect(self, ip, peer_idx);
                    }
                }
                Ok(())
            }
            Message::Ack => {
                self.ack.fill(Bytes::new());
                Ok(())
            }
            Message::Reply { request, blob } => match request {
                MsgKind::Get => {
                    self.reply_get.fill(blob);
                    Ok(())
                }
                MsgKind::WaitAndGet => {
                    self.reply_wag.fill(blob);
                    Ok(())
                }
                other => Err(Error::Protocol(format!(
                    "reply to non-request kind {:?}",
                    other
                ))),
            },
            Message::Put { key, blob } => {
                self.spawn_handler(conn, move |node, conn| async move {
                    node.handle_put(key, blob, &conn).await
                });
                Ok(())
            }
            Message::Get { key } => {
                self.spawn_handler(conn, move |node, conn| async move {
                    node.handle_get(key, &conn).await
                });
                Ok(())
            }
            Message::WaitAndGet { key } => {
                self.spawn_handler(conn, move |node, conn| async move {
                    node.handle_wait_and_get(key, &conn).await
                });
                Ok(())
            }
        }
    }

    fn spawn_handler<F, Fut>(self: &Arc<Self>, conn: &PeerSender, f: F)
    where
        F: FnOnce(Arc<KvNode>, PeerSender) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let node = self.clone();
        let conn = conn.clone();
        tokio::spawn(async move {
            if let Err(e) = f(node.clone(), conn).await {
                error!(node = node.idx, error = %e, "request handler failed, shutting down");
                node.shutdown();
            }
        });
    }

    fn check_home(&self, key: &Key) -> Result<()> {
        if key.home() != self.idx {
            return Err(Error::WrongHome {
                key: key.id().to_owned(),
                home: key.home(),
                node: self.idx,
            });
        }
        Ok(())
    }

    async fn handle_put(&self, key: Key, blob: Bytes, conn: &PeerSender) -> Result<()> {
        self.check_home(&key)?;
        self.map.insert(key.id().to_owned(), blob);
        conn.send(&Message::Ack)
    }

    async fn handle_get(&self, key: Key, conn: &PeerSender) -> Result<()> {
        self.check_home(&key)?;
        let blob = self.local_get(&key)?;
        conn.send(&Message::Reply {
            request: MsgKind::Get,
            blob,
        })
    }

    async fn handle_wait_and_get(&self, key: Key, conn: &PeerSender) -> Result<()> {
        self.check_home(&key)?;
        let blob = self.with_cancel(self.map.wait_for(key.id())).await?;
        conn.send(&Message::Reply {
            request: MsgKind::WaitAndGet,
            blob,
        })
    }
}
