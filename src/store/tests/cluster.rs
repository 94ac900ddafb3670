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

//! Cluster tests running several nodes inside one process. Node `i` binds
//! `127.0.0.(i + 1)`, so every test uses a distinct port to stay out of the
//! others' way.

use std::sync::Arc;

use bytes::Bytes;
use eddy_common::catalog::Key;
use eddy_common::config::StoreConfig;
use eddy_store::error::Error;
use eddy_store::KvNode;

fn config(port: u16) -> StoreConfig {
    StoreConfig {
        listen_port: port,
        warmup_millis: 300,
        connect_retry_millis: 100,
    }
}

async fn start_cluster<const N: usize>(port: u16) -> [Arc<KvNode>; N] {
    let mut handles = Vec::new();
    for idx in 0..N {
        handles.push(tokio::spawn(KvNode::start(idx, N, config(port))));
    }
    let mut nodes = Vec::new();
    for handle in handles {
        nodes.push(handle.await.unwrap().unwrap());
    }
    nodes.try_into().unwrap_or_else(|_| unreachable!())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_node_roundtrip() {
    let [node] = start_cluster::<1>(9401).await;

    let key = Key::new("triv", 0);
    node.put(&key, Bytes::from_static(b"payload")).await.unwrap();
    assert_eq!(node.get(&key).await.unwrap(), Bytes::from_static(b"payload"));
    assert_eq!(
        node.wait_and_get(&key).await.unwrap(),
        Bytes::from_static(b"payload")
    );

    // A later put under the same key replaces the value.
    node.put(&key, Bytes::from_static(b"updated")).await.unwrap();
    assert_eq!(node.get(&key).await.unwrap(), Bytes::from_static(b"updated"));

    let absent = Key::new("absent", 0);
    assert!(matches!(
        node.get(&absent).await,
        Err(Error::KeyNotFound(id)) if id == "absent"
    ));

    node.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_remote_put_and_get() {
    let [node0, node1, node2] = start_cluster::<3>(9402).await;

    // node 1 stores a value homed on node 0, blocking on the ack.
    let key = Key::new("shared", 0);
    node1.put(&key, Bytes::from_static(b"from node 1")).await.unwrap();

    // Read-your-writes through the plane, from every node.
    assert_eq!(
        node0.get(&key).await.unwrap(),
        Bytes::from_static(b"from node 1")
    );
    assert_eq!(
        node1.get(&key).await.unwrap(),
        Bytes::from_static(b"from node 1")
    );
    assert_eq!(
        node2.get(&key).await.unwrap(),
        Bytes::from_static(b"from node 1")
    );

    for node in [node0, node1, node2] {
        node.shutdown();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_wait_and_get_blocks_until_put() {
    let [node0, node1, node2] = start_cluster::<3>(9403).await;

    // node 2 asks for a value homed on node 1 before it exists.
    let key = Key::new("late", 1);
    let waiter = {
        let node2 = node2.clone();
        let key = key.clone();
        tokio::spawn(async move { node2.wait_and_get(&key).await })
    };

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(!waiter.is_finished());

    node0.put(&key, Bytes::from_static(b"finally")).await.unwrap();
    assert_eq!(
        waiter.await.unwrap().unwrap(),
        Bytes::from_static(b"finally")
    );

    for node in [node0, node1, node2] {
        node.shutdown();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shutdown_aborts_blocked_calls() {
    let [node] = start_cluster::<1>(9404).await;

    let waiter = {
        let node = node.clone();
        tokio::spawn(async move { node.wait_and_get(&Key::new("never", 0)).await })
    };
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    node.shutdown();
    assert!(matches!(waiter.await.unwrap(), Err(Error::Shutdown)));
}
