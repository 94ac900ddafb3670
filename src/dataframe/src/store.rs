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

use std::sync::Arc;

use eddy_common::catalog::Key;
use eddy_common::config::StoreConfig;
use eddy_store::KvNode;

use crate::error::Result;
use crate::frame::DataFrame;

/// Dataframe-level façade over a store node.
///
/// Applications are constructed from their node index and the cluster size,
/// own one `FrameStore`, and speak in dataframes; the store translates to
/// and from blobs on the K/V plane. `done` tears the node down.
#[derive(Clone)]
pub struct FrameStore {
    kv: Arc<KvNode>,
}

impl FrameStore {
    /// Boots the underlying store node and joins the cluster.
    pub async fn new(idx: usize, num_nodes: usize, config: StoreConfig) -> Result<Self> {
        Ok(Self {
            kv: KvNode::start(idx, num_nodes, config).await?,
        })
    }

    pub fn from_node(kv: Arc<KvNode>) -> Self {
        Self { kv }
    }

    pub fn kv(&self) -> &Arc<KvNode> {
        &self.kv
    }

    pub fn this_node(&self) -> usize {
        self.kv.this_node()
    }

    pub fn num_nodes(&self) -> usize {
        self.kv.num_nodes()
    }

    /// Fetches and rehydrates the dataframe stored under `key`.
    pub async fn get(&self, key: &Key) -> Result<DataFrame> {
        let blob = self.kv.get(key).await?;
        DataFrame::decode(&blob, self.kv.clone(), key.clone())
    }

    /// Like [`FrameStore::get`], but blocks until the dataframe exists.
    pub async fn wait_and_get(&self, key: &Key) -> Result<DataFrame> {
        let blob = self.kv.wait_and_get(key).await?;
        DataFrame::decode(&blob, self.kv.clone(), key.clone())
    }

    /// Called when the application has finished its execution.
    pub fn done(&self) {
        self.kv.shutdown();
    }

    /// Resolves once the underlying node has shut down. Nodes whose work is
    /// finished park here until another node ends the run.
    pub async fn closed(&self) {
        self.kv.closed().await;
    }
}
