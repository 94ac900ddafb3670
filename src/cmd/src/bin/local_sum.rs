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

//! Chunk-placement check on three nodes: an int column of three chunks is
//! spread round-robin, and each node's `local_map` must see exactly its own
//! chunk.

use std::time::Duration;

use anyhow::ensure;
use clap::Parser;
use eddy_cmd::ClusterOpts;
use eddy_common::catalog::Key;
use eddy_common::config::CHUNK_SIZE;
use eddy_dataframe::{DataFrame, FrameStore, Row, Rower};
use tracing::info;

#[derive(Parser, Debug)]
struct Opts {
    #[clap(flatten)]
    cluster: ClusterOpts,
}

#[derive(Default)]
struct SumRower {
    total: i64,
}

impl Rower for SumRower {
    fn accept(&mut self, row: &Row) -> bool {
        self.total += row.get_int(0) as i64;
        false
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    eddy_cmd::init_logger();
    let idx = opts.cluster.node_index;
    ensure!(idx <= 2, "local_sum runs on node indices 0..3");

    let store = FrameStore::new(idx, 3, opts.cluster.store_config()).await?;
    let key = Key::new("ints", 0);

    if idx == 0 {
        // Chunk 0 holds all 1s, chunk 1 all 2s, chunk 2 all 3s.
        let mut vals = Vec::with_capacity(CHUNK_SIZE * 3);
        for i in 0..CHUNK_SIZE * 3 {
            vals.push((i / CHUNK_SIZE) as i32 + 1);
        }
        DataFrame::from_int_slice(&key, &store, &vals).await?;
    }

    let df = store.wait_and_get(&key).await?;
    let mut sum = SumRower::default();
    df.local_map(&mut sum).await?;
    ensure!(
        sum.total == (CHUNK_SIZE * (idx + 1)) as i64,
        "node {} saw local sum {}",
        idx,
        sum.total
    );
    info!(node = idx, "local map check passed");

    if idx == 0 {
        // Give the other nodes a moment to finish their sums before the
        // shutdown cascades through the closed connections.
        tokio::time::sleep(Duration::from_secs(2)).await;
        store.done();
    } else {
        store.closed().await;
    }
    Ok(())
}
