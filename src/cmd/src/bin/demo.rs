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

//! Three-node demo: node 0 produces a float dataframe and its checksum,
//! node 1 recomputes the sum through the plane, node 2 compares the two and
//! prints the verdict.

use anyhow::ensure;
use clap::Parser;
use eddy_cmd::ClusterOpts;
use eddy_common::catalog::Key;
use eddy_dataframe::{DataFrame, FrameStore};
use tracing::info;

#[derive(Parser, Debug)]
struct Opts {
    #[clap(flatten)]
    cluster: ClusterOpts,
}

struct Demo {
    store: FrameStore,
    size: usize,
    main: Key,
    verify: Key,
    check: Key,
}

impl Demo {
    async fn run(&self) -> anyhow::Result<()> {
        match self.store.this_node() {
            0 => self.producer().await,
            1 => self.counter().await,
            2 => self.summarizer().await,
            n => anyhow::bail!("demo runs on three nodes, got index {}", n),
        }
    }

    async fn producer(&self) -> anyhow::Result<()> {
        let vals: Vec<f32> = (0..self.size).map(|i| i as f32).collect();
        let sum: f32 = vals.iter().sum();
        DataFrame::from_float_slice(&self.main, &self.store, &vals).await?;
        DataFrame::from_float_scalar(&self.check, &self.store, sum).await?;
        info!("producer published {} values", self.size);
        self.store.closed().await;
        Ok(())
    }

    async fn counter(&self) -> anyhow::Result<()> {
        let df = self.store.wait_and_get(&self.main).await?;
        let mut sum = 0.0f32;
        for i in 0..df.nrows() {
            sum += df.get_float(0, i).await?;
        }
        info!("the sum is {}", sum);
        DataFrame::from_float_scalar(&self.verify, &self.store, sum).await?;
        self.store.closed().await;
        Ok(())
    }

    async fn summarizer(&self) -> anyhow::Result<()> {
        let result = self.store.wait_and_get(&self.verify).await?;
        let expected = self.store.wait_and_get(&self.check).await?;
        let ok = result.get_float(0, 0).await? == expected.get_float(0, 0).await?;
        println!("{}", if ok { "SUCCESS" } else { "FAILURE" });
        self.store.done();
        ensure!(ok, "recomputed sum does not match the checksum");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    eddy_cmd::init_logger();
    ensure!(opts.cluster.node_index <= 2, "demo runs on node indices 0..3");

    let demo = Demo {
        store: FrameStore::new(opts.cluster.node_index, 3, opts.cluster.store_config()).await?,
        size: if opts.cluster.small { 2_000 } else { 100_000 },
        main: Key::new("main", 0),
        verify: Key::new("verif", 0),
        check: Key::new("ck", 0),
    };
    demo.run().await
}
