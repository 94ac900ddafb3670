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

//! Single-node smoke test: store a float dataframe, read it back through
//! the plane, and check that the sum survived.

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

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    eddy_cmd::init_logger();

    let size: usize = if opts.cluster.small { 10_000 } else { 1_000_000 };
    let store = FrameStore::new(0, 1, opts.cluster.store_config()).await?;

    let vals: Vec<f32> = (0..size).map(|i| i as f32).collect();
    let mut sum: f64 = vals.iter().map(|&v| v as f64).sum();

    let key = Key::new("triv", 0);
    let df = DataFrame::from_float_slice(&key, &store, &vals).await?;
    ensure!(df.get_float(0, 1).await? == 1.0, "unexpected value at row 1");

    let df2 = store.get(&key).await?;
    for i in 0..df2.nrows() {
        sum -= df2.get_float(0, i).await? as f64;
    }
    ensure!(sum == 0.0, "sum of retrieved values drifted by {}", sum);

    info!("trivial dataframe check passed");
    store.done();
    Ok(())
}
