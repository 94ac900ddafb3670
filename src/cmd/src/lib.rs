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

//! Shared plumbing for the example drivers: logging setup and the common
//! cluster CLI surface.

use std::path::PathBuf;

use clap::Parser;
use eddy_common::config::{load_config, StoreConfig};

/// Initializes stderr logging. `RUST_LOG` overrides the default level.
pub fn init_logger() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// CLI options every driver shares.
#[derive(Parser, Debug)]
pub struct ClusterOpts {
    /// Index of this node within the cluster.
    #[clap(short = 'i', long, default_value_t = 0)]
    pub node_index: usize,

    /// Total number of nodes in the cluster.
    #[clap(short = 'n', long, default_value_t = 1)]
    pub num_nodes: usize,

    /// Optional TOML file with store tunables.
    #[clap(long)]
    pub config_path: Option<PathBuf>,

    /// Run a smaller workload, sized for leak-check tooling.
    #[clap(short = 'v', long)]
    pub small: bool,
}

impl ClusterOpts {
    pub fn store_config(&self) -> StoreConfig {
        load_config(self.config_path.as_deref())
    }
}
