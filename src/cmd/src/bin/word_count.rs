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

//! Distributed word count: node 0 reads the input into a one-column string
//! dataframe, every node counts the words homed on it, and node 0 reduces
//! the per-node counts.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::Parser;
use eddy_cmd::ClusterOpts;
use eddy_common::catalog::{Key, KeyBuilder};
use eddy_dataframe::{DataFrame, FrameStore, Row, Rower, Writer};
use tracing::info;

#[derive(Parser, Debug)]
struct Opts {
    #[clap(flatten)]
    cluster: ClusterOpts,

    /// Input file to count words in.
    #[clap(short = 'f', long)]
    file: PathBuf,

    /// Read at most this many bytes of the input.
    #[clap(short = 'l', long)]
    len: Option<u64>,
}

/// Feeds the input one word per row.
struct FileReader {
    words: std::vec::IntoIter<String>,
    next: Option<String>,
}

impl FileReader {
    fn open(path: &PathBuf, len: Option<u64>) -> anyhow::Result<Self> {
        let mut raw = std::fs::read(path)?;
        if let Some(cap) = len {
            raw.truncate(cap as usize);
        }
        let mut words: std::vec::IntoIter<String> = String::from_utf8_lossy(&raw)
            .split_whitespace()
            .map(str::to_owned)
            .collect::<Vec<_>>()
            .into_iter();
        let next = words.next();
        Ok(Self { words, next })
    }
}

impl Writer for FileReader {
    fn visit(&mut self, row: &mut Row) {
        let word = self.next.take().expect("visit called after done");
        row.set_str(0, word);
        self.next = self.words.next();
    }

    fn done(&mut self) -> bool {
        self.next.is_none()
    }
}

/// Tallies column 0 words into a map.
struct Adder<'a> {
    counts: &'a mut HashMap<String, i32>,
}

impl Rower for Adder<'_> {
    fn accept(&mut self, row: &Row) -> bool {
        *self.counts.entry(row.get_str(0).to_owned()).or_insert(0) += 1;
        false
    }
}

/// Replays a count map as `(word, count)` rows.
struct Summer {
    entries: std::vec::IntoIter<(String, i32)>,
    next: Option<(String, i32)>,
}

impl Summer {
    fn new(counts: HashMap<String, i32>) -> Self {
        let mut entries: std::vec::IntoIter<(String, i32)> =
            counts.into_iter().collect::<Vec<_>>().into_iter();
        let next = entries.next();
        Self { entries, next }
    }
}

impl Writer for Summer {
    fn visit(&mut self, row: &mut Row) {
        let (word, count) = self.next.take().expect("visit called after done");
        row.set_str(0, word);
        row.set_int(1, count);
        self.next = self.entries.next();
    }

    fn done(&mut self) -> bool {
        self.next.is_none()
    }
}

struct WordCount {
    store: FrameStore,
    opts: Opts,
    data: Key,
}

impl WordCount {
    /// Per-node count dataframes all live on node 0, which joins them.
    fn count_key(&self, idx: usize) -> Key {
        let mut builder = KeyBuilder::new(&Key::new("wc-map-", 0));
        builder.push(idx).build(0)
    }

    async fn run(&self) -> anyhow::Result<()> {
        if self.store.this_node() == 0 {
            let mut reader = FileReader::open(&self.opts.file, self.opts.len)?;
            DataFrame::from_visitor(&self.data, &self.store, "S", &mut reader).await?;
        }
        self.local_count().await?;
        if self.store.this_node() == 0 {
            self.reduce().await?;
            self.store.done();
        } else {
            self.store.closed().await;
        }
        Ok(())
    }

    /// Counts the words homed on this node and publishes the tally.
    async fn local_count(&self) -> anyhow::Result<()> {
        let words = self.store.wait_and_get(&self.data).await?;
        info!(node = self.store.this_node(), "starting local count");
        let mut counts = HashMap::new();
        words.local_map(&mut Adder { counts: &mut counts }).await?;
        let key = self.count_key(self.store.this_node());
        DataFrame::from_visitor(&key, &self.store, "SI", &mut Summer::new(counts)).await?;
        Ok(())
    }

    /// Joins every node's tally on node 0.
    async fn reduce(&self) -> anyhow::Result<()> {
        info!("reducing counts");
        let mut counts = HashMap::new();
        for idx in 0..self.store.num_nodes() {
            let partial = self.store.wait_and_get(&self.count_key(idx)).await?;
            let mut merge = MergeRower {
                counts: &mut counts,
            };
            partial.map(&mut merge).await?;
        }
        println!("different words: {}", counts.len());
        Ok(())
    }
}

/// Adds `(word, count)` rows into the reduction map.
struct MergeRower<'a> {
    counts: &'a mut HashMap<String, i32>,
}

impl Rower for MergeRower<'_> {
    fn accept(&mut self, row: &Row) -> bool {
        *self.counts.entry(row.get_str(0).to_owned()).or_insert(0) += row.get_int(1);
        false
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    eddy_cmd::init_logger();

    let store = FrameStore::new(
        opts.cluster.node_index,
        opts.cluster.num_nodes,
        opts.cluster.store_config(),
    )
    .await?;
    let app = WordCount {
        store,
        opts,
        data: Key::new("data", 0),
    };
    app.run().await
}
