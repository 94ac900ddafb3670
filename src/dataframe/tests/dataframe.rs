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

//! End-to-end dataframe tests. Multi-node tests run the whole cluster inside
//! one process on distinct loopback addresses; every test uses its own port.

use eddy_common::catalog::Key;
use eddy_common::config::{StoreConfig, CHUNK_SIZE};
use eddy_common::types::CellType;
use eddy_dataframe::{DataFrame, Fielder, FrameStore, Row, Rower, Writer};

fn config(port: u16) -> StoreConfig {
    StoreConfig {
        listen_port: port,
        warmup_millis: 300,
        connect_retry_millis: 100,
    }
}

async fn single_node(port: u16) -> FrameStore {
    FrameStore::new(0, 1, config(port)).await.unwrap()
}

/// Sums every int field it sees.
#[derive(Default)]
struct SumFielder {
    total: i64,
}

impl Fielder for SumFielder {
    fn accept_int(&mut self, v: i32) {
        self.total += v as i64;
    }
}

#[derive(Default)]
struct SumRower {
    total: i64,
}

impl Rower for SumRower {
    fn accept(&mut self, row: &Row) -> bool {
        let mut fielder = SumFielder::default();
        row.visit(row.index().unwrap_or(0), &mut fielder);
        self.total += fielder.total;
        false
    }
}

/// Keeps rows whose first int field exceeds the threshold.
struct AboveRower {
    threshold: i32,
}

impl Rower for AboveRower {
    fn accept(&mut self, row: &Row) -> bool {
        row.get_int(0) > self.threshold
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_trivial_float_roundtrip() {
    let store = single_node(9601).await;

    let vals: Vec<f32> = (0..100).map(|i| i as f32).collect();
    let key = Key::new("triv", 0);
    let df = DataFrame::from_float_slice(&key, &store, &vals).await.unwrap();
    assert_eq!(df.nrows(), 100);
    assert_eq!(df.get_float(0, 1).await.unwrap(), 1.0);

    let df2 = store.get(&key).await.unwrap();
    let mut sum = 0.0;
    for i in 0..df2.nrows() {
        sum += df2.get_float(0, i).await.unwrap();
    }
    assert_eq!(sum, 4950.0);

    store.done();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_map_and_filter() {
    let store = single_node(9602).await;

    struct Numbers {
        next: i32,
    }
    impl Writer for Numbers {
        fn visit(&mut self, row: &mut Row) {
            row.set_int(0, self.next);
            row.set_str(1, format!("row {}", self.next));
            self.next += 1;
        }
        fn done(&mut self) -> bool {
            self.next > 10000
        }
    }

    let key = Key::new("nums", 0);
    let mut writer = Numbers { next: 1 };
    let df = DataFrame::from_visitor(&key, &store, "IS", &mut writer)
        .await
        .unwrap();
    assert_eq!(df.nrows(), 10000);
    assert_eq!(df.ncols(), 2);

    let mut sum = SumRower::default();
    df.map(&mut sum).await.unwrap();
    assert_eq!(sum.total, 50005000);

    let mut above = AboveRower { threshold: 5000 };
    let filtered = df.filter(&mut above).await.unwrap();
    assert_eq!(filtered.nrows(), 5000);
    assert_eq!(filtered.ncols(), 2);
    assert_eq!(filtered.get_int(0, 0).await.unwrap(), 5001);
    assert_eq!(filtered.get_str(1, 4999).await.unwrap(), "row 10000");

    // The source dataframe is untouched by the filter.
    assert_eq!(df.get_int(0, 0).await.unwrap(), 1);

    store.done();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_padding_law() {
    use eddy_common::catalog::KeyBuilder;
    use eddy_dataframe::Column;

    let store = single_node(9603).await;
    let kv = store.kv().clone();

    let key = Key::new("pad", 0);
    let mut df = DataFrame::empty(kv.clone(), key.clone());
    let mut builder = KeyBuilder::new(&key);

    let anchor = builder.push("-ints").build(0);
    let mut ints = Column::new(CellType::Int, kv.clone(), &anchor);
    for i in 0..10000 {
        ints.push_int(i).await.unwrap();
    }
    ints.lock().await.unwrap();
    df.add_column(ints).await.unwrap();
    assert_eq!((df.ncols(), df.nrows()), (1, 10000));

    let anchor = builder.push("-bools").build(0);
    let mut bools = Column::new(CellType::Bool, kv.clone(), &anchor);
    for _ in 0..5000 {
        bools.push_bool(true).await.unwrap();
    }
    bools.lock().await.unwrap();
    df.add_column(bools).await.unwrap();
    assert_eq!((df.ncols(), df.nrows()), (2, 10000));
    assert_eq!(format!("{:?}", df.schema()), "IB");

    // The padded tail reads as the bool zero value.
    assert!(df.get_bool(1, 4999).await.unwrap());
    for row in [5000, 7500, 9999] {
        assert!(!df.get_bool(1, row).await.unwrap());
    }
    // The int column is untouched by the padding.
    assert_eq!(df.get_int(0, 9999).await.unwrap(), 9999);

    store.done();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_dataframe_blob_roundtrip() {
    let store = single_node(9604).await;

    struct Cycle {
        next: usize,
    }
    impl Writer for Cycle {
        fn visit(&mut self, row: &mut Row) {
            let i = self.next as i32;
            row.set_int(0, i % 4 + 1);
            row.set_bool(1, self.next % 2 == 0);
            row.set_float(2, (i % 4 + 1) as f32 * 1.1);
            row.set_str(3, if self.next % 2 == 0 { "hi" } else { "bye" }.to_owned());
            self.next += 1;
        }
        fn done(&mut self) -> bool {
            self.next >= 10000
        }
    }

    let key = Key::new("mixed", 0);
    let df = DataFrame::from_visitor(&key, &store, "IBFS", &mut Cycle { next: 0 })
        .await
        .unwrap();

    let df2 = store.get(&key).await.unwrap();
    assert_eq!(df2, df);
    assert_eq!(df2.encode(), df.encode());
    assert_eq!(df2.get_str(3, 1).await.unwrap(), "bye");
    assert_eq!(df2.get_float(2, 0).await.unwrap(), 1.1);

    store.done();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_chunk_boundary_local_map() {
    let port = 9605;
    let mut apps = Vec::new();
    for idx in 0..3 {
        apps.push(tokio::spawn(async move {
            let store = FrameStore::new(idx, 3, config(port)).await.unwrap();
            let key = Key::new("ints", 0);

            if idx == 0 {
                let mut vals = Vec::with_capacity(CHUNK_SIZE * 3);
                for i in 0..CHUNK_SIZE * 3 {
                    vals.push((i / CHUNK_SIZE) as i32 + 1);
                }
                DataFrame::from_int_slice(&key, &store, &vals).await.unwrap();
            }

            let df = store.wait_and_get(&key).await.unwrap();
            // Chunk placement is round-robin, so chunk `c` lives on node
            // `c mod 3` and each node sums only its own third.
            for chunk in 0..3 {
                assert_eq!(df.home_of_row(chunk * CHUNK_SIZE), chunk % 3);
            }
            let mut sum = SumRower::default();
            df.local_map(&mut sum).await.unwrap();
            assert_eq!(sum.total, (CHUNK_SIZE * (idx + 1)) as i64);
            store
        }));
    }
    for app in apps {
        app.await.unwrap().done();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_producer_counter_summarizer() {
    let port = 9606;
    let main_key = Key::new("main", 0);
    let verify_key = Key::new("verif", 0);
    let check_key = Key::new("ck", 0);

    let mut apps = Vec::new();
    for idx in 0..3 {
        let (main_key, verify_key, check_key) =
            (main_key.clone(), verify_key.clone(), check_key.clone());
        apps.push(tokio::spawn(async move {
            let store = FrameStore::new(idx, 3, config(port)).await.unwrap();
            match idx {
                0 => {
                    let vals: Vec<f32> = (0..100).map(|i| i as f32).collect();
                    let sum: f32 = vals.iter().sum();
                    DataFrame::from_float_slice(&main_key, &store, &vals)
                        .await
                        .unwrap();
                    DataFrame::from_float_scalar(&check_key, &store, sum)
                        .await
                        .unwrap();
                }
                1 => {
                    let df = store.wait_and_get(&main_key).await.unwrap();
                    let mut sum = 0.0;
                    for i in 0..df.nrows() {
                        sum += df.get_float(0, i).await.unwrap();
                    }
                    DataFrame::from_float_scalar(&verify_key, &store, sum)
                        .await
                        .unwrap();
                }
                2 => {
                    let result = store.wait_and_get(&verify_key).await.unwrap();
                    let expected = store.wait_and_get(&check_key).await.unwrap();
                    assert_eq!(
                        result.get_float(0, 0).await.unwrap(),
                        expected.get_float(0, 0).await.unwrap()
                    );
                }
                _ => unreachable!(),
            }
            store
        }));
    }
    for app in apps {
        app.await.unwrap().done();
    }
}
