#![no_main]

use arbitrary::Arbitrary;
use bzwiki_core::search::{search, SearchOptions};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    blob: Vec<u8>,
    query: String,
    shard_count: u8,
    page: u8,
}

fuzz_target!(|input: FuzzInput| {
    if input.blob.len() > 1_000_000 || input.query.len() > 10_000 {
        return;
    }

    let shard_count = (input.shard_count as usize).clamp(1, 64);
    let opts = SearchOptions::new(shard_count, None, 50).unwrap();

    // Arbitrary bytes are never a well-formed blob; `search` must never
    // panic, and splitting into any number of shards must never change the
    // total match count against a single shard.
    let sharded = search(&input.blob, &input.query, input.page as usize, &opts);

    let single_opts = SearchOptions::new(1, None, usize::MAX / 2).unwrap();
    let single = search(&input.blob, &input.query, 0, &single_opts);

    assert_eq!(sharded.total, single.total);
});
