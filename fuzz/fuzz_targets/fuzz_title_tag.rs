#![no_main]

use arbitrary::Arbitrary;
use bzwiki_core::index_builder::extract_title_tag;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    line: String,
    cur_index: u64,
}

fuzz_target!(|input: FuzzInput| {
    if input.line.len() > 1_000_000 {
        return;
    }

    // Must never panic, regardless of where `<title>`/`</title>` land or
    // what bytes sit between them.
    let _ = extract_title_tag(&input.line, input.cur_index);
});
