#![no_main]

use arbitrary::Arbitrary;
use bzwiki_core::lookup::find;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    blob: Vec<u8>,
    needle: String,
}

fuzz_target!(|input: FuzzInput| {
    if input.blob.len() > 1_000_000 {
        return;
    }

    // Arbitrary bytes almost never form a well-formed blob; `find` must
    // never panic regardless, and a hit must always report a title that
    // is byte-identical to the needle and a chunk index of at least 1.
    match find(&input.blob, &input.needle) {
        Ok(Some((title, index))) => {
            assert_eq!(title, input.needle);
            assert!(index >= 1);
        }
        Ok(None) | Err(_) => {}
    }
});
