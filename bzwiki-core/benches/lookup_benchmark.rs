use bzwiki_core::blob::{RECORD_DELIM, TITLE_DELIM};
use bzwiki_core::lookup::find;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn build_blob(n: usize) -> Vec<u8> {
    let mut titles: Vec<String> = (0..n).map(|i| format!("Article Title Number {:07}", i)).collect();
    titles.sort();
    let mut blob = Vec::new();
    for (i, t) in titles.iter().enumerate() {
        blob.push(TITLE_DELIM);
        blob.extend_from_slice(t.as_bytes());
        blob.push(RECORD_DELIM);
        blob.extend_from_slice((i as u64 + 1).to_string().as_bytes());
    }
    blob
}

fn bench_lookup(c: &mut Criterion) {
    let blob = build_blob(200_000);
    let needle = "Article Title Number 0150000";

    c.bench_function("exact_lookup_200k_hit", |b| {
        b.iter(|| find(black_box(&blob), black_box(needle)).unwrap())
    });

    c.bench_function("exact_lookup_200k_miss", |b| {
        b.iter(|| find(black_box(&blob), black_box("Not In The Blob At All")).unwrap())
    });
}

criterion_group!(benches, bench_lookup);
criterion_main!(benches);
