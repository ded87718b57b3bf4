use criterion::{criterion_group, criterion_main, Criterion};
use tiersearch_core::tokenizer::tokenize;
use tiersearch_core::{InvertedIndex, QueryEngine};

const LINES: &[&str] = &[
    "The world as we have created it is a process of our thinking",
    "It is our choices that show what we truly are far more than our abilities",
    "There are only two ways to live your life",
    "The person, be it gentleman or lady, who has not pleasure in a good novel",
    "Imperfection is beauty, madness is genius",
];

fn build_index(pages: usize) -> InvertedIndex {
    let mut ix = InvertedIndex::new();
    for i in 0..pages {
        let text: Vec<&str> = (0..20).map(|j| LINES[(i + j) % LINES.len()]).collect();
        ix.add_page(&format!("https://quotes.test/page/{i}/"), &tokenize(&text.join(" ")));
    }
    ix
}

fn bench_query(c: &mut Criterion) {
    let ix = build_index(500);
    let engine = QueryEngine::new(&ix);
    c.bench_function("query_three_words", |b| b.iter(|| engine.query("our thinking process")));
    c.bench_function("query_five_words", |b| b.iter(|| engine.query("is a process of our")));
}

criterion_group!(benches, bench_query);
criterion_main!(benches);
