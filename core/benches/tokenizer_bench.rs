use criterion::{criterion_group, criterion_main, Criterion};
use tiersearch_core::tokenizer::tokenize;

fn bench_tokenize(c: &mut Criterion) {
    let text = "“The world as we have created it is a process of our thinking. \
                It cannot be changed without changing our thinking.” by Albert Einstein (about) "
        .repeat(200);
    c.bench_function("tokenize_quotes", |b| b.iter(|| tokenize(&text)));
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
