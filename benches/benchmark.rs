//! Performance benchmarks for rs-rdrview.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rs_rdrview::{extract_default, readerable, Config};

const SAMPLE_HTML: &str = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Sample Article</title>
    <meta name="author" content="John Doe">
    <meta name="description" content="A sample article for benchmarking.">
</head>
<body>
    <nav>
        <a href="/">Home</a>
        <a href="/about">About</a>
    </nav>
    <article>
        <h1>Sample Article Title</h1>
        <p class="byline">By John Doe</p>
        <p>This is the first paragraph of the article. It contains some meaningful
        content that should be extracted by the engine's scoring heuristics, long
        enough to clear the minimum article length threshold on the first pass.</p>
        <p>Here is a second paragraph with more content. The extraction should
        preserve the text while removing navigation and other boilerplate around
        it, such as the surrounding nav, aside, and footer elements.</p>
        <p>A third paragraph ensures we have enough content for meaningful
        benchmarking of the extraction performance across a realistic page shape.</p>
    </article>
    <aside>
        <h3>Related Articles</h3>
        <ul>
            <li>Related article 1</li>
            <li>Related article 2</li>
        </ul>
    </aside>
    <footer>
        <p>Copyright 2024</p>
    </footer>
</body>
</html>
"#;

fn bench_extract_default(c: &mut Criterion) {
    c.bench_function("extract_default", |b| {
        b.iter(|| extract_default(black_box(SAMPLE_HTML)));
    });
}

fn bench_extract_with_config(c: &mut Criterion) {
    let config = Config { clean_conditionally: false, ..Config::default() };

    c.bench_function("extract_with_config", |b| {
        b.iter(|| rs_rdrview::extract(black_box(SAMPLE_HTML), black_box(&config)));
    });
}

fn bench_readerable(c: &mut Criterion) {
    c.bench_function("readerable", |b| {
        b.iter(|| readerable(black_box(SAMPLE_HTML)));
    });
}

criterion_group!(benches, bench_extract_default, bench_extract_with_config, bench_readerable);
criterion_main!(benches);
