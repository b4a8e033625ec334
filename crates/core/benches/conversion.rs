use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use webharvest_core::parse::compile_selector;
use webharvest_core::{Document, ExtractionConfig, ImageFilter, MarkdownConverter, UrlResolver, collect_image_urls};

fn fixture() -> String {
    std::fs::read_to_string("../../tests/fixtures/blog_post.html").unwrap()
}

/// The fixture's main content repeated `n` times inside one `main`.
fn repeated(n: usize) -> String {
    let html = fixture();
    let start = html.find("<main>").unwrap() + "<main>".len();
    let end = html.find("</main>").unwrap();
    format!("<html><body><main>{}</main></body></html>", html[start..end].repeat(n))
}

fn bench_parse(c: &mut Criterion) {
    let html = fixture();
    c.bench_function("parse", |b| b.iter(|| Document::parse(black_box(&html))));
}

fn bench_convert(c: &mut Criterion) {
    let config = ExtractionConfig::builder().base_url("https://blog.example.com").build();
    let converter = MarkdownConverter::new(&config).unwrap();
    let selector = compile_selector("main").unwrap();

    let mut group = c.benchmark_group("convert");
    for n in [1, 10, 50] {
        let html = repeated(n);
        let doc = Document::parse(&html).unwrap();
        let root = doc.select_first(&selector).unwrap();
        group.bench_with_input(BenchmarkId::new("sections", n), &root, |b, root| {
            b.iter(|| converter.convert(black_box(root), "Bench", "https://blog.example.com/bench"))
        });
    }
    group.finish();
}

fn bench_collect_images(c: &mut Criterion) {
    let html = repeated(50);
    let doc = Document::parse(&html).unwrap();
    let root = doc.select_first(&compile_selector("main").unwrap()).unwrap();
    let filter = ImageFilter::new(&["icon", "avatar", "logo"]);
    let resolver = UrlResolver::new("https://blog.example.com");

    c.bench_function("collect_image_urls", |b| {
        b.iter(|| collect_image_urls(black_box(&root), &filter, &resolver))
    });
}

criterion_group!(benches, bench_parse, bench_convert, bench_collect_images);
criterion_main!(benches);
