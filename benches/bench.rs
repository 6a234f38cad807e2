// Criterion benchmarks for Vibe Reco

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vibe_reco::core::matcher::apply_filters;
use vibe_reco::core::ranker::{build_prompt, parse_ranking};
use vibe_reco::core::{build_filter_set, ProductCatalog, ProgressiveMatcher};
use vibe_reco::models::{AttributeMap, AttributeName, AttributeValue, PriceRange, Product, RecommendationQuery};

const CATEGORIES: [&str; 4] = ["dress", "top", "pants", "skirt"];
const COLORS: [&str; 5] = ["red", "black", "white", "navy", "floral"];
const FABRICS: [&str; 4] = ["cotton", "silk", "linen", "denim"];
const OCCASIONS: [&str; 3] = ["casual", "party", "work"];

fn create_product(id: usize) -> Product {
    Product {
        id: format!("SKU{:05}", id),
        name: format!("Product {}", id),
        price: 15.0 + (id % 40) as f64 * 5.0,
        category: Some(CATEGORIES[id % CATEGORIES.len()].to_string()),
        fit: Some("regular".to_string()),
        fabric: Some(FABRICS[id % FABRICS.len()].to_string()),
        color_or_print: Some(COLORS[id % COLORS.len()].to_string()),
        occasion: Some(OCCASIONS[id % OCCASIONS.len()].to_string()),
        sleeve_length: None,
        neckline: None,
        length: None,
        pant_type: None,
        available_sizes: vec!["S".to_string(), "M".to_string(), "L".to_string()],
    }
}

fn create_catalog(size: usize) -> ProductCatalog {
    ProductCatalog::from_products((0..size).map(create_product).collect())
        .expect("generated catalog is valid")
}

fn create_attributes() -> AttributeMap {
    let mut attributes = AttributeMap::new();
    attributes.insert(AttributeName::Category, AttributeValue::new(["dress"], 0.95));
    attributes.insert(AttributeName::ColorOrPrint, AttributeValue::new(["red", "floral"], 0.85));
    attributes.insert(AttributeName::Fabric, AttributeValue::new(["silk"], 0.7));
    attributes.insert(AttributeName::Occasion, AttributeValue::new(["party"], 0.65));
    attributes.insert(AttributeName::Fit, AttributeValue::new(["relaxed"], 0.4));
    attributes
}

fn bench_build_filter_set(c: &mut Criterion) {
    let attributes = create_attributes();
    let price = PriceRange::up_to(120.0);

    c.bench_function("build_filter_set", |b| {
        b.iter(|| build_filter_set(black_box(&attributes), black_box(Some(&price)), 0.6));
    });
}

fn bench_progressive_matching(c: &mut Criterion) {
    let matcher = ProgressiveMatcher::default();
    let filters = build_filter_set(&create_attributes(), Some(&PriceRange::up_to(120.0)), 0.6);

    let mut group = c.benchmark_group("progressive_matching");

    for catalog_size in [50, 500, 5000].iter() {
        let catalog = create_catalog(*catalog_size);

        group.bench_with_input(
            BenchmarkId::new("find_candidates", catalog_size),
            catalog_size,
            |b, _| {
                b.iter(|| matcher.find_candidates(black_box(&catalog), black_box(filters.clone())));
            },
        );

        group.bench_with_input(
            BenchmarkId::new("apply_filters", catalog_size),
            catalog_size,
            |b, _| {
                b.iter(|| apply_filters(black_box(&catalog), black_box(&filters)).len());
            },
        );
    }

    group.finish();
}

fn bench_ranking_io(c: &mut Criterion) {
    let catalog = create_catalog(15);
    let candidates = catalog.list_products();
    let query = RecommendationQuery {
        original_query: "something red and flowy for a summer party".to_string(),
        attributes: create_attributes(),
        price: Some(PriceRange::up_to(120.0)),
        history: vec!["user: I have a party on Saturday".to_string()],
    };
    let raw = format!(
        r#"{{"rankings": [{}]}}"#,
        candidates
            .iter()
            .take(5)
            .map(|p| format!(r#"{{"product_id": "{}", "score": 90, "reasoning": "fits"}}"#, p.id))
            .collect::<Vec<_>>()
            .join(",")
    );

    c.bench_function("build_prompt_15_candidates", |b| {
        b.iter(|| build_prompt(black_box(candidates), black_box(&query), 5));
    });

    c.bench_function("parse_ranking_15_candidates", |b| {
        b.iter(|| parse_ranking(black_box(&raw), black_box(candidates), 5));
    });
}

criterion_group!(
    benches,
    bench_build_filter_set,
    bench_progressive_matching,
    bench_ranking_io
);

criterion_main!(benches);
