// Unit tests for Vibe Reco

use vibe_reco::core::{
    filters::{build_filter_set, Filter, FilterSet},
    matcher::{apply_filters, ProgressiveMatcher},
    ranker::parse_ranking,
    ProductCatalog,
};
use vibe_reco::models::{AttributeMap, AttributeName, AttributeValue, PriceRange, Product};

fn create_product(id: usize, category: &str, color: &str, fabric: &str, price: f64) -> Product {
    Product {
        id: format!("p{}", id),
        name: format!("Product {}", id),
        price,
        category: Some(category.to_string()),
        fit: Some("regular".to_string()),
        fabric: Some(fabric.to_string()),
        color_or_print: Some(color.to_string()),
        occasion: Some("casual".to_string()),
        sleeve_length: None,
        neckline: None,
        length: None,
        pant_type: None,
        available_sizes: vec!["S".to_string(), "M".to_string(), "L".to_string()],
    }
}

fn create_catalog() -> ProductCatalog {
    let mut products = Vec::new();
    let colors = ["red", "blue", "green", "black"];
    let fabrics = ["cotton", "silk", "linen"];
    for i in 0..30 {
        let category = if i % 3 == 0 { "top" } else { "dress" };
        products.push(create_product(
            i,
            category,
            colors[i % colors.len()],
            fabrics[i % fabrics.len()],
            20.0 + (i as f64) * 5.0,
        ));
    }
    ProductCatalog::from_products(products).unwrap()
}

fn create_attributes() -> AttributeMap {
    let mut attributes = AttributeMap::new();
    attributes.insert(AttributeName::Category, AttributeValue::new(["dress"], 0.95));
    attributes.insert(AttributeName::ColorOrPrint, AttributeValue::new(["red"], 0.85));
    attributes.insert(AttributeName::Fabric, AttributeValue::new(["silk"], 0.7));
    attributes.insert(AttributeName::Occasion, AttributeValue::new(["casual"], 0.65));
    attributes
}

#[test]
fn test_relaxation_order_is_ascending_confidence() {
    let catalog = create_catalog();
    let filters = build_filter_set(&create_attributes(), Some(&PriceRange::up_to(200.0)), 0.6);

    let result = ProgressiveMatcher::new(25, 30).find_candidates(&catalog, filters);

    let confidences: Vec<f64> = result.relaxations.iter().map(|r| r.confidence).collect();
    assert!(!confidences.is_empty());
    for pair in confidences.windows(2) {
        assert!(pair[0] <= pair[1], "relaxed out of order: {:?}", confidences);
    }
    assert!(result.relaxations.iter().all(|r| r.attribute != "price"));
    assert!(result.filters.names().contains(&"price".to_string()));
}

#[test]
fn test_matching_is_idempotent() {
    let catalog = create_catalog();
    let matcher = ProgressiveMatcher::default();

    let first = matcher.find_candidates(
        &catalog,
        build_filter_set(&create_attributes(), None, 0.6),
    );
    let second = matcher.find_candidates(
        &catalog,
        build_filter_set(&create_attributes(), None, 0.6),
    );

    assert_eq!(first.products, second.products);
    assert_eq!(first.relaxations, second.relaxations);
}

#[test]
fn test_relaxation_is_monotonic_and_terminates() {
    let catalog = create_catalog();
    let filters = build_filter_set(&create_attributes(), None, 0.6);
    let initial_count = apply_filters(&catalog, &filters).len();
    let relaxable = filters.relaxable_count();

    // Unreachable band forces every relaxable filter out
    let result = ProgressiveMatcher::new(1000, 1000).find_candidates(&catalog, filters);

    assert_eq!(result.relaxations.len(), relaxable);
    let mut previous = initial_count;
    for step in &result.relaxations {
        assert!(step.resulting_count >= previous);
        previous = step.resulting_count;
    }
    assert!(!result.target_reached);
    assert_eq!(result.len(), catalog.len());
}

#[test]
fn test_empty_filter_set_returns_catalog_prefix() {
    let catalog = create_catalog();

    let result = ProgressiveMatcher::default().find_candidates(&catalog, FilterSet::default());

    assert_eq!(result.len(), 15);
    let ids: Vec<&str> = result.products.iter().map(|p| p.id.as_str()).collect();
    let expected: Vec<String> = (0..15).map(|i| format!("p{}", i)).collect();
    assert_eq!(ids, expected.iter().map(String::as_str).collect::<Vec<_>>());
}

#[test]
fn test_size_attribute_becomes_size_filter() {
    let mut attributes = AttributeMap::new();
    attributes.insert(AttributeName::Sizes, AttributeValue::new(["XL", "L"], 0.9));

    let set = build_filter_set(&attributes, None, 0.6);

    assert!(matches!(set.filters()[0], Filter::Size { .. }));
    let catalog = create_catalog();
    assert_eq!(apply_filters(&catalog, &set).len(), catalog.len());
}

#[test]
fn test_price_min_and_max_bounds() {
    let catalog = create_catalog();
    let range = PriceRange {
        min_price: Some(50.0),
        max_price: Some(80.0),
    };
    let set = build_filter_set(&AttributeMap::new(), Some(&range), 0.6);

    let matched = apply_filters(&catalog, &set);

    assert!(!matched.is_empty());
    assert!(matched.iter().all(|p| p.price >= 50.0 && p.price <= 80.0));
}

#[test]
fn test_parse_ranking_only_returns_candidates() {
    let catalog = create_catalog();
    let candidates = &catalog.list_products()[..4];
    let raw = r#"{"rankings": [
        {"product_id": "p3", "score": 91, "reasoning": "a"},
        {"product_id": "p29", "score": 90, "reasoning": "not a candidate"},
        {"product_id": "p0", "score": 70, "reasoning": "b"}
    ]}"#;

    let ranked = parse_ranking(raw, candidates, 5).unwrap();

    assert_eq!(ranked.len(), 2);
    assert!(ranked
        .iter()
        .all(|r| candidates.iter().any(|c| c.id == r.product.id)));
}
