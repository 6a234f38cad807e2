use crate::core::catalog::ProductCatalog;
use crate::core::filters::{Filter, FilterSet};
use crate::models::{Product, RelaxationStep};

/// Default lower bound of the candidate band
pub const DEFAULT_MIN_CANDIDATES: usize = 8;

/// Default upper bound of the candidate band
pub const DEFAULT_MAX_CANDIDATES: usize = 15;

/// Outcome of Stage 1
///
/// Returned even when the band was not reached; `target_reached` tells the
/// degraded case apart.
#[derive(Debug, Clone)]
pub struct CandidateResult {
    pub products: Vec<Product>,
    pub filters: FilterSet,
    pub relaxations: Vec<RelaxationStep>,
    pub target_reached: bool,
}

impl CandidateResult {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }
}

/// Stage 1: confidence-driven progressive relaxation
///
/// # Pipeline
/// 1. Apply every active filter (AND across filters, OR within values)
/// 2. Stop once the count reaches the minimum of the band
/// 3. Otherwise drop the least-confident relaxable filter and retry
/// 4. Truncate to the maximum of the band in catalog order
#[derive(Debug, Clone, Copy)]
pub struct ProgressiveMatcher {
    min_candidates: usize,
    max_candidates: usize,
}

impl ProgressiveMatcher {
    pub fn new(min_candidates: usize, max_candidates: usize) -> Self {
        let min_candidates = min_candidates.max(1);
        Self {
            min_candidates,
            max_candidates: max_candidates.max(min_candidates),
        }
    }

    pub fn min_candidates(&self) -> usize {
        self.min_candidates
    }

    pub fn max_candidates(&self) -> usize {
        self.max_candidates
    }

    /// Run the relaxation loop over the catalog
    ///
    /// Never fails: when every relaxable filter is gone the surviving
    /// products are returned, possibly none.
    pub fn find_candidates(&self, catalog: &ProductCatalog, mut filters: FilterSet) -> CandidateResult {
        tracing::debug!(
            "Starting progressive filtering with {} filters (target {}-{})",
            filters.len(),
            self.min_candidates,
            self.max_candidates
        );

        let mut matched = apply_filters(catalog, &filters);
        let mut relaxations = Vec::new();

        tracing::debug!("With {} filters: {} products found", filters.len(), matched.len());

        while matched.len() < self.min_candidates {
            let Some(removed) = filters.relax() else {
                break;
            };

            matched = apply_filters(catalog, &filters);
            let step = relaxation_step(&removed, matched.len());

            tracing::info!(
                attribute = %step.attribute,
                confidence = step.confidence,
                resulting_count = step.resulting_count,
                "Relaxed filter"
            );

            relaxations.push(step);
        }

        let target_reached = matched.len() >= self.min_candidates;
        if !target_reached {
            tracing::info!(
                "Filters exhausted with {} of {} candidates",
                matched.len(),
                self.min_candidates
            );
        }

        matched.truncate(self.max_candidates);

        tracing::info!(
            candidates = matched.len(),
            relaxed = relaxations.len(),
            filters_remaining = filters.len(),
            target_reached,
            "Progressive filtering complete"
        );

        CandidateResult {
            products: matched.into_iter().cloned().collect(),
            filters,
            relaxations,
            target_reached,
        }
    }
}

impl Default for ProgressiveMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CANDIDATES, DEFAULT_MAX_CANDIDATES)
    }
}

/// Products passing every active filter, in catalog order
#[inline]
pub fn apply_filters<'a>(catalog: &'a ProductCatalog, filters: &FilterSet) -> Vec<&'a Product> {
    catalog
        .list_products()
        .iter()
        .filter(|product| filters.matches(product))
        .collect()
}

fn relaxation_step(removed: &Filter, resulting_count: usize) -> RelaxationStep {
    RelaxationStep {
        attribute: removed.name().to_string(),
        confidence: removed.confidence(),
        resulting_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filters::build_filter_set;
    use crate::models::{AttributeMap, AttributeName, AttributeValue, PriceRange};

    fn create_product(id: usize, category: &str, color: &str, price: f64) -> Product {
        Product {
            id: format!("p{}", id),
            name: format!("Product {}", id),
            price,
            category: Some(category.to_string()),
            fit: Some("regular".to_string()),
            fabric: None,
            color_or_print: Some(color.to_string()),
            occasion: None,
            sleeve_length: None,
            neckline: None,
            length: None,
            pant_type: None,
            available_sizes: vec!["S".to_string(), "M".to_string()],
        }
    }

    fn create_catalog() -> ProductCatalog {
        let mut products = Vec::new();
        for i in 0..3 {
            products.push(create_product(i, "dress", "red", 60.0));
        }
        for i in 3..13 {
            products.push(create_product(i, "dress", "blue", 40.0 + i as f64));
        }
        for i in 13..23 {
            products.push(create_product(i, "top", "black", 25.0));
        }
        ProductCatalog::from_products(products).unwrap()
    }

    #[test]
    fn test_no_relaxation_when_target_met() {
        let catalog = create_catalog();
        let mut attributes = AttributeMap::new();
        attributes.insert(AttributeName::Category, AttributeValue::new(["dress"], 0.9));

        let filters = build_filter_set(&attributes, None, 0.6);
        let result = ProgressiveMatcher::default().find_candidates(&catalog, filters);

        assert_eq!(result.len(), 13);
        assert!(result.relaxations.is_empty());
        assert!(result.target_reached);
    }

    #[test]
    fn test_relaxes_lowest_confidence_first() {
        let catalog = create_catalog();
        let mut attributes = AttributeMap::new();
        attributes.insert(AttributeName::Category, AttributeValue::new(["dress"], 0.95));
        attributes.insert(AttributeName::ColorOrPrint, AttributeValue::new(["red"], 0.9));

        let filters = build_filter_set(&attributes, None, 0.6);
        let result = ProgressiveMatcher::default().find_candidates(&catalog, filters);

        assert_eq!(result.relaxations.len(), 1);
        assert_eq!(result.relaxations[0].attribute, "color_or_print");
        assert_eq!(result.relaxations[0].resulting_count, 13);
        assert!(result
            .products
            .iter()
            .all(|p| p.category.as_deref() == Some("dress")));
    }

    #[test]
    fn test_truncates_to_max_in_catalog_order() {
        let catalog = create_catalog();

        let result = ProgressiveMatcher::default().find_candidates(&catalog, FilterSet::default());

        assert_eq!(result.len(), DEFAULT_MAX_CANDIDATES);
        assert_eq!(result.products[0].id, "p0");
        assert_eq!(result.products[14].id, "p14");
    }

    #[test]
    fn test_price_only_never_relaxes() {
        let catalog = create_catalog();
        let filters = build_filter_set(&AttributeMap::new(), Some(&PriceRange::up_to(1.0)), 0.6);

        let result = ProgressiveMatcher::default().find_candidates(&catalog, filters);

        assert!(result.is_empty());
        assert!(result.relaxations.is_empty());
        assert!(!result.target_reached);
        assert_eq!(result.filters.names(), vec!["price"]);
    }

    #[test]
    fn test_band_is_normalized() {
        let matcher = ProgressiveMatcher::new(0, 0);
        assert_eq!(matcher.min_candidates(), 1);
        assert_eq!(matcher.max_candidates(), 1);
    }
}
