use crate::models::{AttributeMap, AttributeName, PriceRange, Product};
use serde::Serialize;
use std::cmp::Ordering;

/// Default minimum confidence for an attribute to become a filter
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.6;

/// Sentinel confidence carried by the price filter; budget is never relaxed
pub const PRICE_CONFIDENCE: f64 = 1.0;

/// An atomic product constraint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Filter {
    /// Product's categorical value must be one of `values`
    Attribute {
        name: AttributeName,
        values: Vec<String>,
        confidence: f64,
    },
    /// Product must offer at least one of `sizes`
    Size { sizes: Vec<String>, confidence: f64 },
    /// Inclusive price bounds
    Price {
        min_price: Option<f64>,
        max_price: Option<f64>,
    },
}

impl Filter {
    #[inline]
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Filter::Attribute { name, values, .. } => product
                .attribute(*name)
                .is_some_and(|value| values.iter().any(|v| v == value)),
            Filter::Size { sizes, .. } => sizes.iter().any(|s| product.has_size(s)),
            Filter::Price {
                min_price,
                max_price,
            } => product.in_price_range(*min_price, *max_price),
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Filter::Attribute { confidence, .. } | Filter::Size { confidence, .. } => *confidence,
            Filter::Price { .. } => PRICE_CONFIDENCE,
        }
    }

    /// Price filters are hard constraints and never removed
    pub fn is_relaxable(&self) -> bool {
        !matches!(self, Filter::Price { .. })
    }

    /// Attribute the filter constrains, `None` for the price filter
    pub fn attribute(&self) -> Option<AttributeName> {
        match self {
            Filter::Attribute { name, .. } => Some(*name),
            Filter::Size { .. } => Some(AttributeName::Sizes),
            Filter::Price { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.attribute().map_or("price", |a| a.as_str())
    }

    /// Removal order: ascending confidence, then attribute name
    fn removal_order(&self, other: &Filter) -> Ordering {
        self.confidence()
            .total_cmp(&other.confidence())
            .then_with(|| self.name().cmp(other.name()))
    }
}

/// Active filters ordered ascending by confidence, lowest first
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSet {
    filters: Vec<Filter>,
}

impl FilterSet {
    pub fn new(mut filters: Vec<Filter>) -> Self {
        filters.sort_by(Filter::removal_order);
        Self { filters }
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn relaxable_count(&self) -> usize {
        self.filters.iter().filter(|f| f.is_relaxable()).count()
    }

    /// AND across every active filter
    #[inline]
    pub fn matches(&self, product: &Product) -> bool {
        self.filters.iter().all(|f| f.matches(product))
    }

    /// Remove and return the least-confident relaxable filter
    pub fn relax(&mut self) -> Option<Filter> {
        let index = self.filters.iter().position(Filter::is_relaxable)?;
        Some(self.filters.remove(index))
    }

    pub fn names(&self) -> Vec<String> {
        self.filters.iter().map(|f| f.name().to_string()).collect()
    }
}

/// Turn a confidence-scored attribute map and an optional budget into a FilterSet
///
/// Attributes below `min_confidence` are dropped. If that leaves no
/// attribute filters, the single most confident attribute is kept so that
/// filtering is never empty while any signal exists.
pub fn build_filter_set(
    attributes: &AttributeMap,
    price: Option<&PriceRange>,
    min_confidence: f64,
) -> FilterSet {
    let candidates: Vec<Filter> = attributes
        .iter()
        .filter(|(_, attr)| !attr.values.is_empty())
        .map(|(name, attr)| {
            let confidence = clamp_confidence(*name, attr.confidence);
            let values = attr.values.clone();
            match name {
                AttributeName::Sizes => Filter::Size {
                    sizes: values,
                    confidence,
                },
                _ => Filter::Attribute {
                    name: *name,
                    values,
                    confidence,
                },
            }
        })
        .collect();

    let total = candidates.len();
    let mut filters: Vec<Filter> = Vec::with_capacity(total + 1);

    let (kept, dropped): (Vec<Filter>, Vec<Filter>) = candidates
        .into_iter()
        .partition(|f| f.confidence() >= min_confidence);

    if kept.is_empty() {
        // Highest confidence wins; ties go to the lexically first attribute
        let fallback = dropped.into_iter().min_by(|a, b| {
            b.confidence()
                .total_cmp(&a.confidence())
                .then_with(|| a.name().cmp(b.name()))
        });
        if let Some(filter) = fallback {
            tracing::debug!(
                "No attribute met confidence {:.2}, keeping {} ({:.2})",
                min_confidence,
                filter.name(),
                filter.confidence()
            );
            filters.push(filter);
        }
    } else {
        filters.extend(kept);
    }

    if let Some(range) = price.filter(|p| !p.is_unbounded()) {
        filters.push(Filter::Price {
            min_price: range.min_price,
            max_price: range.max_price,
        });
    }

    let set = FilterSet::new(filters);
    tracing::debug!(
        "Prepared {} filters from {} attributes: {:?}",
        set.len(),
        total,
        set.names()
    );
    set
}

fn clamp_confidence(name: AttributeName, confidence: f64) -> f64 {
    if confidence.is_nan() {
        tracing::warn!("Confidence for {} is NaN, treating as 0", name);
        return 0.0;
    }
    if !(0.0..=1.0).contains(&confidence) {
        tracing::warn!("Confidence {} for {} outside [0,1], clamping", confidence, name);
    }
    confidence.clamp(0.0, 1.0)
}
