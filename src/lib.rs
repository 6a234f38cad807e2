//! Vibe Reco - confidence-driven fashion recommendations
//!
//! This library provides the two-stage recommendation engine: progressive
//! relaxation of confidence-weighted attribute filters over a product
//! catalog, followed by LLM ranking of the surviving candidates.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    build_filter_set, CandidateResult, LlmRanker, ProductCatalog, ProgressiveMatcher,
    RankerSettings, RankingBackend, RecommendationOutcome, Recommendations, Recommender,
};
pub use crate::models::{
    AttributeMap, AttributeName, AttributeValue, PriceRange, Product, RankedRecommendation,
    RecommendationQuery,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let set = build_filter_set(&AttributeMap::new(), Some(&PriceRange::up_to(50.0)), 0.6);
        assert_eq!(set.len(), 1);
    }
}
