// Core algorithm exports
pub mod catalog;
pub mod filters;
pub mod matcher;
pub mod ranker;
pub mod recommender;

pub use catalog::{CatalogError, ProductCatalog};
pub use filters::{build_filter_set, Filter, FilterSet};
pub use matcher::{CandidateResult, ProgressiveMatcher};
pub use ranker::{LlmRanker, RankerSettings, RankingBackend, RankingError};
pub use recommender::{RecommendationOutcome, Recommendations, Recommender};
