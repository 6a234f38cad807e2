// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AttributeMap, AttributeName, AttributeValue, PriceRange, Product, RankedRecommendation,
    RecommendationQuery, RelaxationStep,
};
pub use requests::RecommendRequest;
pub use responses::{CandidateDetailsResponse, ErrorResponse, HealthResponse, RecommendResponse};
