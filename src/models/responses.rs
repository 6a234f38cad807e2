use serde::{Deserialize, Serialize};
use crate::core::recommender::RecommendationOutcome;
use crate::models::domain::{Product, RankedRecommendation, RelaxationStep};

/// Response for the recommendations endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendResponse {
    #[serde(rename = "requestId")]
    pub request_id: String,
    pub outcome: RecommendationOutcome,
    pub recommendations: Vec<RankedRecommendation>,
    #[serde(rename = "candidateCount")]
    pub candidate_count: usize,
    pub relaxations: Vec<RelaxationStep>,
}

/// Stage 1 details for debugging and analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateDetailsResponse {
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
    pub candidates: Vec<Product>,
    #[serde(rename = "activeFilters")]
    pub active_filters: Vec<String>,
    pub relaxations: Vec<RelaxationStep>,
    #[serde(rename = "targetReached")]
    pub target_reached: bool,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(rename = "catalogSize")]
    pub catalog_size: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
