use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::{AttributeMap, PriceRange, RecommendationQuery};

/// Request to produce recommendations for one conversation turn
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecommendRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "original_query", rename = "originalQuery")]
    pub original_query: String,
    #[serde(default)]
    pub attributes: AttributeMap,
    #[serde(default, alias = "price_range", rename = "priceRange")]
    pub price_range: Option<PriceRange>,
    #[serde(default, alias = "conversation_history", rename = "conversationHistory")]
    pub conversation_history: Vec<String>,
    #[serde(default = "default_use_llm_ranking", alias = "use_llm_ranking", rename = "useLlmRanking")]
    pub use_llm_ranking: bool,
    #[serde(default, alias = "session_id", rename = "sessionId")]
    pub session_id: Option<String>,
}

fn default_use_llm_ranking() -> bool {
    true
}

impl RecommendRequest {
    pub fn to_query(&self) -> RecommendationQuery {
        RecommendationQuery {
            original_query: self.original_query.clone(),
            attributes: self.attributes.clone(),
            price: self.price_range.filter(|p| !p.is_unbounded()),
            history: self.conversation_history.clone(),
        }
    }
}
