use crate::core::catalog::ProductCatalog;
use crate::core::filters::{build_filter_set, DEFAULT_MIN_CONFIDENCE};
use crate::core::matcher::{CandidateResult, ProgressiveMatcher};
use crate::core::ranker::{LlmRanker, RankingError};
use crate::models::{Product, RankedRecommendation, RecommendationQuery};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Reasoning attached to products that were not ranked by the model
pub const NEUTRAL_REASONING: &str = "Matches your stated preferences.";

/// How the final list was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationOutcome {
    /// Ordered and explained by the ranking model
    Ranked,
    /// Ranking failed or timed out; first Stage 1 candidates in catalog order
    Fallback,
    /// Caller opted out of ranking
    Unranked,
    /// Stage 1 produced nothing; ranking was never attempted
    NoMatches,
}

/// Result of one recommendation turn
#[derive(Debug, Clone)]
pub struct Recommendations {
    pub outcome: RecommendationOutcome,
    pub items: Vec<RankedRecommendation>,
    pub candidates: CandidateResult,
}

/// Two-stage recommendation engine
///
/// # Pipeline
/// 1. Build the confidence-ordered filter set
/// 2. Progressive relaxation over the catalog (never fails)
/// 3. LLM ranking of the surviving candidates, with a catalog-order fallback
#[derive(Clone)]
pub struct Recommender {
    catalog: Arc<ProductCatalog>,
    matcher: ProgressiveMatcher,
    ranker: LlmRanker,
    min_confidence: f64,
    deadline: Option<Duration>,
}

impl Recommender {
    pub fn new(catalog: Arc<ProductCatalog>, matcher: ProgressiveMatcher, ranker: LlmRanker) -> Self {
        Self {
            catalog,
            matcher,
            ranker,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            deadline: None,
        }
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Overall bound on Stage 2; once elapsed the pending call is dropped
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    pub fn result_size(&self) -> usize {
        self.ranker.settings().result_size
    }

    /// Stage 1 only
    pub fn find_candidates(&self, query: &RecommendationQuery) -> CandidateResult {
        let filters = build_filter_set(&query.attributes, query.price.as_ref(), self.min_confidence);
        self.matcher.find_candidates(&self.catalog, filters)
    }

    /// Full two-stage recommendation
    pub async fn recommend(&self, query: &RecommendationQuery) -> Recommendations {
        let candidates = self.find_candidates(query);

        if candidates.is_empty() {
            tracing::info!("No candidates survived filtering, skipping ranking");
            return Recommendations {
                outcome: RecommendationOutcome::NoMatches,
                items: Vec::new(),
                candidates,
            };
        }

        let ranking = self.ranker.rank(&candidates.products, query);
        let ranked = match self.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, ranking).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!("Ranking abandoned after {:?} deadline", deadline);
                    Err(RankingError::Timeout(deadline))
                }
            },
            None => ranking.await,
        };

        match ranked {
            Ok(items) => Recommendations {
                outcome: RecommendationOutcome::Ranked,
                items,
                candidates,
            },
            Err(err) => {
                let items = unranked(&candidates.products, self.result_size());
                tracing::warn!(
                    error = %err,
                    fallback_count = items.len(),
                    "LLM ranking failed, returning Stage 1 candidates"
                );
                Recommendations {
                    outcome: RecommendationOutcome::Fallback,
                    items,
                    candidates,
                }
            }
        }
    }

    /// Stage 1 with the first N candidates, no model call
    pub fn recommend_unranked(&self, query: &RecommendationQuery) -> Recommendations {
        let candidates = self.find_candidates(query);
        let outcome = if candidates.is_empty() {
            RecommendationOutcome::NoMatches
        } else {
            RecommendationOutcome::Unranked
        };

        Recommendations {
            outcome,
            items: unranked(&candidates.products, self.result_size()),
            candidates,
        }
    }
}

/// First `limit` products in catalog order with neutral reasoning and no score
pub fn unranked(products: &[Product], limit: usize) -> Vec<RankedRecommendation> {
    products
        .iter()
        .take(limit)
        .map(|product| RankedRecommendation {
            product: product.clone(),
            score: None,
            reasoning: NEUTRAL_REASONING.to_string(),
        })
        .collect()
}
