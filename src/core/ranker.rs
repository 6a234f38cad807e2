use crate::models::{AttributeName, Product, RankedRecommendation, RecommendationQuery};
use crate::services::openai::LlmError;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default number of ranked products returned
pub const DEFAULT_RESULT_SIZE: usize = 5;

/// Conversation turns forwarded to the model
pub const HISTORY_TURNS: usize = 4;

/// Scoring rubric the model is instructed to follow: (criterion, weight %, guidance)
pub const RUBRIC: [(&str, u8, &str); 4] = [
    ("Relevance", 40, "How well does the product match their stated preferences?"),
    ("Style Coherence", 25, "Does it fit the overall vibe and occasion they mentioned?"),
    ("Value", 20, "Is it appropriately priced for what they are looking for?"),
    ("Variety", 15, "Do the final picks together offer a good diversity of options?"),
];

const SYSTEM_PROMPT: &str =
    "You are a helpful fashion stylist assistant that responds with valid JSON only.";

/// Boundary to whatever model performs the ranking
#[async_trait::async_trait]
pub trait RankingBackend: Send + Sync {
    /// One request/response exchange; returns the raw assistant text
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError>;
}

/// Stage 2 failures
#[derive(Debug, Error)]
pub enum RankingError {
    #[error("Ranking call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Ranking backend error: {0}")]
    Network(String),

    #[error("Malformed ranking response: {0}")]
    Format(String),

    #[error("Ranking backend rejected the credentials")]
    Unauthorized,

    #[error("Ranking failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<RankingError> },
}

impl RankingError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RankingError::Timeout(_) | RankingError::Network(_) | RankingError::Format(_)
        )
    }
}

/// Ranker tuning
#[derive(Debug, Clone)]
pub struct RankerSettings {
    pub result_size: usize,
    pub timeout: Duration,
    pub max_retries: u32,
    /// Base delay, doubled after every failed attempt
    pub retry_backoff: Duration,
}

impl Default for RankerSettings {
    fn default() -> Self {
        Self {
            result_size: DEFAULT_RESULT_SIZE,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_backoff: Duration::from_millis(250),
        }
    }
}

/// Stage 2: asks the model to pick and explain the top candidates
#[derive(Clone)]
pub struct LlmRanker {
    backend: Arc<dyn RankingBackend>,
    settings: RankerSettings,
}

impl LlmRanker {
    pub fn new(backend: Arc<dyn RankingBackend>, settings: RankerSettings) -> Self {
        Self { backend, settings }
    }

    pub fn settings(&self) -> &RankerSettings {
        &self.settings
    }

    /// Rank candidates, retrying transient failures
    ///
    /// The returned list only contains products from `candidates`, in the
    /// order the model gave, capped at the configured result size.
    pub async fn rank(
        &self,
        candidates: &[Product],
        query: &RecommendationQuery,
    ) -> Result<Vec<RankedRecommendation>, RankingError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let limit = self.settings.result_size.min(candidates.len());
        let prompt = build_prompt(candidates, query, limit);

        tracing::info!(
            candidates = candidates.len(),
            limit,
            "Starting LLM ranking"
        );

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.attempt(&prompt, candidates, limit).await {
                Ok(ranked) => {
                    tracing::info!(attempt, ranked = ranked.len(), "LLM ranking complete");
                    return Ok(ranked);
                }
                Err(err) if !err.is_retryable() => {
                    tracing::error!(attempt, error = %err, "LLM ranking failed, not retrying");
                    return Err(err);
                }
                Err(err) if attempt > self.settings.max_retries => {
                    tracing::error!(attempt, error = %err, "LLM ranking failed, retries exhausted");
                    return Err(RankingError::Exhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
                Err(err) => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(
                        attempt,
                        error = %err,
                        "LLM ranking attempt failed, retrying in {:?}",
                        delay
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }

    async fn attempt(
        &self,
        prompt: &str,
        candidates: &[Product],
        limit: usize,
    ) -> Result<Vec<RankedRecommendation>, RankingError> {
        let call = self.backend.complete(SYSTEM_PROMPT, prompt);

        let raw = match tokio::time::timeout(self.settings.timeout, call).await {
            Err(_) => return Err(RankingError::Timeout(self.settings.timeout)),
            Ok(Err(LlmError::Timeout(elapsed))) => return Err(RankingError::Timeout(elapsed)),
            Ok(Err(LlmError::InvalidResponse(msg))) => return Err(RankingError::Format(msg)),
            Ok(Err(LlmError::Unauthorized)) => return Err(RankingError::Unauthorized),
            Ok(Err(err)) => return Err(RankingError::Network(err.to_string())),
            Ok(Ok(raw)) => raw,
        };

        parse_ranking(&raw, candidates, limit)
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32 << (attempt.saturating_sub(1)).min(10);
        self.settings.retry_backoff.saturating_mul(factor)
    }
}

/// Build the single ranking prompt covering every candidate
pub fn build_prompt(candidates: &[Product], query: &RecommendationQuery, limit: usize) -> String {
    let mut prompt = String::with_capacity(2048);

    let original = if query.original_query.trim().is_empty() {
        "fashion item"
    } else {
        query.original_query.trim()
    };

    prompt.push_str("You are an expert fashion stylist helping a customer find the perfect items.\n\n");
    prompt.push_str("USER CONTEXT:\n");
    prompt.push_str(&format!("- Original Request: \"{}\"\n", original));
    prompt.push_str("- Stated Preferences:\n");
    if query.attributes.is_empty() {
        prompt.push_str("  none\n");
    }
    for (name, attr) in &query.attributes {
        prompt.push_str(&format!(
            "  {}: {} (confidence {:.2})\n",
            name,
            attr.values.join(" or "),
            attr.confidence
        ));
    }
    let budget = query
        .price
        .map(|p| p.describe())
        .unwrap_or_else(|| "No specific budget mentioned".to_string());
    prompt.push_str(&format!("- {}\n", budget));

    let history = query.recent_history(HISTORY_TURNS);
    if history.is_empty() {
        prompt.push_str("- Recent Conversation: None\n");
    } else {
        prompt.push_str("- Recent Conversation:\n");
        for turn in history {
            prompt.push_str(&format!("  {}\n", turn));
        }
    }

    prompt.push_str("\nCANDIDATE PRODUCTS:\n");
    for (i, product) in candidates.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. [product_id: {}] **{}** - ${:.2}\n",
            i + 1,
            product.id,
            product.name,
            product.price
        ));
        let details: Vec<String> = AttributeName::ALL
            .iter()
            .filter_map(|name| product.attribute(*name).map(|v| format!("{}: {}", name, v)))
            .collect();
        if !details.is_empty() {
            prompt.push_str(&format!("   {}\n", details.join(" | ")));
        }
        if !product.available_sizes.is_empty() {
            prompt.push_str(&format!("   sizes: {}\n", product.available_sizes.join(", ")));
        }
    }

    prompt.push_str(&format!(
        "\nTASK: Select the TOP {} products that best match this customer's needs.\n\n",
        limit
    ));
    prompt.push_str("RANKING CRITERIA:\n");
    for (i, (criterion, weight, guidance)) in RUBRIC.iter().enumerate() {
        prompt.push_str(&format!("{}. **{} ({}%)**: {}\n", i + 1, criterion, weight, guidance));
    }

    prompt.push_str(RESPONSE_FORMAT);
    prompt
}

const RESPONSE_FORMAT: &str = r#"
RESPONSE FORMAT (JSON only, best first):
{
  "rankings": [
    {
      "product_id": "id from the candidate list",
      "score": 95,
      "reasoning": "Brief explanation of why this is right for them"
    }
  ],
  "overall_reasoning": "Brief explanation of the selection strategy"
}

Respond with JSON only:"#;

#[derive(Debug, Deserialize)]
struct RankingResponse {
    #[serde(alias = "top_5", alias = "ranked")]
    rankings: Vec<serde_json::Value>,
    #[serde(default)]
    overall_reasoning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RankingEntry {
    #[serde(alias = "id")]
    product_id: ProductId,
    #[serde(default, alias = "ranking_score")]
    score: Option<Score>,
    #[serde(default)]
    reasoning: String,
}

/// Models sometimes emit numeric ids
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProductId {
    Text(String),
    Number(i64),
}

impl ProductId {
    fn into_string(self) -> String {
        match self {
            ProductId::Text(id) => id.trim().to_string(),
            ProductId::Number(n) => n.to_string(),
        }
    }
}

/// Scores arrive as numbers or numeric strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Score {
    Number(f64),
    Text(String),
}

impl Score {
    fn value(&self) -> Option<f64> {
        let value = match self {
            Score::Number(n) => Some(*n),
            Score::Text(text) => text.trim().parse::<f64>().ok(),
        };
        value.filter(|n| n.is_finite())
    }
}

/// Parse a raw model reply into recommendations drawn from `candidates`
///
/// Entries that are malformed, unknown or repeated are skipped one by one.
/// A reply that leaves nothing usable is a format error. Scores are kept
/// as given; a missing or unreadable score becomes `None`.
pub fn parse_ranking(
    raw: &str,
    candidates: &[Product],
    limit: usize,
) -> Result<Vec<RankedRecommendation>, RankingError> {
    let body = strip_code_fence(raw);
    let response: RankingResponse =
        serde_json::from_str(body).map_err(|e| RankingError::Format(e.to_string()))?;

    if let Some(overall) = response.overall_reasoning.as_deref() {
        tracing::debug!("Ranking strategy: {}", overall);
    }

    let mut seen = HashSet::new();
    let mut ranked = Vec::with_capacity(limit);

    for value in response.rankings {
        if ranked.len() == limit {
            break;
        }

        let entry: RankingEntry = match serde_json::from_value(value) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping malformed ranking entry: {}", e);
                continue;
            }
        };

        let id = entry.product_id.into_string();
        let Some(product) = candidates.iter().find(|p| p.id == id) else {
            tracing::warn!("Discarding ranked id not in candidate set: {}", id);
            continue;
        };
        if !seen.insert(id) {
            continue;
        }

        ranked.push(RankedRecommendation {
            product: product.clone(),
            score: entry.score.as_ref().and_then(Score::value),
            reasoning: entry.reasoning,
        });
    }

    if ranked.is_empty() {
        return Err(RankingError::Format(
            "No ranked product matched the candidate set".to_string(),
        ));
    }

    Ok(ranked)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}
