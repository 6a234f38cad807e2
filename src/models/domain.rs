use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Catalog product record
///
/// Categorical fields are optional; an empty or missing value never matches
/// an attribute filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub fit: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub fabric: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub color_or_print: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub occasion: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub sleeve_length: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub neckline: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub length: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub pant_type: Option<String>,
    #[serde(default, deserialize_with = "size_list")]
    pub available_sizes: Vec<String>,
}

impl Product {
    /// Value of a categorical attribute, `None` for `sizes` or an empty field
    pub fn attribute(&self, name: AttributeName) -> Option<&str> {
        let value = match name {
            AttributeName::Category => &self.category,
            AttributeName::Fit => &self.fit,
            AttributeName::Fabric => &self.fabric,
            AttributeName::ColorOrPrint => &self.color_or_print,
            AttributeName::Occasion => &self.occasion,
            AttributeName::SleeveLength => &self.sleeve_length,
            AttributeName::Neckline => &self.neckline,
            AttributeName::Length => &self.length,
            AttributeName::PantType => &self.pant_type,
            AttributeName::Sizes => return None,
        };
        value.as_deref()
    }

    pub fn has_size(&self, size: &str) -> bool {
        self.available_sizes.iter().any(|s| s == size)
    }

    /// Inclusive price check; a missing bound is unbounded
    pub fn in_price_range(&self, min_price: Option<f64>, max_price: Option<f64>) -> bool {
        if let Some(min) = min_price {
            if self.price < min {
                return false;
            }
        }
        if let Some(max) = max_price {
            if self.price > max {
                return false;
            }
        }
        true
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

/// Accepts either a JSON array of sizes or a comma-separated string
fn size_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawSizes {
        List(Vec<String>),
        Joined(String),
    }

    let raw: Option<RawSizes> = Option::deserialize(deserializer)?;
    let sizes: Vec<String> = match raw {
        Some(RawSizes::List(list)) => list,
        Some(RawSizes::Joined(joined)) => joined.split(',').map(str::to_string).collect(),
        None => Vec::new(),
    };

    let mut out: Vec<String> = Vec::with_capacity(sizes.len());
    for size in sizes {
        let size = size.trim();
        if !size.is_empty() && !out.iter().any(|s| s == size) {
            out.push(size.to_string());
        }
    }
    Ok(out)
}

/// Fixed attribute schema supplied by the extraction collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeName {
    Category,
    Fit,
    Fabric,
    ColorOrPrint,
    Occasion,
    SleeveLength,
    Neckline,
    Length,
    PantType,
    Sizes,
}

impl AttributeName {
    pub const ALL: [AttributeName; 10] = [
        AttributeName::Category,
        AttributeName::Fit,
        AttributeName::Fabric,
        AttributeName::ColorOrPrint,
        AttributeName::Occasion,
        AttributeName::SleeveLength,
        AttributeName::Neckline,
        AttributeName::Length,
        AttributeName::PantType,
        AttributeName::Sizes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeName::Category => "category",
            AttributeName::Fit => "fit",
            AttributeName::Fabric => "fabric",
            AttributeName::ColorOrPrint => "color_or_print",
            AttributeName::Occasion => "occasion",
            AttributeName::SleeveLength => "sleeve_length",
            AttributeName::Neckline => "neckline",
            AttributeName::Length => "length",
            AttributeName::PantType => "pant_type",
            AttributeName::Sizes => "sizes",
        }
    }
}

impl fmt::Display for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extracted preference: candidate values (OR-semantics) and a confidence in [0,1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub values: Vec<String>,
    pub confidence: f64,
}

impl AttributeValue {
    pub fn new<I, S>(values: I, confidence: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            confidence,
        }
    }
}

/// Attribute map keyed by schema name; ordered so prompts and logs are stable
pub type AttributeMap = BTreeMap<AttributeName, AttributeValue>;

/// Budget preference
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceRange {
    #[serde(rename = "minPrice", alias = "min_price", default)]
    pub min_price: Option<f64>,
    #[serde(rename = "maxPrice", alias = "max_price", default)]
    pub max_price: Option<f64>,
}

impl PriceRange {
    pub fn up_to(max_price: f64) -> Self {
        Self {
            min_price: None,
            max_price: Some(max_price),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min_price.is_none() && self.max_price.is_none()
    }

    /// Human-readable budget line used in the ranking prompt
    pub fn describe(&self) -> String {
        match (self.min_price, self.max_price) {
            (Some(min), Some(max)) => format!("Budget: ${:.2} to ${:.2}", min, max),
            (None, Some(max)) => format!("Budget: up to ${:.2}", max),
            (Some(min), None) => format!("Budget: at least ${:.2}", min),
            (None, None) => "No specific budget mentioned".to_string(),
        }
    }
}

/// Everything the engine needs for one recommendation turn
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationQuery {
    pub original_query: String,
    pub attributes: AttributeMap,
    pub price: Option<PriceRange>,
    /// Conversation turns, oldest first
    pub history: Vec<String>,
}

impl RecommendationQuery {
    /// The trailing turns that are forwarded to the ranking model
    pub fn recent_history(&self, turns: usize) -> &[String] {
        let start = self.history.len().saturating_sub(turns);
        &self.history[start..]
    }
}

/// One removal performed by the progressive matcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelaxationStep {
    pub attribute: String,
    pub confidence: f64,
    #[serde(rename = "resultingCount")]
    pub resulting_count: usize,
}

/// Product plus the ranking metadata produced by Stage 2 (or the fallback)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRecommendation {
    pub product: Product,
    /// Absent when the product comes from the unranked fallback
    pub score: Option<f64>,
    pub reasoning: String,
}
