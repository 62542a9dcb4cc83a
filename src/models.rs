use std::fmt;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::FetchError;

/// Identifier of a review as issued by the remote endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReviewId {
    Number(i64),
    Text(String),
}

impl Default for ReviewId {
    fn default() -> Self {
        ReviewId::Text(String::new())
    }
}

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewId::Number(n) => write!(f, "{}", n),
            ReviewId::Text(s) => f.write_str(s),
        }
    }
}

/// A single published review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default, deserialize_with = "deserialize_review_id")]
    pub id: ReviewId,
    #[serde(default, deserialize_with = "deserialize_cell_text")]
    pub name: String,
    /// Display-formatted date, never parsed
    #[serde(default, deserialize_with = "deserialize_cell_text")]
    pub date: String,
    /// Missing or unreadable ratings count as 0
    #[serde(default, deserialize_with = "deserialize_rating")]
    pub rating: u8,
    #[serde(default, deserialize_with = "deserialize_cell_text")]
    pub comment: String,
}

/// Aggregate rating served next to the reviews
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingSummary {
    #[serde(default)]
    pub average: f64,
    #[serde(default)]
    pub total: u64,
}

/// Opaque version token used only for equality checks
///
/// Numeric tokens compare by value, so `1` and `1.0` are the same version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersionToken {
    Number(serde_json::Number),
    Text(String),
}

impl PartialEq for VersionToken {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (VersionToken::Number(a), VersionToken::Number(b)) => {
                if a.is_f64() || b.is_f64() {
                    a.as_f64() == b.as_f64()
                } else {
                    a == b
                }
            }
            (VersionToken::Text(a), VersionToken::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionToken::Number(n) => write!(f, "{}", n),
            VersionToken::Text(s) => f.write_str(s),
        }
    }
}

/// Raw payload returned by the review endpoint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchEnvelope {
    #[serde(default, deserialize_with = "deserialize_reviews")]
    pub reviews: Vec<Review>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<RatingSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<VersionToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FetchEnvelope {
    /// Treat an envelope that reports an error as a failure, whatever the transport said
    pub fn into_result(self) -> Result<Self, FetchError> {
        match self.error {
            Some(message) => Err(FetchError::Remote(message)),
            None => Ok(self),
        }
    }

    /// Summary to display, substituting zeros when the endpoint sent none
    pub fn summary_or_default(&self) -> RatingSummary {
        self.summary.unwrap_or_default()
    }
}

/// Last applied dataset, kept for change detection
#[derive(Debug, Clone, Default)]
pub struct SessionCache {
    pub reviews: Vec<Review>,
    pub last_updated: Option<VersionToken>,
}

impl SessionCache {
    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    /// True when the envelope carries the token already applied and there is data on screen
    pub fn is_unchanged(&self, envelope: &FetchEnvelope) -> bool {
        !self.is_empty() && self.last_updated == envelope.last_updated
    }

    /// Replace the cache wholesale with the contents of an envelope
    pub fn replace(&mut self, envelope: &FetchEnvelope) {
        self.reviews = envelope.reviews.clone();
        self.last_updated = envelope.last_updated.clone();
    }
}

/// Decode review rows one by one, dropping rows that are not objects
fn deserialize_reviews<'de, D>(deserializer: D) -> Result<Vec<Review>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    let total = rows.len();

    let reviews: Vec<Review> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(index, row)| match serde_json::from_value(row) {
            Ok(review) => Some(review),
            Err(e) => {
                warn!(index, error = %e, "Skipping unreadable review row");
                None
            }
        })
        .collect();

    if reviews.len() < total {
        warn!(kept = reviews.len(), total, "Some review rows were skipped");
    }
    Ok(reviews)
}

/// Ids may arrive as integers, whole floats or strings; anything else is left blank
fn deserialize_review_id<'de, D>(deserializer: D) -> Result<ReviewId, D::Error>
where
    D: Deserializer<'de>,
{
    let id = match Value::deserialize(deserializer)? {
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => ReviewId::Number(i),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => ReviewId::Number(f as i64),
            _ => ReviewId::Text(n.to_string()),
        },
        Value::String(s) => ReviewId::Text(s),
        _ => ReviewId::default(),
    };
    Ok(id)
}

/// Spreadsheet cells may hold numbers or booleans where text is expected
fn deserialize_cell_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    };
    Ok(text)
}

/// Ratings come from a spreadsheet, so accept integers, floats and numeric strings
fn deserialize_rating<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawRating {
        Int(i64),
        Float(f64),
        Text(String),
        Other(IgnoredAny),
    }

    let value = match RawRating::deserialize(deserializer)? {
        RawRating::Int(n) => n as f64,
        RawRating::Float(f) => f,
        RawRating::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        RawRating::Other(_) => 0.0,
    };

    if !value.is_finite() {
        return Ok(0);
    }
    Ok(value.round().clamp(0.0, 5.0) as u8)
}
