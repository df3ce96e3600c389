//! Market-related types for rolling time-sliced markets.

use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

/// Market outcome for binary up/down markets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Price goes up (YES token, outcome index 0).
    #[strum(serialize = "up", serialize = "yes", serialize = "UP", serialize = "YES")]
    #[default]
    Up,
    /// Price goes down (NO token, outcome index 1).
    #[strum(serialize = "down", serialize = "no", serialize = "DOWN", serialize = "NO")]
    Down,
}

impl Outcome {
    /// Both outcomes in outcome-index order.
    pub const ALL: [Outcome; 2] = [Outcome::Up, Outcome::Down];

    /// Outcome index used by the data API.
    pub fn index(&self) -> i64 {
        match self {
            Outcome::Up => 0,
            Outcome::Down => 1,
        }
    }

    /// Outcome for a data API outcome index, if it is binary.
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Outcome::Up),
            1 => Some(Outcome::Down),
            _ => None,
        }
    }
}

/// One live instance of a rolling market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketWindow {
    /// Canonical slug (e.g., "btc-updown-15m-1765301400").
    pub identifier: String,
    /// Unix timestamp embedded in the slug.
    pub created_at: i64,
    /// Unix timestamp when the window closes.
    pub closes_at: i64,
}

impl MarketWindow {
    /// Whether the window is still open at `now`.
    pub fn is_open(&self, now: i64) -> bool {
        now < self.closes_at
    }

    /// Get remaining time until the window closes.
    pub fn time_remaining(&self, now: i64) -> Option<std::time::Duration> {
        let remaining = self.closes_at - now;
        if remaining <= 0 {
            None
        } else {
            Some(std::time::Duration::from_secs(remaining as u64))
        }
    }

    /// Format remaining time as "Xm Ys" string.
    pub fn time_remaining_str(&self, now: i64) -> String {
        match self.time_remaining(now) {
            Some(duration) => {
                let secs = duration.as_secs();
                format!("{}m {}s", secs / 60, secs % 60)
            }
            None => "CLOSED".to_string(),
        }
    }
}

/// Tradeable references for a resolved market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketMetadata {
    /// Market slug the metadata was fetched for.
    pub slug: String,
    /// Condition ID (used by the data API).
    pub condition_id: String,
    /// YES (UP) token ID for CLOB.
    pub yes_token_id: String,
    /// NO (DOWN) token ID for CLOB.
    pub no_token_id: String,
    /// Unix timestamp when the market closes, if the API reported one.
    pub closes_at: Option<i64>,
    /// Market question text.
    pub question: Option<String>,
}

impl MarketMetadata {
    /// Get the token ID for a given outcome.
    pub fn token_id(&self, outcome: Outcome) -> &str {
        match outcome {
            Outcome::Up => &self.yes_token_id,
            Outcome::Down => &self.no_token_id,
        }
    }
}

/// Event payload from the Gamma `events/slug` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GammaEvent {
    /// Event slug.
    pub slug: Option<String>,
    /// Markets belonging to the event.
    #[serde(default)]
    pub markets: Vec<GammaMarket>,
}

/// Market entry inside a Gamma event.
#[derive(Debug, Clone, Deserialize)]
pub struct GammaMarket {
    /// Market slug.
    pub slug: Option<String>,
    /// Condition ID.
    #[serde(rename = "conditionId")]
    pub condition_id: Option<String>,
    /// CLOB token IDs, either a JSON array or a JSON-encoded string of one.
    #[serde(rename = "clobTokenIds", default, deserialize_with = "token_ids")]
    pub clob_token_ids: Option<Vec<String>>,
    /// Market question.
    pub question: Option<String>,
    /// End date (ISO format).
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    /// Whether market is closed.
    pub closed: Option<bool>,
}

fn token_ids<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Encoded(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::List(ids)) => Ok(Some(ids)),
        Some(Raw::Encoded(s)) => serde_json::from_str(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
