//! Holder records as received from the data API and after validation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One holder entry exactly as the data API sends it.
///
/// Every field is optional here; [`crate::holders::aggregate`] decides what
/// is required.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHolder {
    /// Public pseudonym.
    pub pseudonym: Option<String>,
    /// Position size in shares.
    pub amount: Option<Decimal>,
    /// Proxy wallet address.
    pub proxy_wallet: Option<String>,
    /// Outcome index the position is on.
    pub outcome_index: Option<i64>,
    /// Display name used for profile links.
    pub name: Option<String>,
}

/// One element of the `/holders` response: a token and its top holders.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawHolderMarket {
    /// Outcome token ID.
    pub token: Option<String>,
    /// Ranked holders of that token.
    #[serde(default)]
    pub holders: Vec<RawHolder>,
}

/// Validated holder position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HolderRecord {
    /// Public pseudonym (empty if the API omitted it).
    pub pseudonym: String,
    /// Position size, never negative.
    pub amount: Decimal,
    /// Proxy wallet address.
    pub wallet: String,
    /// Outcome index the position is on.
    pub outcome_index: i64,
    /// Display name used for profile links.
    pub display_name: String,
}

/// All holders of one outcome, in upstream ranking order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeSummary {
    /// Outcome index of the bucket.
    pub outcome_index: i64,
    /// Holders in the order the ranking collaborator returned them.
    pub ranked_holders: Vec<HolderRecord>,
    /// Sum of `amount` over `ranked_holders`.
    pub total: Decimal,
    /// Number of holders in the bucket.
    pub count: usize,
}

impl OutcomeSummary {
    /// Empty bucket for `outcome_index`.
    pub fn empty(outcome_index: i64) -> Self {
        Self {
            outcome_index,
            ranked_holders: Vec::new(),
            total: Decimal::ZERO,
            count: 0,
        }
    }

    /// Append a holder, keeping `total` and `count` in step.
    pub fn push(&mut self, record: HolderRecord) {
        self.total += record.amount;
        self.ranked_holders.push(record);
        self.count = self.ranked_holders.len();
    }
}
