//! Collaborator seams consumed by the scheduled actions.
//!
//! [`PolymarketClient`](super::PolymarketClient) implements these against the
//! live APIs and [`MockPolymarketClient`](super::MockPolymarketClient) in memory.

use std::future::Future;

use super::types::MarketMetadata;
use crate::error::Result;
use crate::holders::RawHolderMarket;
use crate::trading::{OrderAck, OrderParams};

/// Discovery and metadata lookups for rolling markets.
pub trait MarketSource {
    /// Raw text likely to contain timestamped identifiers of the market family.
    fn discover_candidate_text(&self) -> impl Future<Output = Result<String>> + Send;

    /// Resolve a canonical identifier to tradeable token references.
    fn fetch_market_metadata(
        &self,
        identifier: &str,
    ) -> impl Future<Output = Result<MarketMetadata>> + Send;
}

/// Ranked holder data for a market.
pub trait HolderSource {
    /// Top holders per outcome token of `market_id` (a condition ID).
    fn fetch_holder_rankings(
        &self,
        market_id: &str,
        limit: u32,
        min_balance: u32,
    ) -> impl Future<Output = Result<Vec<RawHolderMarket>>> + Send;
}

/// Single-order submission.
pub trait OrderSink {
    /// Place one order and return the exchange acknowledgement.
    fn submit_order(&self, params: &OrderParams) -> impl Future<Output = Result<OrderAck>> + Send;
}
