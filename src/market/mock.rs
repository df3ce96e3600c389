//! Mock Polymarket client for unit testing.
//!
//! Clones share state, so a test can keep one handle to reconfigure the mock
//! while an action owns another.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::gateway::{HolderSource, MarketSource, OrderSink};
use super::types::MarketMetadata;
use crate::error::{NetworkError, Result};
use crate::holders::RawHolderMarket;
use crate::trading::{OrderAck, OrderParams};

/// Configuration for mock client behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Whether to fail listing requests.
    pub fail_discovery: bool,
    /// Whether to fail metadata requests.
    pub fail_metadata: bool,
    /// Whether to fail holder requests.
    pub fail_holders: bool,
    /// Whether to fail order submissions at the transport layer.
    pub fail_orders: bool,
    /// Simulated latency in milliseconds.
    pub latency_ms: u64,
}

#[derive(Debug, Default)]
struct MockState {
    config: MockConfig,
    listing: String,
    markets: HashMap<String, MarketMetadata>,
    holders: HashMap<String, Vec<RawHolderMarket>>,
    order_statuses: HashMap<String, String>,
    submitted: Vec<OrderParams>,
    discovery_calls: usize,
}

/// Mock Polymarket client for testing.
#[derive(Debug, Clone, Default)]
pub struct MockPolymarketClient {
    state: Arc<Mutex<MockState>>,
}

fn mock_failure(endpoint: &str) -> NetworkError {
    NetworkError::Status {
        url: format!("mock://{}", endpoint),
        status: 503,
        body: "mock failure".to_string(),
    }
}

impl MockPolymarketClient {
    /// Create a new mock client with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock client with custom configuration.
    pub fn with_config(config: MockConfig) -> Self {
        let client = Self::default();
        client.set_config(config);
        client
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A panicking test poisons the lock; keep serving the data.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn simulate_latency(&self) {
        let latency_ms = self.state().config.latency_ms;
        if latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(latency_ms)).await;
        }
    }

    /// Replace the failure configuration.
    pub fn set_config(&self, config: MockConfig) {
        self.state().config = config;
    }

    /// Set the listing text returned by discovery.
    pub fn set_listing(&self, text: impl Into<String>) {
        self.state().listing = text.into();
    }

    /// Register metadata for a slug.
    pub fn add_market(&self, metadata: MarketMetadata) {
        self.state().markets.insert(metadata.slug.clone(), metadata);
    }

    /// Register a market with predictable ids: `cond-<slug>`, `<slug>-yes`, `<slug>-no`.
    pub fn add_window_market(&self, slug: &str) -> MarketMetadata {
        let metadata = MarketMetadata {
            slug: slug.to_string(),
            condition_id: format!("cond-{}", slug),
            yes_token_id: format!("{}-yes", slug),
            no_token_id: format!("{}-no", slug),
            closes_at: None,
            question: None,
        };
        self.add_market(metadata.clone());
        metadata
    }

    /// Set holder rankings returned for a condition ID.
    pub fn set_holders(&self, condition_id: &str, markets: Vec<RawHolderMarket>) {
        self.state().holders.insert(condition_id.to_string(), markets);
    }

    /// Status acknowledged for orders on `token_id` (default "live").
    pub fn set_order_status(&self, token_id: &str, status: &str) {
        self.state()
            .order_statuses
            .insert(token_id.to_string(), status.to_string());
    }

    /// Orders received so far, in submission order.
    pub fn submitted_orders(&self) -> Vec<OrderParams> {
        self.state().submitted.clone()
    }

    /// Number of discovery requests served or failed.
    pub fn discovery_calls(&self) -> usize {
        self.state().discovery_calls
    }

    /// Clear all mock data.
    pub fn clear(&self) {
        let mut state = self.state();
        state.listing.clear();
        state.markets.clear();
        state.holders.clear();
        state.order_statuses.clear();
        state.submitted.clear();
    }
}

impl MarketSource for MockPolymarketClient {
    async fn discover_candidate_text(&self) -> Result<String> {
        self.simulate_latency().await;
        let mut state = self.state();
        state.discovery_calls += 1;
        if state.config.fail_discovery {
            return Err(mock_failure("listing").into());
        }
        Ok(state.listing.clone())
    }

    async fn fetch_market_metadata(&self, identifier: &str) -> Result<MarketMetadata> {
        self.simulate_latency().await;
        let state = self.state();
        if state.config.fail_metadata {
            return Err(mock_failure("events").into());
        }
        state.markets.get(identifier).cloned().ok_or_else(|| {
            NetworkError::Status {
                url: format!("mock://events/slug/{}", identifier),
                status: 404,
                body: String::new(),
            }
            .into()
        })
    }
}

impl HolderSource for MockPolymarketClient {
    async fn fetch_holder_rankings(
        &self,
        market_id: &str,
        _limit: u32,
        _min_balance: u32,
    ) -> Result<Vec<RawHolderMarket>> {
        self.simulate_latency().await;
        let state = self.state();
        if state.config.fail_holders {
            return Err(mock_failure("holders").into());
        }
        Ok(state.holders.get(market_id).cloned().unwrap_or_default())
    }
}

impl OrderSink for MockPolymarketClient {
    async fn submit_order(&self, params: &OrderParams) -> Result<OrderAck> {
        self.simulate_latency().await;
        let mut state = self.state();
        if state.config.fail_orders {
            return Err(mock_failure("order").into());
        }
        state.submitted.push(params.clone());
        let status = state
            .order_statuses
            .get(&params.token_id)
            .cloned()
            .unwrap_or_else(|| "live".to_string());
        Ok(OrderAck {
            order_id: Some(format!("mock-order-{}", state.submitted.len())),
            status,
        })
    }
}
