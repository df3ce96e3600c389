//! Polymarket API client wrapper.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use super::discovery::{fetch_listing_text, fetch_market_from_slug};
use super::gateway::{HolderSource, MarketSource, OrderSink};
use super::types::MarketMetadata;
use crate::config::Config;
use crate::error::{NetworkError, Result};
use crate::holders::RawHolderMarket;
use crate::metrics;
use crate::signing::{AuthenticatedClob, Credentials};
use crate::trading::execution::submit_order;
use crate::trading::{OrderAck, OrderParams};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Client for the listing page, Gamma, data, and CLOB APIs.
///
/// Owns one pooled HTTP client that is reused across ticks. The
/// authenticated CLOB client is created on the first order and shared by
/// clones.
#[derive(Clone)]
pub struct PolymarketClient {
    http: reqwest::Client,
    listing_url: String,
    gamma_url: String,
    data_url: String,
    clob_url: String,
    credentials: Credentials,
    clob: Arc<OnceCell<AuthenticatedClob>>,
}

impl std::fmt::Debug for PolymarketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolymarketClient")
            .field("listing_url", &self.listing_url)
            .field("gamma_url", &self.gamma_url)
            .field("data_url", &self.data_url)
            .field("clob_url", &self.clob_url)
            .field("credentials", &self.credentials)
            .field("clob_authenticated", &self.clob.initialized())
            .finish()
    }
}

impl PolymarketClient {
    /// Create a new client from config.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.http_timeout_ms))
            .connect_timeout(Duration::from_secs(5))
            .tcp_keepalive(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|source| NetworkError::Request {
                url: "client builder".to_string(),
                source,
            })?;

        Ok(Self {
            http,
            listing_url: config.listing_url.clone(),
            gamma_url: config.polymarket_gamma_url.trim_end_matches('/').to_string(),
            data_url: config.polymarket_data_url.trim_end_matches('/').to_string(),
            clob_url: config.polymarket_clob_url.trim_end_matches('/').to_string(),
            credentials: Credentials::from_config(config),
            clob: Arc::new(OnceCell::new()),
        })
    }

    /// Trading credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Listing page URL.
    pub fn listing_url(&self) -> &str {
        &self.listing_url
    }

    /// Gamma API base URL.
    pub fn gamma_url(&self) -> &str {
        &self.gamma_url
    }

    /// Data API base URL.
    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// CLOB API base URL.
    pub fn clob_url(&self) -> &str {
        &self.clob_url
    }

    /// Authenticated CLOB client, created on first use.
    pub async fn clob(&self) -> Result<&AuthenticatedClob> {
        let clob = self
            .clob
            .get_or_try_init(|| self.credentials.authenticate(&self.clob_url))
            .await?;
        Ok(clob)
    }

    /// GET `url` and return the body of a 2xx response.
    pub async fn get_text(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> std::result::Result<String, NetworkError> {
        let start = Instant::now();
        let response = self
            .http
            .get(url)
            .query(query)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|source| NetworkError::Request {
                url: url.to_string(),
                source,
            })?;
        metrics::record_http_latency(start, endpoint_label(url));

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NetworkError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response.text().await.map_err(|source| NetworkError::Request {
            url: url.to_string(),
            source,
        })
    }

    /// GET `url` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> std::result::Result<T, NetworkError> {
        let text = self.get_text(url, query).await?;
        serde_json::from_str(&text).map_err(|e| NetworkError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Low-cardinality metric label for a request URL.
fn endpoint_label(url: &str) -> &'static str {
    if url.contains("/events/slug/") {
        "gamma_event"
    } else if url.contains("/holders") {
        "holders"
    } else {
        "listing"
    }
}

impl MarketSource for PolymarketClient {
    async fn discover_candidate_text(&self) -> Result<String> {
        fetch_listing_text(self).await
    }

    async fn fetch_market_metadata(&self, identifier: &str) -> Result<MarketMetadata> {
        fetch_market_from_slug(self, identifier).await
    }
}

impl HolderSource for PolymarketClient {
    #[instrument(skip(self))]
    async fn fetch_holder_rankings(
        &self,
        market_id: &str,
        limit: u32,
        min_balance: u32,
    ) -> Result<Vec<RawHolderMarket>> {
        let url = format!("{}/holders", self.data_url);
        let query = [
            ("limit", limit.to_string()),
            ("market", market_id.to_string()),
            ("minBalance", min_balance.to_string()),
        ];

        let markets: Vec<RawHolderMarket> = self.get_json(&url, &query).await?;
        debug!(markets = markets.len(), "Fetched holder rankings");
        Ok(markets)
    }
}

impl OrderSink for PolymarketClient {
    async fn submit_order(&self, params: &OrderParams) -> Result<OrderAck> {
        submit_order(self, params).await
    }
}
