//! Periodic cheap two-sided hedge on the current window.
//!
//! Every tick buys a small amount of both outcome tokens at a low limit
//! price, so whichever side wins the resting order pays off cheaply.

use rust_decimal::Decimal;
use tracing::{error, info, warn};

use super::order::{OrderAck, OrderParams, TimeInForce};
use crate::config::Config;
use crate::error::{BotError, Result};
use crate::market::{locate_window, MarketSource, MarketWindow, OrderSink, Outcome, WindowResolver};
use crate::metrics;
use crate::scheduler::ScheduledAction;
use crate::utils::unix_now;

/// Order settings for one hedge placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HedgeSettings {
    /// Limit price of each leg.
    pub price: Decimal,
    /// Shares per leg.
    pub size: Decimal,
    /// Time in force of each leg.
    pub tif: TimeInForce,
    /// Validate and log only.
    pub dry_run: bool,
    /// Slug to trade instead of discovering the window.
    pub pinned_slug: Option<String>,
}

impl HedgeSettings {
    /// Settings from config; an unparsable order type falls back to GTC.
    pub fn from_config(config: &Config) -> Self {
        Self {
            price: config.order_price,
            size: config.order_size,
            tif: config.time_in_force().unwrap_or_default(),
            dry_run: config.dry_run,
            pinned_slug: config.polymarket_market_slug.clone(),
        }
    }
}

impl Default for HedgeSettings {
    fn default() -> Self {
        Self {
            price: Decimal::new(3, 2),
            size: Decimal::new(33, 0),
            tif: TimeInForce::GTC,
            dry_run: true,
            pinned_slug: None,
        }
    }
}

/// Places a BUY on both outcome tokens of the current window each tick.
pub struct HedgeAction<C> {
    client: C,
    resolver: WindowResolver,
    settings: HedgeSettings,
    clock: fn() -> i64,
    last_good: Option<MarketWindow>,
    current: Option<String>,
    last_acks: Vec<OrderAck>,
}

impl<C> HedgeAction<C>
where
    C: MarketSource + OrderSink + Send + Sync,
{
    /// New action using the wall clock.
    pub fn new(client: C, resolver: WindowResolver, settings: HedgeSettings) -> Self {
        Self {
            client,
            resolver,
            settings,
            clock: unix_now,
            last_good: None,
            current: None,
            last_acks: Vec::new(),
        }
    }

    /// Replace the clock (unix seconds).
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    /// Acknowledgements of the most recent tick (empty in dry run).
    pub fn last_acks(&self) -> &[OrderAck] {
        &self.last_acks
    }

    /// Last window that was resolved successfully.
    pub fn last_good_window(&self) -> Option<&MarketWindow> {
        self.last_good.as_ref()
    }

    async fn current_window(&mut self, now: i64) -> Result<MarketWindow> {
        let located = locate_window(
            &self.client,
            &self.resolver,
            self.settings.pinned_slug.as_deref(),
            now,
        )
        .await;

        match located {
            Ok(window) => {
                self.last_good = Some(window.clone());
                Ok(window)
            }
            Err(e) => match &self.last_good {
                Some(previous) if previous.is_open(now) => {
                    warn!(
                        error = %e,
                        market = %previous.identifier,
                        remaining = %previous.time_remaining_str(now),
                        "Window discovery failed, reusing last known window"
                    );
                    metrics::inc_window_fallbacks();
                    Ok(previous.clone())
                }
                _ => Err(e),
            },
        }
    }

    async fn place_leg(&self, outcome: Outcome, params: &OrderParams) -> Result<Option<OrderAck>> {
        if self.settings.dry_run {
            params.validate()?;
            info!(
                outcome = %outcome,
                token_id = %params.token_id,
                price = %params.price,
                size = %params.size,
                tif = %params.tif,
                "[DRY RUN] Would place hedge leg"
            );
            return Ok(None);
        }

        let ack = self.client.submit_order(params).await?;
        ack.ensure_success(&params.token_id)?;
        Ok(Some(ack))
    }

    /// Resolve the window and place both legs.
    ///
    /// Both legs are attempted even if the first fails; the first failure
    /// is returned.
    pub async fn place_hedge(&mut self) -> Result<()> {
        let now = (self.clock)();
        self.current = None;
        self.last_acks.clear();

        let window = self.current_window(now).await?;
        self.current = Some(window.identifier.clone());

        let metadata = self.client.fetch_market_metadata(&window.identifier).await?;
        info!(
            market = %window.identifier,
            remaining = %window.time_remaining_str(now),
            price = %self.settings.price,
            size = %self.settings.size,
            "Placing hedge"
        );

        let mut first_error: Option<BotError> = None;
        for outcome in Outcome::ALL {
            let params = OrderParams::buy(
                metadata.token_id(outcome),
                self.settings.price,
                self.settings.size,
            )
            .with_tif(self.settings.tif);

            match self.place_leg(outcome, &params).await {
                Ok(Some(ack)) => {
                    info!(
                        outcome = %outcome,
                        order_id = ack.order_id.as_deref().unwrap_or("-"),
                        status = %ack.status,
                        "Hedge leg placed"
                    );
                    self.last_acks.push(ack);
                }
                Ok(None) => {}
                Err(e) => {
                    error!(outcome = %outcome, token_id = %params.token_id, error = %e, "Hedge leg failed");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<C> ScheduledAction for HedgeAction<C>
where
    C: MarketSource + OrderSink + Send + Sync,
{
    fn name(&self) -> &'static str {
        "hedge"
    }

    fn market_in_play(&self) -> Option<&str> {
        self.current.as_deref()
    }

    async fn execute(&mut self) -> Result<()> {
        self.place_hedge().await
    }
}
