//! Periodic top-holder report for the current window.

use tracing::{debug, info, instrument, warn};

use super::aggregator::aggregate;
use super::report::render;
use crate::config::Config;
use crate::error::Result;
use crate::market::{locate_window, HolderSource, MarketSource, WindowResolver};
use crate::metrics;
use crate::scheduler::ScheduledAction;
use crate::utils::unix_now;

/// Query and rendering settings for the holder report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolderReportSettings {
    /// Holders requested per outcome token.
    pub limit: u32,
    /// Minimum balance for a holder to be listed.
    pub min_balance: u32,
    /// Profile link template.
    pub profile_url_template: String,
    /// Explorer link template.
    pub explorer_url_template: String,
    /// Slug to report on instead of discovering the window.
    pub pinned_slug: Option<String>,
}

impl HolderReportSettings {
    /// Settings from config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            limit: config.holders_limit,
            min_balance: config.holders_min_balance,
            profile_url_template: config.profile_url_template.clone(),
            explorer_url_template: config.explorer_url_template.clone(),
            pinned_slug: config.polymarket_market_slug.clone(),
        }
    }
}

impl Default for HolderReportSettings {
    fn default() -> Self {
        Self {
            limit: 5,
            min_balance: 1,
            profile_url_template: "https://polymarket.com/@{name}".to_string(),
            explorer_url_template: "https://polygonscan.com/address/{wallet}".to_string(),
            pinned_slug: None,
        }
    }
}

/// Fetches, aggregates, and prints the top holders of the current window.
pub struct HolderReportAction<C> {
    client: C,
    resolver: WindowResolver,
    settings: HolderReportSettings,
    clock: fn() -> i64,
    print: bool,
    current: Option<String>,
    last_report: Option<String>,
}

impl<C> HolderReportAction<C>
where
    C: MarketSource + HolderSource + Send + Sync,
{
    /// New action that prints each report to stdout.
    pub fn new(client: C, resolver: WindowResolver, settings: HolderReportSettings) -> Self {
        Self {
            client,
            resolver,
            settings,
            clock: unix_now,
            print: true,
            current: None,
            last_report: None,
        }
    }

    /// Replace the clock (unix seconds).
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    /// Keep reports in memory only.
    pub fn quiet(mut self) -> Self {
        self.print = false;
        self
    }

    /// Most recent rendered report.
    pub fn last_report(&self) -> Option<&str> {
        self.last_report.as_deref()
    }

    /// Resolve, fetch, aggregate, and render one report.
    #[instrument(skip(self))]
    pub async fn report_once(&mut self) -> Result<String> {
        let now = (self.clock)();
        self.current = None;

        let window = locate_window(
            &self.client,
            &self.resolver,
            self.settings.pinned_slug.as_deref(),
            now,
        )
        .await
        .inspect_err(|e| warn!(operation = "discover_window", error = %e, "Holder report step failed"))?;
        self.current = Some(window.identifier.clone());

        let metadata = self
            .client
            .fetch_market_metadata(&window.identifier)
            .await
            .inspect_err(|e| {
                warn!(operation = "fetch_market_metadata", market = %window.identifier, error = %e, "Holder report step failed")
            })?;

        let markets = self
            .client
            .fetch_holder_rankings(
                &metadata.condition_id,
                self.settings.limit,
                self.settings.min_balance,
            )
            .await
            .inspect_err(|e| {
                warn!(operation = "fetch_holder_rankings", market = %window.identifier, error = %e, "Holder report step failed")
            })?;
        debug!(tokens = markets.len(), "Fetched holder rankings");

        let aggregation = aggregate(&markets);
        for rejected in &aggregation.rejected {
            warn!(market = %window.identifier, error = %rejected, "Skipping malformed holder record");
        }
        metrics::add_holders_rejected(aggregation.rejected.len());

        let report = render(
            &aggregation.binary_outcomes(),
            &self.settings.profile_url_template,
            &self.settings.explorer_url_template,
        );
        metrics::inc_holder_reports();
        info!(
            market = %window.identifier,
            holders = aggregation.record_count(),
            total = %aggregation.grand_total(),
            "Holder report ready"
        );

        if self.print {
            println!("{}", report);
        }
        self.last_report = Some(report.clone());
        Ok(report)
    }
}

impl<C> ScheduledAction for HolderReportAction<C>
where
    C: MarketSource + HolderSource + Send + Sync,
{
    fn name(&self) -> &'static str {
        "holders"
    }

    fn market_in_play(&self) -> Option<&str> {
        self.current.as_deref()
    }

    async fn execute(&mut self) -> Result<()> {
        self.report_once().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holders::{RawHolder, RawHolderMarket};
    use crate::market::{MockConfig, MockPolymarketClient};
    use crate::scheduler::TaskScheduler;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    const SLUG: &str = "btc-updown-15m-1765301400";

    fn now() -> i64 {
        1_765_301_500
    }

    fn holder(name: &str, amount: Option<Decimal>, outcome_index: i64) -> RawHolder {
        RawHolder {
            pseudonym: Some(name.to_string()),
            amount,
            proxy_wallet: Some(format!("0x{}", name)),
            outcome_index: Some(outcome_index),
            name: Some(name.to_string()),
        }
    }

    fn setup() -> (MockPolymarketClient, HolderReportAction<MockPolymarketClient>) {
        let mock = MockPolymarketClient::new();
        mock.set_listing(SLUG);
        mock.add_window_market(SLUG);
        mock.set_holders(
            &format!("cond-{}", SLUG),
            vec![
                RawHolderMarket {
                    token: Some(format!("{}-yes", SLUG)),
                    holders: vec![holder("whale", Some(dec!(12500)), 0), holder("minnow", Some(dec!(3)), 0)],
                },
                RawHolderMarket {
                    token: Some(format!("{}-no", SLUG)),
                    holders: vec![holder("bear", Some(dec!(40.5)), 1), holder("broken", None, 1)],
                },
            ],
        );
        let resolver = WindowResolver::for_prefix("btc-updown-15m", 900).unwrap();
        let action = HolderReportAction::new(mock.clone(), resolver, HolderReportSettings::default())
            .with_clock(now)
            .quiet();
        (mock, action)
    }

    #[tokio::test]
    async fn renders_both_outcomes_for_current_window() {
        let (_mock, mut action) = setup();
        let report = action.report_once().await.unwrap();

        assert!(report.contains("OUTCOME 0 (YES)"));
        assert!(report.contains("OUTCOME 1 (NO)"));
        assert!(report.contains("12,500.00"));
        assert!(report.contains("https://polymarket.com/@whale"));
        assert!(report.contains("https://polygonscan.com/address/0xbear"));
        assert!(report.contains(&format!("{:<38} {:>12}", "Total:", "12,503.00")));
        assert!(report.contains(&format!("{:<38} {:>12}", "Total:", "40.50")));
        assert!(!report.contains("broken"));
        assert_eq!(action.last_report(), Some(report.as_str()));
        assert_eq!(action.market_in_play(), Some(SLUG));
    }

    #[tokio::test]
    async fn empty_rankings_still_render_binary_buckets() {
        let (mock, mut action) = setup();
        mock.set_holders(&format!("cond-{}", SLUG), Vec::new());
        let report = action.report_once().await.unwrap();
        assert_eq!(report.matches(&format!("{:<38} {:>12}", "Count:", 0)).count(), 2);
    }

    #[tokio::test]
    async fn collaborator_failure_is_returned() {
        let (mock, mut action) = setup();
        mock.set_config(MockConfig {
            fail_holders: true,
            ..Default::default()
        });
        let err = action.report_once().await.unwrap_err();
        assert_eq!(err.kind(), "network");
        assert!(action.last_report().is_none());
    }

    #[tokio::test]
    async fn unresolved_poll_clears_market_in_play() {
        let (mock, mut action) = setup();
        action.report_once().await.unwrap();
        assert_eq!(action.market_in_play(), Some(SLUG));

        mock.set_listing("");
        let err = action.report_once().await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(action.market_in_play(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_every_poll_interval() {
        let (mock, action) = setup();
        let scheduler = TaskScheduler::new(Duration::from_secs(10), true);
        let action = scheduler
            .run_until(action, tokio::time::sleep(Duration::from_secs(25)))
            .await;
        assert_eq!(mock.discovery_calls(), 3);
        assert!(action.last_report().is_some());
    }
}
