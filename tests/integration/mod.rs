//! Integration tests against the live Polymarket endpoints.
//!
//! Network tests are ignored by default.
//! Run with: cargo test --test integration -- --ignored
//!
//! Signing tests additionally require a valid POLYMARKET_PRIVATE_KEY.

use std::time::Duration;

use rolling_maker::config::Config;
use rolling_maker::holders::{aggregate, HolderReportAction, HolderReportSettings};
use rolling_maker::market::{
    HolderSource, MarketSource, MockPolymarketClient, PolymarketClient, WindowResolver,
};
use rolling_maker::scheduler::TaskScheduler;
use rolling_maker::trading::{HedgeAction, HedgeSettings};
use rolling_maker::utils::unix_now;

/// Config from defaults plus whatever the environment overrides.
fn public_config() -> Config {
    dotenvy::dotenv().ok();
    let vars = std::env::vars().filter(|(k, _)| k.starts_with("POLYMARKET_") || k == "MARKET_PREFIX");
    Config::from_vars(vars).expect("config from environment")
}

/// Config with a usable private key, if one is set.
fn signing_config() -> Option<Config> {
    let config = public_config();
    let key = &config.polymarket_private_key;
    if key.starts_with("0x1234") || key.len() < 64 {
        return None;
    }
    Some(config)
}

fn resolver(config: &Config) -> WindowResolver {
    WindowResolver::for_prefix(&config.market_prefix, config.window_seconds).unwrap()
}

#[tokio::test]
#[ignore = "requires network"]
async fn test_discover_current_window() {
    let config = public_config();
    let client = PolymarketClient::new(&config).unwrap();

    let text = client.discover_candidate_text().await.unwrap();
    let window = resolver(&config).resolve(&text, unix_now()).unwrap();
    assert!(window.identifier.starts_with(&config.market_prefix));
    println!("Window: {} ({})", window.identifier, window.time_remaining_str(unix_now()));

    let metadata = client.fetch_market_metadata(&window.identifier).await.unwrap();
    assert!(!metadata.condition_id.is_empty());
    assert_ne!(metadata.yes_token_id, metadata.no_token_id);
}

#[tokio::test]
#[ignore = "requires network"]
async fn test_fetch_holders_of_current_window() {
    let config = public_config();
    let client = PolymarketClient::new(&config).unwrap();

    let text = client.discover_candidate_text().await.unwrap();
    let window = resolver(&config).resolve(&text, unix_now()).unwrap();
    let metadata = client.fetch_market_metadata(&window.identifier).await.unwrap();

    let markets = client
        .fetch_holder_rankings(&metadata.condition_id, 5, 1)
        .await
        .unwrap();
    let aggregation = aggregate(&markets);
    println!(
        "Holders: {} records, {} rejected",
        aggregation.record_count(),
        aggregation.rejected.len()
    );
    for summary in aggregation.summaries.values() {
        assert!(summary.count <= 5);
    }
}

#[tokio::test]
#[ignore = "requires network"]
async fn test_holder_report_once() {
    let config = public_config();
    let client = PolymarketClient::new(&config).unwrap();
    let mut action =
        HolderReportAction::new(client, resolver(&config), HolderReportSettings::from_config(&config));

    let report = action.report_once().await.unwrap();
    assert!(report.contains("OUTCOME 0 (YES)"));
    assert!(report.contains("OUTCOME 1 (NO)"));
}

#[tokio::test]
#[ignore = "requires POLYMARKET_PRIVATE_KEY"]
async fn test_clob_authentication() {
    let Some(config) = signing_config() else {
        println!("Skipping: POLYMARKET_PRIVATE_KEY not set or invalid");
        return;
    };
    let client = PolymarketClient::new(&config).unwrap();

    let address = client.credentials().signer_address().unwrap();
    assert!(address.starts_with("0x"));
    assert_eq!(address.len(), 42);

    client.clob().await.unwrap();
    assert!(format!("{:?}", client).contains("clob_authenticated: true"));
}

/// Full hedge cycle against the in-memory client, through the public API.
#[tokio::test(start_paused = true)]
async fn test_hedge_and_report_against_mock() {
    fn clock() -> i64 {
        1_765_301_500
    }

    let slug = "btc-updown-15m-1765301400";
    let mock = MockPolymarketClient::new();
    mock.set_listing(format!(r#"<a href="/event/{slug}">BTC 15m</a>"#));
    mock.add_window_market(slug);

    let resolver = WindowResolver::for_prefix("btc-updown-15m", 900).unwrap();
    let hedge = HedgeAction::new(
        mock.clone(),
        resolver.clone(),
        HedgeSettings {
            dry_run: false,
            ..Default::default()
        },
    )
    .with_clock(clock);

    let scheduler = TaskScheduler::new(Duration::from_secs(900), true);
    scheduler
        .run_until(hedge, tokio::time::sleep(Duration::from_secs(901)))
        .await;
    assert_eq!(mock.submitted_orders().len(), 4);
    assert!(scheduler.stats_handle().is_ready());

    let mut report = HolderReportAction::new(mock, resolver, HolderReportSettings::default())
        .with_clock(clock)
        .quiet();
    let text = report.report_once().await.unwrap();
    assert!(text.contains("Count:"));
}
