//! Rolling 15-minute Polymarket hedge maker and holder monitor entry point.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rolling_maker::api::{create_router, AppState};
use rolling_maker::config::Config;
use rolling_maker::holders::{HolderReportAction, HolderReportSettings};
use rolling_maker::market::{MarketSource, PolymarketClient, WindowResolver};
use rolling_maker::metrics;
use rolling_maker::scheduler::TaskScheduler;
use rolling_maker::signing::address_from_private_key;
use rolling_maker::trading::{HedgeAction, HedgeSettings};
use rolling_maker::utils::{shutdown_signal, unix_now};

const RULE: &str = "======================================================================";

/// Hedge maker and top-holder monitor for rolling 15-minute markets.
#[derive(Parser, Debug)]
#[command(name = "rolling-maker")]
#[command(about = "Periodic two-sided hedge and top-holder report for rolling Polymarket markets")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Place the two-sided hedge every trade interval (default).
    Run {
        /// Run in dry-run mode (no real orders).
        #[arg(long)]
        dry_run: Option<bool>,

        /// HTTP server port for health/metrics.
        #[arg(short, long)]
        port: Option<u16>,

        /// Do not start the HTTP status server.
        #[arg(long)]
        no_server: bool,
    },

    /// Print the top holders of the current window on every poll.
    Holders {
        /// Report on this slug instead of discovering the window.
        #[arg(long)]
        slug: Option<String>,

        /// Print a single report and exit.
        #[arg(long)]
        once: bool,
    },

    /// Resolve the current window and show its tokens.
    DiscoverMarket,

    /// Check configuration validity.
    CheckConfig,
}

fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("rolling_maker=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load();
    let json_logs = config
        .as_ref()
        .map(|c| c.log_format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    init_logging(args.verbose || config.as_ref().map(|c| c.verbose).unwrap_or(false), json_logs);

    let config = config.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(config),
        Some(Command::DiscoverMarket) => cmd_discover_market(config).await,
        Some(Command::Holders { slug, once }) => cmd_holders(config, slug, once).await,
        Some(Command::Run {
            dry_run,
            port,
            no_server,
        }) => cmd_run(config, dry_run, port, no_server).await,
        None => cmd_run(config, None, None, false).await,
    }
}

fn build_resolver(config: &Config) -> anyhow::Result<WindowResolver> {
    Ok(WindowResolver::for_prefix(
        &config.market_prefix,
        config.window_seconds,
    )?)
}

/// Check configuration validity.
fn cmd_check_config(config: Config) -> anyhow::Result<()> {
    println!("{}", RULE);
    println!("ROLLING MAKER - CONFIGURATION CHECK");
    println!("{}", RULE);

    print!("Validating configuration... ");
    match config.validate_trading() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    print!("Checking resolver... ");
    match build_resolver(&config) {
        Ok(resolver) => {
            println!("OK");
            println!("  Pattern: {}", resolver.pattern());
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Resolver configuration invalid"));
        }
    }

    if !config.polymarket_private_key.is_empty() {
        print!("Checking private key... ");
        match address_from_private_key(&config.polymarket_private_key) {
            Ok(addr) => {
                println!("OK");
                println!("  Wallet address: {}", addr);
            }
            Err(e) => {
                println!("FAILED");
                println!("  Error: {}", e);
                return Err(anyhow::anyhow!("Private key invalid"));
            }
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!(
        "  Signature Type: {} ({})",
        config.polymarket_signature_type,
        match config.polymarket_signature_type {
            0 => "EOA - Standard wallet",
            1 => "Magic.link - Proxy wallet",
            2 => "Gnosis Safe - Multi-sig",
            _ => "Unknown",
        }
    );
    if let Some(funder) = &config.polymarket_funder {
        println!("  Funder Address: {}", funder);
    }
    match &config.polymarket_market_slug {
        Some(slug) => println!("  Market: {} (pinned)", slug),
        None => println!("  Market: {}-<timestamp> from {}", config.market_prefix, config.listing_url),
    }
    println!("  Window: {}s", config.window_seconds);
    println!(
        "  Hedge: BUY {} @ ${} {} every {}s",
        config.order_size, config.order_price, config.order_type, config.trade_interval_seconds
    );
    println!(
        "  Holders: top {} (min balance {}) every {}s",
        config.holders_limit, config.holders_min_balance, config.holders_poll_seconds
    );
    println!("  Dry Run: {}", config.dry_run);
    println!("{}", RULE);
    println!("CONFIGURATION CHECK PASSED");
    println!("{}", RULE);

    Ok(())
}

/// Resolve the current window and show its tokens.
async fn cmd_discover_market(config: Config) -> anyhow::Result<()> {
    println!("{}", RULE);
    println!("ROLLING MAKER - MARKET DISCOVERY");
    println!("{}", RULE);

    config.validate().map_err(|e| anyhow::anyhow!(e))?;
    let client = PolymarketClient::new(&config)?;
    let resolver = build_resolver(&config)?;
    let now = unix_now();

    println!("\nSearching {} ...\n", config.listing_url);
    let text = client.discover_candidate_text().await?;
    let candidates = resolver.candidates(&text);

    let window = match resolver.resolve(&text, now) {
        Ok(window) => window,
        Err(e) => {
            println!("NO MARKET FOUND");
            println!("  Error: {}", e);
            println!("\nMarkets open every {} seconds. Try again shortly.", config.window_seconds);
            println!("{}", RULE);
            return Ok(());
        }
    };

    println!("WINDOW FOUND ({} candidates listed)", candidates.len());
    println!("----------------------------------------------------------------------");
    println!("  Slug: {}", window.identifier);
    println!("  Open: {}", window.is_open(now));
    println!("  Time Remaining: {}", window.time_remaining_str(now));
    if let Ok(next) = resolver.next_identifier(&window.identifier) {
        println!("  Next Window: {}", next);
    }

    match client.fetch_market_metadata(&window.identifier).await {
        Ok(metadata) => {
            println!("  Condition ID: {}", metadata.condition_id);
            println!("  YES Token: {}", metadata.yes_token_id);
            println!("  NO Token: {}", metadata.no_token_id);
            if let Some(q) = &metadata.question {
                println!("  Question: {}", q);
            }
        }
        Err(e) => println!("  Metadata unavailable: {}", e),
    }
    println!("{}", RULE);

    Ok(())
}

/// Print the holder report on every poll, or once.
async fn cmd_holders(mut config: Config, slug: Option<String>, once: bool) -> anyhow::Result<()> {
    if slug.is_some() {
        config.polymarket_market_slug = slug;
    }
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let client = PolymarketClient::new(&config)?;
    let resolver = build_resolver(&config)?;
    let mut action =
        HolderReportAction::new(client, resolver, HolderReportSettings::from_config(&config));

    if once {
        action.report_once().await?;
        return Ok(());
    }

    info!(
        interval_secs = config.holders_poll_seconds,
        limit = config.holders_limit,
        "Starting holder monitor"
    );
    let scheduler = TaskScheduler::new(Duration::from_secs(config.holders_poll_seconds), true)
        .with_not_found_threshold(config.not_found_warn_threshold);
    scheduler.run_until(action, shutdown_signal()).await;

    Ok(())
}

/// Run the hedge loop, with the status server unless disabled.
async fn cmd_run(
    mut config: Config,
    dry_run_override: Option<bool>,
    port_override: Option<u16>,
    no_server: bool,
) -> anyhow::Result<()> {
    if let Some(dry_run) = dry_run_override {
        config.dry_run = dry_run;
    }
    if let Some(port) = port_override {
        config.port = port;
    }

    if let Err(e) = config.validate_trading() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    info!("Mode: {}", if config.dry_run { "SIMULATION" } else { "LIVE TRADING" });
    info!(
        price = %config.order_price,
        size = %config.order_size,
        order_type = %config.order_type,
        interval_secs = config.trade_interval_seconds,
        "Hedge configuration"
    );

    let client = PolymarketClient::new(&config)?;
    let resolver = build_resolver(&config)?;
    let scheduler = TaskScheduler::new(Duration::from_secs(config.trade_interval_seconds), true)
        .with_not_found_threshold(config.not_found_warn_threshold);

    if !no_server {
        let prometheus = PrometheusBuilder::new().install_recorder()?;
        metrics::init_metrics();

        let state = AppState::new(scheduler.stats_handle())
            .with_prometheus(prometheus)
            .with_dry_run(config.dry_run);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = TcpListener::bind(addr).await?;
        info!("HTTP server listening on {}", addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, create_router(state))
                .with_graceful_shutdown(shutdown_signal())
                .await
            {
                error!("HTTP server error: {}", e);
            }
        });
    }

    let action = HedgeAction::new(client, resolver, HedgeSettings::from_config(&config));
    scheduler.run_until(action, shutdown_signal()).await;
    info!("Hedge loop stopped");

    Ok(())
}
