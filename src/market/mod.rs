//! Market module for rolling time-sliced prediction markets.
//!
//! This module handles:
//! - Market types and data structures
//! - Window resolution (finding the currently open instance)
//! - Collaborator traits and the live Polymarket client
//! - Mock client for testing

pub mod client;
pub mod discovery;
pub mod gateway;
pub mod mock;
pub mod types;
pub mod window;

pub use client::PolymarketClient;
pub use discovery::{fetch_listing_text, fetch_market_from_slug, locate_window, parse_event};
pub use gateway::{HolderSource, MarketSource, OrderSink};
pub use mock::{MockConfig, MockPolymarketClient};
pub use types::{MarketMetadata, MarketWindow, Outcome};
pub use window::{resolve, WindowResolver};
