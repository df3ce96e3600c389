//! Hedge maker and top-holder monitor for rolling 15-minute Polymarket markets.
//!
//! A rolling market is re-created every fixed interval and its slug embeds the
//! creation timestamp, e.g. `btc-updown-15m-1765301400`. Listing pages usually
//! carry several generations of the same market at once, so every tick picks
//! the newest window that is still open:
//!
//! ```text
//! candidates: 1765300500  1765301400  1765302300
//! now:        1765302000
//! open:                   1765301400  1765302300   (ts + 900 > now)
//! selected:                           1765302300   (max of open)
//! ```
//!
//! If nothing is open the newest closed window is used instead of stalling.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`market`]: Window resolution, market metadata, and API collaborators
//! - [`holders`]: Holder aggregation and report rendering
//! - [`trading`]: Order types, submission, and the hedge action
//! - [`scheduler`]: Fixed-cadence single-flight task scheduler
//! - [`api`]: HTTP API for health/status/metrics
//! - [`metrics`]: Metric names and recorders
//! - [`signing`]: Wallet signing and auth headers
//! - [`utils`]: Clock and shutdown helpers

pub mod api;
pub mod config;
pub mod error;
pub mod holders;
pub mod market;
pub mod metrics;
pub mod scheduler;
pub mod signing;
pub mod trading;
pub mod utils;

pub use config::Config;
pub use error::{BotError, Result};
