//! Holders module for the top-holder report.
//!
//! This module handles:
//! - Holder payload types
//! - Aggregation into per-outcome buckets
//! - Fixed-column report rendering
//! - The periodic report action

pub mod aggregator;
pub mod monitor;
pub mod report;
pub mod types;

pub use aggregator::{aggregate, Aggregation};
pub use monitor::{HolderReportAction, HolderReportSettings};
pub use report::{format_amount, render};
pub use types::{HolderRecord, OutcomeSummary, RawHolder, RawHolderMarket};
