//! Trading module for order submission and the hedge action.
//!
//! This module handles:
//! - Order types and acknowledgements
//! - Signed order submission
//! - The periodic two-sided hedge

pub mod execution;
pub mod hedge;
pub mod order;

pub use execution::submit_order;
pub use hedge::{HedgeAction, HedgeSettings};
pub use order::{OrderAck, OrderParams, OrderStatus, Side, TimeInForce};
