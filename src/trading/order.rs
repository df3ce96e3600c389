//! Order parameters and exchange acknowledgements.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::TradingError;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order.
    #[strum(to_string = "BUY", serialize = "buy")]
    Buy,
    /// Sell order.
    #[strum(to_string = "SELL", serialize = "sell")]
    Sell,
}

/// Order time-in-force.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    /// Fill-or-kill: must fill entirely or cancel.
    #[strum(to_string = "FOK", serialize = "fok")]
    FOK,
    /// Fill-and-kill: fill what's available, cancel rest.
    #[strum(to_string = "FAK", serialize = "fak")]
    FAK,
    /// Good-till-cancelled: stays on book until filled or cancelled.
    #[default]
    #[strum(to_string = "GTC", serialize = "gtc")]
    GTC,
}

/// Order parameters for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderParams {
    /// Token ID to trade.
    pub token_id: String,
    /// Order side (buy/sell).
    pub side: Side,
    /// Limit price.
    pub price: Decimal,
    /// Order size in shares.
    pub size: Decimal,
    /// Time-in-force.
    pub tif: TimeInForce,
}

impl OrderParams {
    /// Create a new resting buy order.
    pub fn buy(token_id: impl Into<String>, price: Decimal, size: Decimal) -> Self {
        Self {
            token_id: token_id.into(),
            side: Side::Buy,
            price,
            size,
            tif: TimeInForce::GTC,
        }
    }

    /// Set time-in-force.
    pub fn with_tif(mut self, tif: TimeInForce) -> Self {
        self.tif = tif;
        self
    }

    /// Validate order parameters.
    ///
    /// Outcome token prices live strictly between 0 and 1.
    pub fn validate(&self) -> Result<(), TradingError> {
        if self.token_id.is_empty() {
            return Err(TradingError::InvalidParams("token_id is required".to_string()));
        }
        if self.price <= Decimal::ZERO || self.price >= Decimal::ONE {
            return Err(TradingError::InvalidParams(format!(
                "price {} must be between 0 and 1",
                self.price
            )));
        }
        if self.size <= Decimal::ZERO {
            return Err(TradingError::InvalidParams(format!(
                "size {} must be positive",
                self.size
            )));
        }
        Ok(())
    }
}

/// Placement status reported by the CLOB when an order is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum OrderStatus {
    /// Resting on the book.
    Live,
    /// Matched immediately.
    Matched,
    /// Accepted, matching delayed.
    Delayed,
    /// Accepted but not matched (marketable order delay expired).
    Unmatched,
}

/// Exchange acknowledgement of one submitted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderAck {
    /// Exchange order ID, when one was assigned.
    pub order_id: Option<String>,
    /// Raw status text.
    pub status: String,
}

impl OrderAck {
    /// Parsed status, `None` for anything the exchange does not count as placed.
    pub fn order_status(&self) -> Option<OrderStatus> {
        self.status.parse().ok()
    }

    /// Whether the order was placed.
    pub fn is_success(&self) -> bool {
        self.order_status().is_some()
    }

    /// Turn a non-success acknowledgement into [`TradingError::OrderRejected`].
    pub fn ensure_success(&self, token_id: &str) -> Result<(), TradingError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(TradingError::OrderRejected {
                token_id: token_id.to_string(),
                status: self.status.clone(),
            })
        }
    }
}
