//! Signed single-order submission to the CLOB.

use std::str::FromStr;

use polymarket_client_sdk::clob::types::response::PostOrderResponse;
use polymarket_client_sdk::clob::types::{OrderType, Side as ClobSide};
use polymarket_client_sdk::types::U256;
use tracing::{debug, info, instrument};

use super::order::{OrderAck, OrderParams, Side, TimeInForce};
use crate::error::{Result, TradingError};
use crate::market::PolymarketClient;
use crate::metrics;

/// Placement outcome as reported by the CLOB.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitResult {
    /// Exchange order id, empty when nothing was placed.
    pub order_id: Option<String>,
    /// Placement status ("live", "matched", ...).
    pub status: Option<String>,
    /// Error message if any.
    pub error_msg: Option<String>,
    /// Success flag.
    pub success: Option<bool>,
}

impl From<PostOrderResponse> for SubmitResult {
    fn from(response: PostOrderResponse) -> Self {
        Self {
            order_id: Some(response.order_id),
            status: Some(format!("{:?}", response.status).to_lowercase()),
            error_msg: response.error_msg,
            success: Some(response.success),
        }
    }
}

/// Parse a decimal CLOB token id.
pub fn parse_token_id(token_id: &str) -> std::result::Result<U256, TradingError> {
    U256::from_str(token_id)
        .map_err(|e| TradingError::InvalidParams(format!("token_id {}: {}", token_id, e)))
}

fn clob_side(side: Side) -> ClobSide {
    match side {
        Side::Buy => ClobSide::Buy,
        Side::Sell => ClobSide::Sell,
    }
}

fn order_type(tif: TimeInForce) -> OrderType {
    match tif {
        TimeInForce::FOK => OrderType::FOK,
        // Limit orders have no FAK variant; unfilled remainder rests.
        TimeInForce::FAK | TimeInForce::GTC => OrderType::GTC,
    }
}

/// Interpret a submission response as an acknowledgement.
///
/// Explicit failures keep their message as the status so the caller sees
/// them as rejections.
pub fn ack_from_result(result: SubmitResult) -> std::result::Result<OrderAck, TradingError> {
    let error = result.error_msg.filter(|e| !e.is_empty());

    let status = match (result.success, error, result.status) {
        (Some(false), None, _) => "rejected".to_string(),
        (_, Some(error), _) => error,
        (_, None, Some(status)) => status,
        (_, None, None) => {
            return Err(TradingError::SubmissionFailed(
                "acknowledgement carried neither status nor error".to_string(),
            ))
        }
    };

    Ok(OrderAck {
        order_id: result.order_id.filter(|id| !id.is_empty()),
        status,
    })
}

/// Build, sign, and post a single limit order through the authenticated CLOB client.
#[instrument(skip(client, params), fields(token = %params.token_id, side = %params.side))]
pub async fn submit_order(client: &PolymarketClient, params: &OrderParams) -> Result<OrderAck> {
    params.validate()?;
    let token_id = parse_token_id(&params.token_id)?;

    debug!(
        price = %params.price,
        size = %params.size,
        tif = %params.tif,
        "Submitting order"
    );

    let _timer = metrics::timer_order_submit();
    let clob = client.clob().await?;
    let signer = client.credentials().order_signer()?;

    let order = clob
        .limit_order()
        .token_id(token_id)
        .side(clob_side(params.side))
        .price(params.price)
        .size(params.size)
        .order_type(order_type(params.tif))
        .build()
        .await
        .map_err(|e| TradingError::InvalidParams(format!("order build failed: {}", e)))?;

    let signed = {
        let _sign_timer = metrics::timer_signing();
        clob.sign(&signer, order)
            .await
            .map_err(|e| TradingError::SigningError(e.to_string()))?
    };

    metrics::inc_orders_submitted();
    let response = clob.post_order(signed).await.map_err(|e| {
        metrics::inc_orders_failed();
        TradingError::SubmissionFailed(e.to_string())
    })?;

    let ack = ack_from_result(response.into())?;
    if !ack.is_success() {
        metrics::inc_orders_failed();
    }

    info!(
        order_id = ack.order_id.as_deref().unwrap_or("-"),
        status = %ack.status,
        token_id = %params.token_id,
        price = %params.price,
        size = %params.size,
        "Order acknowledged"
    );

    Ok(ack)
}
