//! Listing and metadata lookups for rolling markets.

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, info, instrument};

use super::client::PolymarketClient;
use super::gateway::MarketSource;
use super::types::{GammaEvent, MarketMetadata, MarketWindow};
use super::window::WindowResolver;
use crate::error::{MarketError, Result};

/// Fetch the listing page whose markup embeds the current window slugs.
#[instrument(skip(client), fields(url = %client.listing_url()))]
pub async fn fetch_listing_text(client: &PolymarketClient) -> Result<String> {
    let text = client.get_text(client.listing_url(), &[]).await?;
    debug!(bytes = text.len(), "Fetched listing page");
    Ok(text)
}

/// Fetch market information from a slug via the Gamma events endpoint.
#[instrument(skip(client))]
pub async fn fetch_market_from_slug(client: &PolymarketClient, slug: &str) -> Result<MarketMetadata> {
    // Strip query params if present
    let slug = slug.split('?').next().unwrap_or(slug);
    let url = format!("{}/events/slug/{}", client.gamma_url(), slug);

    let event: GammaEvent = client.get_json(&url, &[]).await?;
    let metadata = parse_event(slug, event)?;

    info!(
        slug = %metadata.slug,
        condition_id = %metadata.condition_id,
        "Fetched market metadata"
    );
    Ok(metadata)
}

/// Window to act on: the pinned slug if any, else the newest open listed one.
///
/// A pinned slug outside the resolver's family is taken as-is and treated
/// as open.
pub async fn locate_window<S: MarketSource>(
    source: &S,
    resolver: &WindowResolver,
    pinned: Option<&str>,
    now: i64,
) -> Result<MarketWindow> {
    if let Some(slug) = pinned {
        return Ok(resolver
            .window_for_identifier(slug)
            .unwrap_or_else(|_| MarketWindow {
                identifier: slug.to_string(),
                created_at: now,
                closes_at: i64::MAX,
            }));
    }

    let text = source.discover_candidate_text().await?;
    Ok(resolver.resolve(&text, now)?)
}

/// Validate a Gamma event into [`MarketMetadata`].
///
/// Uses the market whose slug matches, else the first market of the event.
pub fn parse_event(slug: &str, event: GammaEvent) -> std::result::Result<MarketMetadata, MarketError> {
    let parse_error = |reason: String| MarketError::ParseError {
        slug: slug.to_string(),
        reason,
    };

    let mut markets = event.markets;
    let position = markets
        .iter()
        .position(|m| m.slug.as_deref() == Some(slug))
        .unwrap_or(0);
    if markets.is_empty() {
        return Err(parse_error("event has no markets".to_string()));
    }
    let market = markets.swap_remove(position);

    let condition_id = market
        .condition_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| parse_error("missing conditionId".to_string()))?;

    let tokens = market
        .clob_token_ids
        .ok_or_else(|| parse_error("missing clobTokenIds".to_string()))?;
    let [yes_token_id, no_token_id]: [String; 2] = tokens
        .try_into()
        .map_err(|t: Vec<String>| parse_error(format!("expected 2 token IDs, got {}", t.len())))?;

    let closes_at = market.end_date.as_deref().and_then(|s| {
        OffsetDateTime::parse(s, &Rfc3339)
            .map(|dt| dt.unix_timestamp())
            .map_err(|e| debug!(end_date = %s, error = %e, "Unparsable endDate"))
            .ok()
    });

    Ok(MarketMetadata {
        slug: slug.to_string(),
        condition_id,
        yes_token_id,
        no_token_id,
        closes_at,
        question: market.question,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MockPolymarketClient;

    fn event(value: serde_json::Value) -> GammaEvent {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn parses_first_market() {
        let metadata = parse_event(
            "btc-updown-15m-1765301400",
            event(serde_json::json!({
                "slug": "btc-updown-15m-1765301400",
                "markets": [{
                    "slug": "btc-updown-15m-1765301400",
                    "conditionId": "0xabc",
                    "clobTokenIds": "[\"111\",\"222\"]",
                    "question": "Bitcoin Up or Down?",
                    "endDate": "2025-12-09T17:45:00Z"
                }]
            })),
        )
        .unwrap();

        assert_eq!(metadata.condition_id, "0xabc");
        assert_eq!(metadata.yes_token_id, "111");
        assert_eq!(metadata.no_token_id, "222");
        assert_eq!(metadata.closes_at, Some(1765302300));
        assert_eq!(metadata.question.as_deref(), Some("Bitcoin Up or Down?"));
    }

    #[test]
    fn prefers_market_with_matching_slug() {
        let metadata = parse_event(
            "b",
            event(serde_json::json!({
                "markets": [
                    {"slug": "a", "conditionId": "0xa", "clobTokenIds": ["1", "2"]},
                    {"slug": "b", "conditionId": "0xb", "clobTokenIds": ["3", "4"]}
                ]
            })),
        )
        .unwrap();
        assert_eq!(metadata.condition_id, "0xb");
        assert_eq!(metadata.closes_at, None);
    }

    #[test]
    fn rejects_malformed_events() {
        assert!(parse_event("s", event(serde_json::json!({"markets": []}))).is_err());
        assert!(parse_event(
            "s",
            event(serde_json::json!({"markets": [{"clobTokenIds": ["1", "2"]}]}))
        )
        .is_err());
        assert!(parse_event(
            "s",
            event(serde_json::json!({"markets": [{"conditionId": "0x", "clobTokenIds": ["1"]}]}))
        )
        .is_err());
    }

    #[tokio::test]
    async fn locate_window_prefers_pinned_slug() {
        let mock = MockPolymarketClient::new();
        mock.set_listing("btc-updown-15m-9000");
        let resolver = WindowResolver::for_prefix("btc-updown-15m", 900).unwrap();

        let pinned = locate_window(&mock, &resolver, Some("btc-updown-15m-1800"), 100)
            .await
            .unwrap();
        assert_eq!(pinned.closes_at, 2700);
        assert_eq!(mock.discovery_calls(), 0);

        let foreign = locate_window(&mock, &resolver, Some("custom-market"), 100)
            .await
            .unwrap();
        assert_eq!(foreign.identifier, "custom-market");
        assert!(foreign.is_open(i64::MAX - 1));

        let listed = locate_window(&mock, &resolver, None, 9100).await.unwrap();
        assert_eq!(listed.identifier, "btc-updown-15m-9000");
        assert_eq!(mock.discovery_calls(), 1);
    }

    #[tokio::test]
    async fn locate_window_reports_not_found() {
        let mock = MockPolymarketClient::new();
        mock.set_listing("nothing here");
        let resolver = WindowResolver::for_prefix("btc-updown-15m", 900).unwrap();
        let err = locate_window(&mock, &resolver, None, 0).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
