//! Grouping of ranked holder data into per-outcome buckets.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::instrument;

use super::types::{HolderRecord, OutcomeSummary, RawHolder, RawHolderMarket};
use crate::error::{ValidationError, ValidationKind};
use crate::market::Outcome;

/// Result of aggregating one holder payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    /// Buckets keyed by outcome index, for every index that was observed.
    pub summaries: BTreeMap<i64, OutcomeSummary>,
    /// Records that failed validation, in input order.
    pub rejected: Vec<ValidationError>,
}

impl Aggregation {
    /// Sum of every bucket total.
    pub fn grand_total(&self) -> Decimal {
        self.summaries.values().map(|s| s.total).sum()
    }

    /// Number of records across every bucket.
    pub fn record_count(&self) -> usize {
        self.summaries.values().map(|s| s.count).sum()
    }

    /// Bucket for `outcome_index`, if any holder was on it.
    pub fn get(&self, outcome_index: i64) -> Option<&OutcomeSummary> {
        self.summaries.get(&outcome_index)
    }

    /// Buckets 0 and 1 (empty when unobserved) followed by any other buckets.
    pub fn binary_outcomes(&self) -> Vec<OutcomeSummary> {
        let mut out: Vec<OutcomeSummary> = Outcome::ALL
            .iter()
            .map(|o| {
                self.summaries
                    .get(&o.index())
                    .cloned()
                    .unwrap_or_else(|| OutcomeSummary::empty(o.index()))
            })
            .collect();
        out.extend(
            self.summaries
                .values()
                .filter(|s| Outcome::from_index(s.outcome_index).is_none())
                .cloned(),
        );
        out
    }

    /// Fail on the first rejected record, else return the buckets.
    pub fn strict(self) -> Result<BTreeMap<i64, OutcomeSummary>, ValidationError> {
        match self.rejected.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.summaries),
        }
    }
}

fn validate(market: usize, position: usize, raw: &RawHolder) -> Result<HolderRecord, ValidationError> {
    let reject = |kind| ValidationError {
        market,
        position,
        kind,
    };

    let amount = raw.amount.ok_or_else(|| reject(ValidationKind::MissingAmount))?;
    let outcome_index = raw
        .outcome_index
        .ok_or_else(|| reject(ValidationKind::MissingOutcomeIndex))?;
    if amount < Decimal::ZERO {
        return Err(reject(ValidationKind::NegativeAmount));
    }

    Ok(HolderRecord {
        pseudonym: raw.pseudonym.clone().unwrap_or_default(),
        amount,
        wallet: raw.proxy_wallet.clone().unwrap_or_default(),
        outcome_index,
        display_name: raw.name.clone().unwrap_or_default(),
    })
}

/// Flatten holders across `markets` and group them by outcome index.
///
/// Input order is kept inside each bucket. Indices outside {0, 1} get their
/// own bucket so no position drops out of the totals. Invalid records are
/// reported in [`Aggregation::rejected`] and do not touch any bucket.
#[instrument(skip_all, fields(markets = markets.len()))]
pub fn aggregate(markets: &[RawHolderMarket]) -> Aggregation {
    let mut aggregation = Aggregation::default();

    for (market_idx, market) in markets.iter().enumerate() {
        for (position, raw) in market.holders.iter().enumerate() {
            match validate(market_idx, position, raw) {
                Ok(record) => aggregation
                    .summaries
                    .entry(record.outcome_index)
                    .or_insert_with(|| OutcomeSummary::empty(record.outcome_index))
                    .push(record),
                Err(err) => aggregation.rejected.push(err),
            }
        }
    }

    aggregation
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn holder(name: &str, amount: Option<Decimal>, outcome_index: Option<i64>) -> RawHolder {
        RawHolder {
            pseudonym: Some(name.to_string()),
            amount,
            proxy_wallet: Some(format!("0x{}", name)),
            outcome_index,
            name: Some(name.to_string()),
        }
    }

    fn market(holders: Vec<RawHolder>) -> RawHolderMarket {
        RawHolderMarket {
            token: None,
            holders,
        }
    }

    #[test]
    fn groups_by_outcome_index() {
        let aggregation = aggregate(&[market(vec![
            holder("a", Some(dec!(10)), Some(0)),
            holder("b", Some(dec!(5)), Some(1)),
            holder("c", Some(dec!(3)), Some(0)),
        ])]);

        let yes = aggregation.get(0).unwrap();
        assert_eq!(yes.total, dec!(13));
        assert_eq!(yes.count, 2);
        let no = aggregation.get(1).unwrap();
        assert_eq!(no.total, dec!(5));
        assert_eq!(no.count, 1);
        assert!(aggregation.rejected.is_empty());
    }

    #[test]
    fn flattens_markets_and_keeps_input_order() {
        let aggregation = aggregate(&[
            market(vec![holder("small", Some(dec!(1)), Some(0))]),
            market(vec![
                holder("big", Some(dec!(900)), Some(0)),
                holder("mid", Some(dec!(50)), Some(1)),
            ]),
        ]);

        let names: Vec<&str> = aggregation
            .get(0)
            .unwrap()
            .ranked_holders
            .iter()
            .map(|h| h.pseudonym.as_str())
            .collect();
        // Upstream order, not re-sorted by amount.
        assert_eq!(names, vec!["small", "big"]);
    }

    #[test]
    fn non_binary_indices_keep_their_own_bucket() {
        let aggregation = aggregate(&[market(vec![
            holder("a", Some(dec!(1)), Some(0)),
            holder("odd", Some(dec!(4)), Some(2)),
            holder("neg", Some(dec!(6)), Some(-1)),
        ])]);

        assert_eq!(aggregation.summaries.len(), 3);
        assert_eq!(aggregation.get(2).unwrap().total, dec!(4));
        assert_eq!(aggregation.get(-1).unwrap().total, dec!(6));
        assert_eq!(aggregation.grand_total(), dec!(11));

        let ordered: Vec<i64> = aggregation
            .binary_outcomes()
            .iter()
            .map(|s| s.outcome_index)
            .collect();
        assert_eq!(ordered, vec![0, 1, -1, 2]);
    }

    #[test]
    fn totals_match_input_sums() {
        let inputs = vec![
            market(vec![
                holder("a", Some(dec!(10.25)), Some(0)),
                holder("b", Some(dec!(0)), Some(1)),
            ]),
            market(vec![
                holder("c", Some(dec!(3.5)), Some(1)),
                holder("d", Some(dec!(1234567.89)), Some(0)),
                holder("e", Some(dec!(2)), Some(3)),
            ]),
        ];
        let input_sum: Decimal = inputs
            .iter()
            .flat_map(|m| &m.holders)
            .filter_map(|h| h.amount)
            .sum();

        let aggregation = aggregate(&inputs);
        assert_eq!(aggregation.grand_total(), input_sum);
        assert_eq!(aggregation.record_count(), 5);
        for summary in aggregation.summaries.values() {
            assert_eq!(summary.count, summary.ranked_holders.len());
            let bucket_sum: Decimal = summary.ranked_holders.iter().map(|h| h.amount).sum();
            assert_eq!(summary.total, bucket_sum);
        }
    }

    #[test]
    fn rejects_malformed_records_without_touching_valid_totals() {
        let aggregation = aggregate(&[
            market(vec![
                holder("ok", Some(dec!(10)), Some(0)),
                holder("no-amount", None, Some(0)),
            ]),
            market(vec![
                holder("no-index", Some(dec!(99)), None),
                holder("negative", Some(dec!(-5)), Some(1)),
                holder("ok2", Some(dec!(5)), Some(1)),
            ]),
        ]);

        assert_eq!(aggregation.get(0).unwrap().total, dec!(10));
        assert_eq!(aggregation.get(1).unwrap().total, dec!(5));
        assert_eq!(aggregation.record_count(), 2);
        assert_eq!(
            aggregation.rejected,
            vec![
                ValidationError {
                    market: 0,
                    position: 1,
                    kind: ValidationKind::MissingAmount
                },
                ValidationError {
                    market: 1,
                    position: 0,
                    kind: ValidationKind::MissingOutcomeIndex
                },
                ValidationError {
                    market: 1,
                    position: 1,
                    kind: ValidationKind::NegativeAmount
                },
            ]
        );

        let err = aggregation.strict().unwrap_err();
        assert_eq!(err.kind, ValidationKind::MissingAmount);
    }

    #[test]
    fn empty_input_has_empty_binary_buckets() {
        let aggregation = aggregate(&[]);
        assert!(aggregation.summaries.is_empty());
        let buckets = aggregation.binary_outcomes();
        assert_eq!(buckets.len(), 2);
        assert!(buckets.iter().all(|b| b.count == 0 && b.total.is_zero()));
        assert!(aggregation.strict().unwrap().is_empty());
    }
}
