//! Fixed-column text rendering of holder buckets.

use std::fmt::Write as _;

use rust_decimal::{Decimal, RoundingStrategy};

use super::types::{HolderRecord, OutcomeSummary};
use crate::market::Outcome;

/// Width of the `=` and `-` rules.
pub const RULE_WIDTH: usize = 220;

/// Placeholder for the holder display name in profile templates.
pub const NAME_PLACEHOLDER: &str = "{name}";

/// Placeholder for the wallet address in explorer templates.
pub const WALLET_PLACEHOLDER: &str = "{wallet}";

/// Format an amount with thousands separators and two decimals.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    let text = rounded.abs().to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));

    let mut out = String::with_capacity(text.len() + int_part.len() / 3 + 3);
    if rounded < Decimal::ZERO {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push('.');
    out.push_str(frac_part);
    for _ in frac_part.len()..2 {
        out.push('0');
    }
    out
}

/// Substitute holder fields into a link template.
pub fn fill_template(template: &str, holder: &HolderRecord) -> String {
    template
        .replace(NAME_PLACEHOLDER, &holder.display_name)
        .replace(WALLET_PLACEHOLDER, &holder.wallet)
}

fn outcome_label(outcome_index: i64) -> &'static str {
    match Outcome::from_index(outcome_index) {
        Some(Outcome::Up) => "YES",
        Some(Outcome::Down) => "NO",
        None => "OTHER",
    }
}

fn row(cells: [&str; 6]) -> String {
    let line = format!(
        "{:<4} {:<22} {:>12} {:<44} {:<85} {:<75}",
        cells[0], cells[1], cells[2], cells[3], cells[4], cells[5]
    );
    line.trim_end().to_string()
}

fn render_bucket(out: &mut String, summary: &OutcomeSummary, profile: &str, explorer: &str) {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);

    // Writing into a String cannot fail.
    let _ = writeln!(out, "{}", heavy);
    let _ = writeln!(
        out,
        "OUTCOME {} ({})",
        summary.outcome_index,
        outcome_label(summary.outcome_index)
    );
    let _ = writeln!(out, "{}", heavy);
    let _ = writeln!(
        out,
        "{}",
        row(["#", "Pseudonym", "Amount", "Wallet", "Profile URL", "Explorer URL"])
    );
    let _ = writeln!(out, "{}", light);

    for (rank, holder) in summary.ranked_holders.iter().enumerate() {
        let rank = (rank + 1).to_string();
        let amount = format_amount(holder.amount);
        let profile_url = fill_template(profile, holder);
        let explorer_url = fill_template(explorer, holder);
        let _ = writeln!(
            out,
            "{}",
            row([
                &rank,
                &holder.pseudonym,
                &amount,
                &holder.wallet,
                &profile_url,
                &explorer_url,
            ])
        );
    }

    let _ = writeln!(out, "{}", light);
    let _ = writeln!(out, "{:<38} {:>12}", "Total:", format_amount(summary.total));
    let _ = writeln!(out, "{:<38} {:>12}", "Count:", summary.count);
}

/// Render every bucket as a ranked table with total and count footers.
///
/// `profile_url_template` may use `{name}`, `explorer_url_template` may use
/// `{wallet}`; both placeholders are substituted in either template.
pub fn render(
    summaries: &[OutcomeSummary],
    profile_url_template: &str,
    explorer_url_template: &str,
) -> String {
    let mut out = String::new();
    for (i, summary) in summaries.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        render_bucket(&mut out, summary, profile_url_template, explorer_url_template);
    }
    out
}
