//! Selection of the currently open window from noisy listing text.

use std::collections::BTreeSet;

use regex::Regex;
use tracing::{debug, instrument, warn};

use super::types::MarketWindow;
use crate::error::MarketError;

/// Placeholder replaced by the creation timestamp in identifier templates.
pub const TIMESTAMP_PLACEHOLDER: &str = "{timestamp}";

/// Resolves the current window of one rolling market family.
///
/// The pattern must contain exactly one capture group matching the unix
/// timestamp; the identifier template must contain [`TIMESTAMP_PLACEHOLDER`].
#[derive(Debug, Clone)]
pub struct WindowResolver {
    pattern: Regex,
    template: String,
    window_seconds: i64,
}

impl WindowResolver {
    /// Build a resolver from an explicit pattern and identifier template.
    pub fn new(
        pattern: &str,
        template: impl Into<String>,
        window_seconds: i64,
    ) -> Result<Self, MarketError> {
        let template = template.into();
        let regex = Regex::new(pattern)
            .map_err(|e| MarketError::InvalidPattern(format!("bad pattern `{}`: {}", pattern, e)))?;

        if regex.captures_len() != 2 {
            return Err(MarketError::InvalidPattern(format!(
                "pattern `{}` must have exactly one capture group",
                pattern
            )));
        }

        if !template.contains(TIMESTAMP_PLACEHOLDER) {
            return Err(MarketError::InvalidPattern(format!(
                "template `{}` lacks {}",
                template, TIMESTAMP_PLACEHOLDER
            )));
        }

        if window_seconds <= 0 {
            return Err(MarketError::InvalidPattern(format!(
                "window length must be positive, got {}",
                window_seconds
            )));
        }

        Ok(Self {
            pattern: regex,
            template,
            window_seconds,
        })
    }

    /// Resolver for slugs shaped `<prefix>-<timestamp>`.
    pub fn for_prefix(prefix: &str, window_seconds: i64) -> Result<Self, MarketError> {
        Self::new(
            &format!(r"{}-(\d+)", regex::escape(prefix)),
            format!("{}-{}", prefix, TIMESTAMP_PLACEHOLDER),
            window_seconds,
        )
    }

    /// Window length in seconds.
    pub fn window_seconds(&self) -> i64 {
        self.window_seconds
    }

    /// Source of the timestamp pattern.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// All distinct timestamps embedded in `raw_text`.
    pub fn candidates(&self, raw_text: &str) -> BTreeSet<i64> {
        self.pattern
            .captures_iter(raw_text)
            .filter_map(|cap| cap.get(1))
            .filter_map(|m| m.as_str().parse().ok())
            .collect()
    }

    /// Pick the newest open window in `raw_text`, or the newest one overall
    /// when every candidate has already closed.
    #[instrument(skip(self, raw_text), fields(pattern = %self.pattern))]
    pub fn resolve(&self, raw_text: &str, now: i64) -> Result<MarketWindow, MarketError> {
        let candidates = self.candidates(raw_text);

        let newest = *candidates.last().ok_or_else(|| MarketError::NotFound {
            pattern: self.pattern.to_string(),
        })?;

        // Descending scan: the first open timestamp is the max of the open set.
        let chosen = match candidates
            .iter()
            .rev()
            .find(|ts| now < ts.saturating_add(self.window_seconds))
        {
            Some(ts) => *ts,
            None => {
                warn!(
                    candidates = candidates.len(),
                    newest,
                    now,
                    "No open window listed, using newest closed one"
                );
                newest
            }
        };

        let window = self.window_for(chosen);
        debug!(
            identifier = %window.identifier,
            candidates = candidates.len(),
            "Resolved market window"
        );
        Ok(window)
    }

    /// Window created at `created_at`.
    pub fn window_for(&self, created_at: i64) -> MarketWindow {
        MarketWindow {
            identifier: self
                .template
                .replace(TIMESTAMP_PLACEHOLDER, &created_at.to_string()),
            created_at,
            closes_at: created_at.saturating_add(self.window_seconds),
        }
    }

    /// Window for an already known identifier (e.g. a pinned slug).
    pub fn window_for_identifier(&self, identifier: &str) -> Result<MarketWindow, MarketError> {
        let created_at = self
            .pattern
            .captures(identifier)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<i64>().ok())
            .ok_or_else(|| MarketError::ParseError {
                slug: identifier.to_string(),
                reason: format!("no timestamp matching `{}`", self.pattern),
            })?;

        Ok(MarketWindow {
            identifier: identifier.to_string(),
            created_at,
            closes_at: created_at.saturating_add(self.window_seconds),
        })
    }

    /// Identifier of the window that follows `identifier`.
    pub fn next_identifier(&self, identifier: &str) -> Result<String, MarketError> {
        let current = self.window_for_identifier(identifier)?;
        Ok(self.window_for(current.closes_at).identifier)
    }
}

/// One-shot form of [`WindowResolver::resolve`].
pub fn resolve(
    raw_text: &str,
    now: i64,
    window_seconds: i64,
    pattern: &str,
    template: &str,
) -> Result<MarketWindow, MarketError> {
    WindowResolver::new(pattern, template, window_seconds)?.resolve(raw_text, now)
}
