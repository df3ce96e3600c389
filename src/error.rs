//! Unified error types for the maker and holder monitor.

use thiserror::Error;

/// Unified error type for the crate.
#[derive(Error, Debug)]
pub enum BotError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Market discovery or metadata error.
    #[error("market error: {0}")]
    Market(#[from] MarketError),

    /// Malformed holder record.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Collaborator call failed at the transport layer.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// Trading/order error.
    #[error("trading error: {0}")]
    Trading(#[from] TradingError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BotError {
    /// Short, stable label for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            BotError::Config(_) => "config",
            BotError::Market(MarketError::NotFound { .. }) => "not_found",
            BotError::Market(_) => "market",
            BotError::Validation(_) => "validation",
            BotError::Network(_) => "network",
            BotError::Trading(TradingError::OrderRejected { .. }) => "order",
            BotError::Trading(_) => "trading",
            BotError::Io(_) => "io",
        }
    }

    /// Whether this error means no window could be resolved.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BotError::Market(MarketError::NotFound { .. }))
    }
}

/// Market discovery and metadata errors.
#[derive(Error, Debug)]
pub enum MarketError {
    /// No candidate timestamps matched the discovery pattern.
    #[error("no market candidates matching `{pattern}` found")]
    NotFound {
        /// Pattern that found nothing.
        pattern: String,
    },

    /// Resolver was built from an unusable pattern, template, or window.
    #[error("invalid window resolver: {0}")]
    InvalidPattern(String),

    /// Market metadata did not have the expected shape.
    #[error("failed to parse market data for {slug}: {reason}")]
    ParseError {
        /// Market slug being parsed.
        slug: String,
        /// Reason for failure.
        reason: String,
    },
}

/// Reason a holder record was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    /// `amount` field absent.
    MissingAmount,
    /// `outcomeIndex` field absent.
    MissingOutcomeIndex,
    /// `amount` below zero.
    NegativeAmount,
}

impl std::fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ValidationKind::MissingAmount => "missing amount",
            ValidationKind::MissingOutcomeIndex => "missing outcomeIndex",
            ValidationKind::NegativeAmount => "negative amount",
        };
        f.write_str(s)
    }
}

/// A holder record that could not be turned into a `HolderRecord`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("holder #{position} in market #{market}: {kind}")]
pub struct ValidationError {
    /// Index of the market in the input sequence.
    pub market: usize,
    /// Index of the holder within that market.
    pub position: usize,
    /// What was wrong with it.
    pub kind: ValidationKind,
}

/// Transport-level collaborator failures.
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Request could not be sent or timed out.
    #[error("request to {url} failed: {source}")]
    Request {
        /// Target URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status.
    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        /// Target URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body (possibly empty).
        body: String,
    },

    /// Body could not be decoded into the expected shape.
    #[error("failed to decode response from {url}: {reason}")]
    Decode {
        /// Target URL.
        url: String,
        /// Reason for failure.
        reason: String,
    },
}

/// Trading and order submission errors.
#[derive(Error, Debug)]
pub enum TradingError {
    /// Order submission failed before an acknowledgement was received.
    #[error("order submission failed: {0}")]
    SubmissionFailed(String),

    /// Invalid order parameters.
    #[error("invalid order parameters: {0}")]
    InvalidParams(String),

    /// Signing error.
    #[error("signing error: {0}")]
    SigningError(String),

    /// CLOB API credentials could not be created or derived.
    #[error("CLOB authentication failed: {0}")]
    AuthFailed(String),

    /// Order acknowledged with a non-success status.
    #[error("order on {token_id} rejected with status `{status}`")]
    OrderRejected {
        /// Token the order was for.
        token_id: String,
        /// Status reported by the exchange.
        status: String,
    },
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, BotError>;
