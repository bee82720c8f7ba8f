use thiserror::Error;

use crate::data_source::DataKind;
use crate::source::ProviderId;

/// Request and contract violations caught before any network activity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol must be a six-digit A-share code, optionally prefixed sh/sz/bj: '{value}'")]
    InvalidSymbol { value: String },
    #[error("cannot infer exchange for code '{value}' (leading digit must be 6, 0, 3, 4 or 8)")]
    UnknownExchange { value: String },
    #[error("index code must be six digits starting 000, 399 or 899: '{value}'")]
    InvalidIndexCode { value: String },

    #[error("date must be YYYYMMDD: '{value}'")]
    InvalidDate { value: String },
    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: String, end: String },
    #[error("timestamp must be RFC3339 with a +08:00 offset: '{value}'")]
    TimestampNotCst { value: String },

    #[error("invalid period '{value}', expected one of day, week, month")]
    UnknownPeriod { value: String },
    #[error("invalid adjust '{value}', expected one of none, qfq, hfq")]
    UnknownAdjust { value: String },
    #[error("invalid minute period '{value}', expected one of 5, 15, 30, 60")]
    UnknownMinutePeriod { value: String },
    #[error("invalid news category '{value}', expected one of stock, market, cls, breakfast, global, sina, futu, ths")]
    UnknownNewsCategory { value: String },
    #[error("invalid exchange '{value}', expected one of sse, szse")]
    UnknownExchangeSelector { value: String },

    #[error("limit must be positive")]
    NonPositiveLimit,
    #[error("{context} requires a symbol")]
    MissingSymbol { context: &'static str },

    #[error("field '{field}' must be non-negative")]
    NegativePrice { field: &'static str },
    #[error("candle bounds violated: {detail}")]
    CandleBounds { detail: String },
    #[error("tick at {at} falls outside the trading session")]
    TickOutOfSession { at: String },
    #[error("tick at {at} is not after its predecessor")]
    NonMonotonicTicks { at: String },
}

/// Final cause of a failed transport exchange.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed")]
    Connect,
    #[error("connection reset by peer")]
    Reset,
    #[error("upstream returned HTTP {0}")]
    Status(u16),
    #[error("{0}")]
    Other(String),
}

/// Produced by the transport once its retry schedule settles on failure.
///
/// `attempts` counts every attempt actually made, so exhaustion reports the
/// configured maximum and a non-retryable first failure reports 1.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{provider} request failed after {attempts} attempt(s)")]
pub struct TransportError {
    pub provider: ProviderId,
    pub attempts: u32,
    #[source]
    pub last: TransportFailure,
}

/// Raised when an upstream payload cannot be turned into canonical records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("malformed payload: {detail}")]
    MalformedPayload { detail: String },
    #[error("payload is missing field '{field}'")]
    MissingField { field: &'static str },
    #[error("field '{field}' is not a number: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("field '{field}' is not a valid timestamp: '{value}'")]
    InvalidTimestamp { field: &'static str, value: String },
    #[error("upstream returned no rows for {context}")]
    EmptyPayload { context: &'static str },
    #[error(transparent)]
    Invariant(#[from] ValidationError),
}

/// Failure surface of a single source adapter call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Normalization(#[from] NormalizationError),
}

/// Cause category carried by [`RouterError`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Normalization(#[from] NormalizationError),
}

impl From<SourceError> for FetchFailure {
    fn from(value: SourceError) -> Self {
        match value {
            SourceError::Transport(err) => Self::Transport(err),
            SourceError::Normalization(err) => Self::Normalization(err),
        }
    }
}

/// Uniform failure returned by the router, tagged with the requested kind
/// and the offending parameters. The full cause chain stays reachable
/// through `std::error::Error::source`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} request failed ({params})")]
pub struct RouterError {
    pub kind: DataKind,
    pub params: String,
    #[source]
    pub cause: FetchFailure,
}

impl RouterError {
    pub fn new(kind: DataKind, params: impl Into<String>, cause: impl Into<FetchFailure>) -> Self {
        Self {
            kind,
            params: params.into(),
            cause: cause.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn transport_error_exposes_last_failure_as_source() {
        let err = TransportError {
            provider: ProviderId::Tencent,
            attempts: 4,
            last: TransportFailure::Status(503),
        };

        let source = err.source().expect("must carry a source");
        assert_eq!(source.to_string(), "upstream returned HTTP 503");
    }

    #[test]
    fn router_error_chains_through_to_root_cause() {
        let err = RouterError::new(
            DataKind::History,
            "symbol=600000",
            FetchFailure::Transport(TransportError {
                provider: ProviderId::Tencent,
                attempts: 2,
                last: TransportFailure::Timeout,
            }),
        );

        assert_eq!(err.to_string(), "history request failed (symbol=600000)");
        let transport = err.source().expect("transport layer");
        let root = transport.source().expect("final failure");
        assert_eq!(root.to_string(), "request timed out");
    }
}
