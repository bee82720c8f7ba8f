//! Shared payload-to-entity helpers used by every adapter's normalizer.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::{Candle, CstDateTime, IntradayTick, NewsItem, NormalizationError, ValidationError};

/// Parse numeric text the way upstreams actually emit it: thousands
/// separators, percent signs, and unit glyphs are stripped before parsing,
/// preserving the decimal digits exactly.
pub fn parse_decimal(field: &'static str, raw: &str) -> Result<Decimal, NormalizationError> {
    let trimmed = raw.trim();
    let cleaned: String = trimmed
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.' || *ch == '-')
        .collect();

    if cleaned.is_empty() || cleaned == "-" {
        return Err(NormalizationError::InvalidNumber {
            field,
            value: raw.to_owned(),
        });
    }

    cleaned
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| NormalizationError::InvalidNumber {
            field,
            value: raw.to_owned(),
        })
}

/// Volumes and counts arrive as integer text, sometimes with a trailing
/// `.0` or separators. Fractional parts are dropped.
pub fn parse_volume(field: &'static str, raw: &str) -> Result<u64, NormalizationError> {
    let value = parse_decimal(field, raw)?;
    value
        .trunc()
        .to_u64()
        .ok_or(NormalizationError::InvalidNumber {
            field,
            value: raw.to_owned(),
        })
}

/// Truncate on a character boundary, never mid-codepoint.
pub fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((index, _)) => &input[..index],
        None => input,
    }
}

/// Trimmed text, with empty strings mapped to an explicit absence.
pub fn non_empty(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

/// Finalize a candle series: deduplicate by period start keeping the
/// last-seen row, then order ascending.
pub fn candle_series(rows: Vec<Candle>) -> Vec<Candle> {
    let mut by_start: BTreeMap<CstDateTime, Candle> = BTreeMap::new();
    for candle in rows {
        by_start.insert(candle.start, candle);
    }
    by_start.into_values().collect()
}

/// Verify a tick sequence is strictly increasing. Out-of-order or repeated
/// timestamps mean the payload cannot be trusted, so the whole session is
/// rejected rather than silently reordered.
pub fn tick_series(ticks: Vec<IntradayTick>) -> Result<Vec<IntradayTick>, NormalizationError> {
    for pair in ticks.windows(2) {
        if pair[1].at <= pair[0].at {
            return Err(NormalizationError::Invariant(
                ValidationError::NonMonotonicTicks {
                    at: pair[1].at.to_string(),
                },
            ));
        }
    }
    Ok(ticks)
}

/// Order news most recent first and cap the result.
pub fn news_series(mut items: Vec<NewsItem>, limit: usize) -> Vec<NewsItem> {
    items.sort_by(|a, b| b.published.cmp(&a.published));
    items.truncate(limit);
    items
}
