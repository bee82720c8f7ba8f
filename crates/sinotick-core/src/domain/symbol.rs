use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Mainland exchanges hosting A-share listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Sse,
    Szse,
    Bse,
}

impl Exchange {
    /// Lowercase market prefix used by Tencent-style endpoints (`sh600000`).
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Sse => "sh",
            Self::Szse => "sz",
            Self::Bse => "bj",
        }
    }

    /// Market flag embedded in EastMoney `secid` parameters.
    pub const fn secid_market(self) -> &'static str {
        match self {
            Self::Sse => "1",
            Self::Szse | Self::Bse => "0",
        }
    }

    fn from_prefix(value: &str) -> Option<Self> {
        match value {
            "sh" => Some(Self::Sse),
            "sz" => Some(Self::Szse),
            "bj" => Some(Self::Bse),
            _ => None,
        }
    }

    /// Listing rules tie the leading digit of an equity code to its venue.
    fn infer_for_equity(code: &str) -> Option<Self> {
        match code.as_bytes().first()? {
            b'6' => Some(Self::Sse),
            b'0' | b'3' => Some(Self::Szse),
            b'4' | b'8' => Some(Self::Bse),
            _ => None,
        }
    }
}

/// Exchange selector for market-wide statistics. Only the two exchanges
/// that publish daily summaries are addressable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeSelector {
    Sse,
    Szse,
}

impl ExchangeSelector {
    pub const fn exchange(self) -> Exchange {
        match self {
            Self::Sse => Exchange::Sse,
            Self::Szse => Exchange::Szse,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sse => "sse",
            Self::Szse => "szse",
        }
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "sse" | "sh" => Ok(Self::Sse),
            "szse" | "sz" => Ok(Self::Szse),
            other => Err(ValidationError::UnknownExchangeSelector {
                value: other.to_owned(),
            }),
        }
    }
}

impl Display for ExchangeSelector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized A-share security identifier: exchange plus six-digit code.
///
/// Accepts a bare numeric code (`600000`, exchange inferred from the leading
/// digit) or a prefixed form (`sh600000`, `SZ000001`). An explicit prefix
/// must agree with the inference so the bare code stays a lossless
/// round-trip representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol {
    exchange: Exchange,
    code: String,
}

impl Symbol {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }

        let (prefix, code) = split_prefix(trimmed);
        if code.len() != 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidSymbol {
                value: trimmed.to_owned(),
            });
        }

        let inferred =
            Exchange::infer_for_equity(code).ok_or_else(|| ValidationError::UnknownExchange {
                value: code.to_owned(),
            })?;

        let exchange = match prefix {
            None => inferred,
            Some(prefix) => {
                let declared = Exchange::from_prefix(&prefix.to_ascii_lowercase()).ok_or_else(
                    || ValidationError::InvalidSymbol {
                        value: trimmed.to_owned(),
                    },
                )?;
                if declared != inferred {
                    return Err(ValidationError::InvalidSymbol {
                        value: trimmed.to_owned(),
                    });
                }
                declared
            }
        };

        Ok(Self {
            exchange,
            code: code.to_owned(),
        })
    }

    pub const fn exchange(&self) -> Exchange {
        self.exchange
    }

    /// Six-digit zero-padded code without a market prefix.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Prefixed form consumed by Tencent endpoints, e.g. `sh600000`.
    pub fn prefixed(&self) -> String {
        format!("{}{}", self.exchange.prefix(), self.code)
    }

    /// EastMoney `secid` form, e.g. `1.600000`.
    pub fn secid(&self) -> String {
        format!("{}.{}", self.exchange.secid_market(), self.code)
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Symbol {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.code
    }
}

/// Index identifier. Indices live in a namespace separate from equities:
/// the leading block, not the leading digit, selects the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IndexCode {
    exchange: Exchange,
    code: String,
}

impl IndexCode {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }

        let (prefix, code) = split_prefix(trimmed);
        if code.len() != 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidIndexCode {
                value: trimmed.to_owned(),
            });
        }

        let exchange = match &code[..3] {
            "000" => Exchange::Sse,
            "399" => Exchange::Szse,
            "899" => Exchange::Bse,
            _ => {
                return Err(ValidationError::InvalidIndexCode {
                    value: trimmed.to_owned(),
                })
            }
        };

        if let Some(prefix) = prefix {
            if Exchange::from_prefix(&prefix.to_ascii_lowercase()) != Some(exchange) {
                return Err(ValidationError::InvalidIndexCode {
                    value: trimmed.to_owned(),
                });
            }
        }

        Ok(Self {
            exchange,
            code: code.to_owned(),
        })
    }

    pub const fn exchange(&self) -> Exchange {
        self.exchange
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn prefixed(&self) -> String {
        format!("{}{}", self.exchange.prefix(), self.code)
    }
}

impl Display for IndexCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<String> for IndexCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<IndexCode> for String {
    fn from(value: IndexCode) -> Self {
        value.code
    }
}

fn split_prefix(input: &str) -> (Option<&str>, &str) {
    let bytes = input.as_bytes();
    // Both lead bytes being ASCII guarantees index 2 is a char boundary.
    if bytes.len() > 2 && bytes[..2].iter().all(|b| b.is_ascii_alphabetic()) {
        (Some(&input[..2]), &input[2..])
    } else {
        (None, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_codes_infer_their_exchange() {
        let cases = [
            ("600000", Exchange::Sse),
            ("000001", Exchange::Szse),
            ("300750", Exchange::Szse),
            ("430047", Exchange::Bse),
            ("830799", Exchange::Bse),
        ];

        for (input, exchange) in cases {
            let symbol = Symbol::parse(input).expect("symbol should parse");
            assert_eq!(symbol.exchange(), exchange, "input {input}");
            assert_eq!(symbol.code(), input);
        }
    }

    #[test]
    fn prefixed_codes_round_trip_to_bare_code() {
        let symbol = Symbol::parse("SH600000").expect("symbol should parse");
        assert_eq!(symbol.code(), "600000");
        assert_eq!(symbol.prefixed(), "sh600000");
        assert_eq!(symbol.secid(), "1.600000");

        let symbol = Symbol::parse("sz000001").expect("symbol should parse");
        assert_eq!(symbol.prefixed(), "sz000001");
        assert_eq!(symbol.secid(), "0.000001");
    }

    #[test]
    fn rejects_malformed_codes() {
        assert!(matches!(
            Symbol::parse(""),
            Err(ValidationError::EmptySymbol)
        ));
        assert!(matches!(
            Symbol::parse("60000"),
            Err(ValidationError::InvalidSymbol { .. })
        ));
        assert!(matches!(
            Symbol::parse("60000a"),
            Err(ValidationError::InvalidSymbol { .. })
        ));
        assert!(matches!(
            Symbol::parse("沪600000"),
            Err(ValidationError::InvalidSymbol { .. })
        ));
        assert!(matches!(
            Symbol::parse("100000"),
            Err(ValidationError::UnknownExchange { .. })
        ));
    }

    #[test]
    fn rejects_prefix_that_contradicts_the_code() {
        assert!(matches!(
            Symbol::parse("sz600000"),
            Err(ValidationError::InvalidSymbol { .. })
        ));
    }

    #[test]
    fn symbol_serializes_as_bare_code() {
        let symbol = Symbol::parse("sh600000").expect("symbol should parse");
        let json = serde_json::to_string(&symbol).expect("must serialize");
        assert_eq!(json, "\"600000\"");

        let back: Symbol = serde_json::from_str(&json).expect("must deserialize");
        assert_eq!(back, symbol);
    }

    #[test]
    fn index_codes_use_their_own_namespace() {
        let sse = IndexCode::parse("000001").expect("index should parse");
        assert_eq!(sse.exchange(), Exchange::Sse);
        assert_eq!(sse.prefixed(), "sh000001");

        let szse = IndexCode::parse("399001").expect("index should parse");
        assert_eq!(szse.exchange(), Exchange::Szse);

        let bse = IndexCode::parse("899050").expect("index should parse");
        assert_eq!(bse.exchange(), Exchange::Bse);

        assert!(matches!(
            IndexCode::parse("600000"),
            Err(ValidationError::InvalidIndexCode { .. })
        ));
    }

    #[test]
    fn equity_and_index_views_of_000001_differ() {
        let equity = Symbol::parse("000001").expect("symbol should parse");
        assert_eq!(equity.exchange(), Exchange::Szse);

        let index = IndexCode::parse("000001").expect("index should parse");
        assert_eq!(index.exchange(), Exchange::Sse);
    }
}
