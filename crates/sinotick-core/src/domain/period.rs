use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Calendar granularities for historical candles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
}

impl Period {
    pub const ALL: [Self; 3] = [Self::Day, Self::Week, Self::Month];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Calendar days covered by one bar, used to size upstream row counts.
    pub const fn approx_days(self) -> i64 {
        match self {
            Self::Day => 1,
            Self::Week => 7,
            Self::Month => 30,
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(Self::Day),
            "week" | "weekly" => Ok(Self::Week),
            "month" | "monthly" => Ok(Self::Month),
            other => Err(ValidationError::UnknownPeriod {
                value: other.to_owned(),
            }),
        }
    }
}

/// Minute-bar granularities. The upstream kline endpoint only buckets
/// into these four widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MinutePeriod {
    #[serde(rename = "5")]
    M5,
    #[serde(rename = "15")]
    M15,
    #[serde(rename = "30")]
    M30,
    #[serde(rename = "60")]
    M60,
}

impl MinutePeriod {
    pub const ALL: [Self; 4] = [Self::M5, Self::M15, Self::M30, Self::M60];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::M5 => "5",
            Self::M15 => "15",
            Self::M30 => "30",
            Self::M60 => "60",
        }
    }

    pub const fn minutes(self) -> u32 {
        match self {
            Self::M5 => 5,
            Self::M15 => 15,
            Self::M30 => 30,
            Self::M60 => 60,
        }
    }
}

impl Display for MinutePeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MinutePeriod {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "5" => Ok(Self::M5),
            "15" => Ok(Self::M15),
            "30" => Ok(Self::M30),
            "60" => Ok(Self::M60),
            other => Err(ValidationError::UnknownMinutePeriod {
                value: other.to_owned(),
            }),
        }
    }
}

/// Price adjustment method for historical series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Adjust {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "qfq")]
    Forward,
    #[serde(rename = "hfq")]
    Backward,
}

impl Adjust {
    pub const ALL: [Self; 3] = [Self::None, Self::Forward, Self::Backward];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Forward => "qfq",
            Self::Backward => "hfq",
        }
    }

    /// Value spliced into the Tencent kline `param`; unadjusted is empty.
    pub const fn tencent_param(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Forward => "qfq",
            Self::Backward => "hfq",
        }
    }
}

impl Display for Adjust {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Adjust {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "qfq" | "forward" => Ok(Self::Forward),
            "hfq" | "backward" => Ok(Self::Backward),
            other => Err(ValidationError::UnknownAdjust {
                value: other.to_owned(),
            }),
        }
    }
}

/// Granularity label carried by a normalized candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum CandlePeriod {
    Calendar(Period),
    Minute(MinutePeriod),
}

impl CandlePeriod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Calendar(period) => period.as_str(),
            Self::Minute(period) => period.as_str(),
        }
    }
}

impl From<Period> for CandlePeriod {
    fn from(value: Period) -> Self {
        Self::Calendar(value)
    }
}

impl From<MinutePeriod> for CandlePeriod {
    fn from(value: MinutePeriod) -> Self {
        Self::Minute(value)
    }
}

impl Display for CandlePeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_period_names() {
        assert_eq!(Period::from_str("day").expect("must parse"), Period::Day);
        assert_eq!(
            Period::from_str("Weekly").expect("must parse"),
            Period::Week
        );
        assert!(matches!(
            Period::from_str("year"),
            Err(ValidationError::UnknownPeriod { .. })
        ));
    }

    #[test]
    fn minute_period_is_a_closed_set() {
        assert_eq!(
            MinutePeriod::from_str("15").expect("must parse"),
            MinutePeriod::M15
        );
        assert!(matches!(
            MinutePeriod::from_str("1"),
            Err(ValidationError::UnknownMinutePeriod { .. })
        ));
        assert!(matches!(
            MinutePeriod::from_str("120"),
            Err(ValidationError::UnknownMinutePeriod { .. })
        ));
    }

    #[test]
    fn adjust_accepts_both_spellings() {
        assert_eq!(Adjust::from_str("qfq").expect("must parse"), Adjust::Forward);
        assert_eq!(
            Adjust::from_str("forward").expect("must parse"),
            Adjust::Forward
        );
        assert_eq!(Adjust::from_str("none").expect("must parse"), Adjust::None);
        assert_eq!(Adjust::None.tencent_param(), "");
        assert!(matches!(
            Adjust::from_str("split"),
            Err(ValidationError::UnknownAdjust { .. })
        ));
    }

    #[test]
    fn candle_period_serializes_as_its_label() {
        let day = serde_json::to_string(&CandlePeriod::from(Period::Day)).expect("serialize");
        assert_eq!(day, "\"day\"");

        let m5 = serde_json::to_string(&CandlePeriod::from(MinutePeriod::M5)).expect("serialize");
        assert_eq!(m5, "\"5\"");
    }
}
