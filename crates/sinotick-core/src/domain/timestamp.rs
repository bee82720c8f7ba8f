use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::format_description::FormatItem;
use time::macros::{format_description, offset, time};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::ValidationError;

/// Fixed offset of China Standard Time. The mainland exchanges observe no DST.
pub const CST: UtcOffset = offset!(+8);

/// Start of the opening call auction.
pub const SESSION_OPEN: Time = time!(09:15:00);
/// Last second that may carry prints after the closing auction settles.
pub const SESSION_LAST: Time = time!(15:00:59);
/// Session close, used as the time-of-day of date-only bars.
pub const SESSION_CLOSE: Time = time!(15:00:00);

const COMPACT_DATE: &[FormatItem<'static>] = format_description!("[year][month][day]");
pub(crate) const DASHED_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

time::serde::format_description!(pub iso_date, Date, "[year]-[month]-[day]");

/// Exchange-local timestamp pinned to UTC+8, RFC 3339 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CstDateTime(OffsetDateTime);

impl CstDateTime {
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc().to_offset(CST))
    }

    pub fn from_parts(date: Date, time: Time) -> Self {
        Self(PrimitiveDateTime::new(date, time).assume_offset(CST))
    }

    /// Timestamp assigned to daily/weekly/monthly bars, which arrive date-only.
    pub fn session_close(date: Date) -> Self {
        Self::from_parts(date, SESSION_CLOSE)
    }

    /// Unix seconds interpreted in exchange-local time. `None` when the
    /// value falls outside the representable range.
    pub fn from_unix(seconds: i64) -> Option<Self> {
        OffsetDateTime::from_unix_timestamp(seconds)
            .ok()
            .map(|at| Self(at.to_offset(CST)))
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let parsed =
            OffsetDateTime::parse(input, &Rfc3339).map_err(|_| ValidationError::TimestampNotCst {
                value: input.to_owned(),
            })?;

        if parsed.offset() != CST {
            return Err(ValidationError::TimestampNotCst {
                value: input.to_owned(),
            });
        }

        Ok(Self(parsed))
    }

    pub const fn date(self) -> Date {
        self.0.date()
    }

    pub const fn time(self) -> Time {
        self.0.time()
    }

    pub fn format_rfc3339(self) -> String {
        self.0
            .format(&Rfc3339)
            .expect("CstDateTime must be RFC3339 formattable")
    }
}

impl Display for CstDateTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_rfc3339())
    }
}

impl Serialize for CstDateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_rfc3339())
    }
}

impl<'de> Deserialize<'de> for CstDateTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

/// `YYYYMMDD` request dates, the only date shape callers supply.
pub fn parse_compact_date(input: &str) -> Result<Date, ValidationError> {
    Date::parse(input.trim(), COMPACT_DATE).map_err(|_| ValidationError::InvalidDate {
        value: input.to_owned(),
    })
}

/// `YYYY-MM-DD`, the date shape the upstream query parameters take.
pub(crate) fn format_dashed_date(date: Date) -> String {
    date.format(DASHED_DATE)
        .expect("dates must be dashed-formattable")
}

/// Whether a time of day falls inside the trading session, call auction
/// through the last closing print.
pub fn in_session(time: Time) -> bool {
    time >= SESSION_OPEN && time <= SESSION_LAST
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn session_close_pins_date_only_bars_to_15_00() {
        let at = CstDateTime::session_close(date!(2025 - 01 - 03));
        assert_eq!(at.format_rfc3339(), "2025-01-03T15:00:00+08:00");
    }

    #[test]
    fn parse_requires_the_exchange_offset() {
        let parsed = CstDateTime::parse("2025-01-03T15:00:00+08:00").expect("must parse");
        assert_eq!(parsed.date(), date!(2025 - 01 - 03));

        let err = CstDateTime::parse("2025-01-03T15:00:00Z").expect_err("must fail");
        assert!(matches!(err, ValidationError::TimestampNotCst { .. }));
    }

    #[test]
    fn compact_dates_parse_and_reject() {
        let parsed = parse_compact_date("20250101").expect("must parse");
        assert_eq!(parsed, date!(2025 - 01 - 01));

        assert!(matches!(
            parse_compact_date("2025-01-01"),
            Err(ValidationError::InvalidDate { .. })
        ));
        assert!(matches!(
            parse_compact_date("20251301"),
            Err(ValidationError::InvalidDate { .. })
        ));
    }

    #[test]
    fn session_window_covers_auction_and_close() {
        assert!(in_session(time!(09:15:00)));
        assert!(in_session(time!(11:29:59)));
        assert!(in_session(time!(13:00:00)));
        assert!(in_session(time!(15:00:59)));
        assert!(!in_session(time!(09:14:59)));
        assert!(!in_session(time!(15:01:00)));
    }

    #[test]
    fn unix_seconds_convert_to_exchange_local_time() {
        // 2025-01-03 07:00:00 UTC is 15:00 in Shanghai.
        let at = CstDateTime::from_unix(1_735_887_600).expect("in range");
        assert_eq!(at.format_rfc3339(), "2025-01-03T15:00:00+08:00");
    }
}
