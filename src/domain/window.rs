//! Epoch-millisecond timestamps, closed time windows and the lookback window

use crate::domain::error::{ParseError, WindowError};
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Longest lookback accepted from config or the command line (ten years)
pub const MAX_LOOKBACK_DAYS: u32 = 3660;

/// Month names as they appear in Takeout file names (`2020_MARCH.json`)
const GOOGLE_MONTHS: [&str; 12] = [
    "JANUARY",
    "FEBRUARY",
    "MARCH",
    "APRIL",
    "MAY",
    "JUNE",
    "JULY",
    "AUGUST",
    "SEPTEMBER",
    "OCTOBER",
    "NOVEMBER",
    "DECEMBER",
];

/// Milliseconds since the Unix epoch.
///
/// The export carries these as decimal strings. They are always parsed to an
/// integer so comparisons are numeric regardless of digit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct TimestampMs(pub i64);

impl TimestampMs {
    /// Parse decimal epoch milliseconds, or an RFC 3339 instant
    pub fn parse(value: &str) -> Result<Self, ParseError> {
        let trimmed = value.trim();
        if let Ok(ms) = trimmed.parse::<i64>() {
            return Ok(Self(ms));
        }
        DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| Self(dt.timestamp_millis()))
            .map_err(|_| ParseError::InvalidTimestamp { value: value.to_string() })
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }

    #[inline]
    pub fn as_millis(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TimestampMs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for TimestampMs {
    // Written back as a decimal string, the way the export stores it
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TimestampMs {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct TimestampVisitor;

        impl<'de> Visitor<'de> for TimestampVisitor {
            type Value = TimestampMs;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("epoch milliseconds as a string or integer, or an RFC 3339 string")
            }

            fn visit_str<E>(self, value: &str) -> Result<TimestampMs, E>
            where
                E: de::Error,
            {
                TimestampMs::parse(value).map_err(E::custom)
            }

            fn visit_u64<E>(self, value: u64) -> Result<TimestampMs, E>
            where
                E: de::Error,
            {
                i64::try_from(value)
                    .map(TimestampMs)
                    .map_err(|_| E::custom(format!("timestamp {} out of range", value)))
            }

            fn visit_i64<E>(self, value: i64) -> Result<TimestampMs, E>
            where
                E: de::Error,
            {
                Ok(TimestampMs(value))
            }
        }

        deserializer.deserialize_any(TimestampVisitor)
    }
}

/// Closed interval `[start, end]` in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: TimestampMs,
    pub end: TimestampMs,
}

impl TimeWindow {
    pub fn new(start: TimestampMs, end: TimestampMs) -> Self {
        Self { start, end }
    }

    pub fn from_millis(start_ms: i64, end_ms: i64) -> Self {
        Self::new(TimestampMs(start_ms), TimestampMs(end_ms))
    }

    /// Inclusive overlap: false only when `self` lies strictly before or
    /// strictly after `other`. Used to keep visits in the lookback window.
    #[inline]
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        !(self.end < other.start || self.start > other.end)
    }

    /// Exposure rule for a visit interval `self`: the visit starts no later
    /// than the exposure ends, and the exposure starts strictly before the
    /// visit ends.
    #[inline]
    pub fn meets_exposure(&self, exposure: &TimeWindow) -> bool {
        self.start <= exposure.end && exposure.start < self.end
    }
}

/// The lookback window ending at a reference instant (e.g. symptom onset)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookbackWindow {
    reference: DateTime<Utc>,
    start: DateTime<Utc>,
}

impl LookbackWindow {
    /// Fails when `reference - lookback` leaves the representable date range
    pub fn new(reference: DateTime<Utc>, lookback: chrono::Duration) -> Result<Self, WindowError> {
        let start = reference
            .checked_sub_signed(lookback)
            .ok_or(WindowError::OutOfRange { lookback_ms: lookback.num_milliseconds() })?;
        Ok(Self { reference, start })
    }

    /// Lookback expressed in whole days, at most `MAX_LOOKBACK_DAYS`
    pub fn days(reference: DateTime<Utc>, days: u32) -> Result<Self, WindowError> {
        if days > MAX_LOOKBACK_DAYS {
            return Err(WindowError::LookbackTooLong { days, max: MAX_LOOKBACK_DAYS });
        }
        let lookback = chrono::Duration::try_days(i64::from(days))
            .ok_or(WindowError::LookbackTooLong { days, max: MAX_LOOKBACK_DAYS })?;
        Self::new(reference, lookback)
    }

    pub fn reference(&self) -> DateTime<Utc> {
        self.reference
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// `[reference - lookback, reference]` in epoch milliseconds
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(
            TimestampMs::from_datetime(self.start),
            TimestampMs::from_datetime(self.reference),
        )
    }

    /// Month file names covering the window, oldest first.
    ///
    /// Every month from the window start through the reference month is
    /// named, so lookbacks longer than a month do not skip the middle ones.
    pub fn relevant_month_files(&self) -> Vec<String> {
        let start = self.start;
        let (mut year, mut month0) = (start.year(), start.month0());
        let (last_year, last_month0) = (self.reference.year(), self.reference.month0());

        let mut names = Vec::new();
        while (year, month0) <= (last_year, last_month0) {
            names.push(format!("{}_{}.json", year, GOOGLE_MONTHS[month0 as usize]));
            if month0 == 11 {
                year += 1;
                month0 = 0;
            } else {
                month0 += 1;
            }
        }
        names
    }
}

/// Parse a reference date given on the command line or in config.
///
/// `YYYY-MM-DD` resolves to the last millisecond of that day (UTC) so the
/// whole reference day is inside the window. RFC 3339 is taken as-is.
pub fn parse_reference_date(value: &str) -> Result<DateTime<Utc>, ParseError> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_milli_opt(23, 59, 59, 999))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| ParseError::InvalidReferenceDate { value: value.to_string() })
}
