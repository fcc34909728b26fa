//! Parse failures surfaced to the caller as values

use thiserror::Error;

/// A location-history export could not be understood.
///
/// Always recoverable: the user is expected to supply the right export and
/// run the check again.
#[derive(Debug, Error)]
pub enum ParseError {
    /// File text is not valid JSON or does not have the location-history shape
    #[error("{file} is not a location history document: {source}")]
    InvalidDocument {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    /// Timestamp text is neither decimal epoch milliseconds nor RFC 3339
    #[error("invalid timestamp {value:?}")]
    InvalidTimestamp { value: String },

    /// Reference date is neither YYYY-MM-DD nor RFC 3339
    #[error("invalid reference date {value:?} (expected YYYY-MM-DD or RFC 3339)")]
    InvalidReferenceDate { value: String },
}

/// A lookback window that cannot be represented
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("lookback of {days} days exceeds the maximum of {max} days")]
    LookbackTooLong { days: u32, max: u32 },

    #[error("lookback of {lookback_ms} ms reaches before the supported date range")]
    OutOfRange { lookback_ms: i64 },
}
