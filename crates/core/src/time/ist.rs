use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

// India Standard Time, UTC+05:30. No DST.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

pub fn offset() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// NSE trading date of a bar timestamp (Unix seconds).
pub fn date_of_timestamp(ts: i64) -> Option<NaiveDate> {
    let utc = DateTime::<Utc>::from_timestamp(ts, 0)?;
    Some(utc.with_timezone(&offset()).date_naive())
}

/// Header date, e.g. "14 October 2026".
pub fn report_date(at: DateTime<Utc>) -> String {
    at.with_timezone(&offset()).format("%d %B %Y").to_string()
}

/// Footer timestamp, e.g. "2026-10-14 18:30:00 IST".
pub fn report_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&offset())
        .format("%Y-%m-%d %H:%M:%S IST")
        .to_string()
}
