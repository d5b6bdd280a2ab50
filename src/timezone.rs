//! Conversions from UTC timestamps to the shop's local time.

use time::{OffsetDateTime, UtcOffset, macros::format_description};
use time_tz::{Offset, TimeZone};

use crate::Error;

/// Get the current UTC offset for a canonical timezone name, e.g. "Asia/Kolkata".
///
/// Returns `None` if the name is not a known timezone.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Format the calendar date of `timestamp` as seen in `canonical_timezone`.
///
/// The offset is resolved for `timestamp` itself rather than for now, so
/// dates near a daylight saving transition land on the right day.
///
/// # Errors
/// Returns an [Error::InvalidTimezone] if the timezone is unknown, or an
/// [Error::InvalidDateFormat] if the date cannot be formatted.
pub fn format_local_date(
    timestamp: OffsetDateTime,
    canonical_timezone: &str,
) -> Result<String, Error> {
    let timezone = time_tz::timezones::get_by_name(canonical_timezone)
        .ok_or_else(|| Error::InvalidTimezone(canonical_timezone.to_owned()))?;
    let offset = timezone.get_offset_utc(&timestamp).to_utc();

    timestamp
        .to_offset(offset)
        .format(format_description!("[day] [month repr:short] [year]"))
        .map_err(|error| Error::InvalidDateFormat(error.to_string()))
}
